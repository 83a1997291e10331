//! PDF rendering of a [`Resume`].
//!
//! Output is plain flowing text on US-Letter pages using the base-14
//! Helvetica fonts, so no font files are embedded. Text is word-wrapped
//! against the Helvetica advance widths and spills onto new pages as
//! needed. Characters outside WinAnsi are transliterated where a close
//! equivalent exists and replaced with `?` otherwise.

use anyhow::{bail, Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::path::{Path, PathBuf};

use crate::resume::{humanize, join_nonempty, Resume};

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 54;
const TEXT_WIDTH: i64 = PAGE_WIDTH - 2 * MARGIN;
const BULLET_INDENT: i64 = 10;
const BULLET_TEXT_INDENT: i64 = 22;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Title,
    Heading,
    Subheading,
    Label,
    Body,
}

impl Style {
    fn bold(self) -> bool {
        !matches!(self, Style::Body)
    }

    fn size(self) -> i64 {
        match self {
            Style::Title => 20,
            Style::Heading => 13,
            Style::Subheading => 11,
            Style::Label | Style::Body => 10,
        }
    }

    fn leading(self) -> i64 {
        self.size() + 4
    }

    fn font(self) -> &'static str {
        if self.bold() {
            FONT_BOLD
        } else {
            FONT_REGULAR
        }
    }
}

/// Render `resume` to PDF bytes.
pub fn render_pdf(resume: &Resume) -> Result<Vec<u8>> {
    let mut w = PageWriter::new();
    layout(&mut w, resume);
    build_document(w.finish())
}

/// Render `resume` to `<dir>/<job_id>.pdf`, creating `dir` if needed.
pub fn write_pdf(resume: &Resume, dir: &Path, job_id: &str) -> Result<PathBuf> {
    let stem = file_stem(job_id);
    if stem.is_empty() {
        bail!("cannot name a PDF after an empty job id");
    }

    let bytes = render_pdf(resume)?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output dir {}", dir.display()))?;
    let path = dir.join(format!("{}.pdf", stem));
    std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    tracing::debug!(path = %path.display(), "rendered résumé PDF");
    Ok(path)
}

fn file_stem(job_id: &str) -> String {
    job_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// ============ Section layout ============

fn layout(w: &mut PageWriter, r: &Resume) {
    w.paragraph(Style::Title, or_default(&r.name, "Your Name"));

    let c = &r.contact;
    let contact: Vec<String> = [
        ("Email", &c.email),
        ("Phone", &c.phone),
        ("LinkedIn", &c.linkedin),
        ("GitHub", &c.github),
        ("Location", &c.location),
    ]
    .iter()
    .filter(|(_, v)| !v.trim().is_empty())
    .map(|(label, v)| format!("{}: {}", label, v.trim()))
    .collect();
    w.paragraph(Style::Body, &contact.join(" | "));

    w.heading("Professional Summary");
    w.paragraph(Style::Body, or_default(&r.summary, "Summary not provided"));

    if !r.skills.is_empty() {
        w.heading("Skills");
        for (category, items) in &r.skills {
            w.paragraph(Style::Label, &format!("{}:", humanize(category)));
            w.paragraph(Style::Body, &items.join(", "));
        }
    }

    if !r.experience.is_empty() {
        w.heading("Professional Experience");
        for job in &r.experience {
            w.subheading(&job.title);
            w.paragraph(Style::Body, &join_nonempty(&[&job.company, &job.location], " – "));
            w.paragraph(Style::Body, &job.duration);
            for item in &job.responsibilities {
                w.bullet(item);
            }
            w.gap(6);
        }
    }

    if !r.projects.is_empty() {
        w.heading("Projects");
        for p in &r.projects {
            w.subheading(&p.name);
            w.paragraph(Style::Body, &p.company);
            w.paragraph(Style::Body, &p.description);
            w.gap(6);
        }
    }

    if !r.open_source_contributions.is_empty() {
        w.heading("Open Source Contributions");
        for contribution in &r.open_source_contributions {
            w.subheading(&contribution.project);
            w.paragraph(Style::Body, &contribution.contribution);
            w.gap(6);
        }
    }

    if !r.education.is_empty() {
        w.heading("Education");
        for e in &r.education {
            w.subheading(&e.degree);
            w.paragraph(Style::Body, &e.institution);
            if !e.graduation_year.trim().is_empty() {
                let year = format!("Graduation Year: {}", e.graduation_year.trim());
                w.paragraph(Style::Body, &year);
            }
            if !e.relevant_courses.is_empty() {
                let courses = format!("Relevant Courses: {}", e.relevant_courses.join(", "));
                w.paragraph(Style::Body, &courses);
            }
            w.gap(6);
        }
    }

    if !r.certifications.is_empty() {
        w.heading("Certifications");
        for cert in &r.certifications {
            let line = if cert.issued.trim().is_empty() {
                cert.name.clone()
            } else {
                format!("{}, Issued: {}", cert.name.trim(), cert.issued.trim())
            };
            w.paragraph(Style::Body, &line);
        }
    }

    if !r.technical_proficiencies.is_empty() {
        w.heading("Technical Proficiencies");
        for (category, items) in &r.technical_proficiencies {
            let line = format!("{}: {}", humanize(category), items.join(", "));
            w.paragraph(Style::Body, &line);
        }
    }

    if !r.publications_talks.is_empty() {
        w.heading("Publications & Talks");
        for p in &r.publications_talks {
            let mut line = join_nonempty(&[&p.title, &p.event], ", ");
            if !p.year.trim().is_empty() {
                line.push_str(&format!(" ({})", p.year.trim()));
            }
            w.paragraph(Style::Body, &line);
        }
    }

    if !r.volunteer_experience.is_empty() {
        w.heading("Volunteer Experience");
        for v in &r.volunteer_experience {
            w.paragraph(Style::Label, &join_nonempty(&[&v.organization, &v.role], " - "));
            w.paragraph(Style::Body, &v.description);
        }
    }

    w.heading("References");
    w.paragraph(Style::Body, or_default(&r.references, "Available upon request."));
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

// ============ Page flow ============

struct PageWriter {
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    /// Baseline of the last line written, in PDF user space (origin bottom-left).
    y: i64,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn ensure(&mut self, height: i64) {
        if self.y - height < MARGIN {
            self.pages.push(std::mem::take(&mut self.ops));
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn gap(&mut self, height: i64) {
        self.y -= height;
    }

    /// Section heading with a rule underneath. Kept on the same page as
    /// the first line that follows it.
    fn heading(&mut self, text: &str) {
        self.gap(8);
        self.ensure(Style::Heading.leading() + 4 + Style::Body.leading());
        self.paragraph(Style::Heading, text);
        self.y -= 3;
        self.ops.push(Operation::new("w", vec![Object::Integer(1)]));
        self.ops.push(Operation::new(
            "m",
            vec![Object::Integer(MARGIN), Object::Integer(self.y)],
        ));
        self.ops.push(Operation::new(
            "l",
            vec![Object::Integer(PAGE_WIDTH - MARGIN), Object::Integer(self.y)],
        ));
        self.ops.push(Operation::new("S", vec![]));
        self.y -= 2;
    }

    fn subheading(&mut self, text: &str) {
        self.ensure(Style::Subheading.leading() + Style::Body.leading());
        self.paragraph(Style::Subheading, text);
    }

    fn bullet(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let lines = wrap(text, Style::Body, TEXT_WIDTH - BULLET_TEXT_INDENT);
        for (i, line) in lines.iter().enumerate() {
            self.ensure(Style::Body.leading());
            self.y -= Style::Body.leading();
            if i == 0 {
                self.text_at(MARGIN + BULLET_INDENT, Style::Body, "•");
            }
            self.text_at(MARGIN + BULLET_TEXT_INDENT, Style::Body, line);
        }
    }

    /// Write wrapped text; blank text writes nothing.
    fn paragraph(&mut self, style: Style, text: &str) {
        for source_line in text.lines() {
            for line in wrap(source_line, style, TEXT_WIDTH) {
                self.ensure(style.leading());
                self.y -= style.leading();
                self.text_at(MARGIN, style, &line);
            }
        }
    }

    fn text_at(&mut self, x: i64, style: Style, text: &str) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![Object::Name(style.font().as_bytes().to_vec()), Object::Integer(style.size())],
        ));
        self.ops.push(Operation::new(
            "Td",
            vec![Object::Integer(x), Object::Integer(self.y)],
        ));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_winansi(text), StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.ops);
        }
        self.pages
    }
}

// ============ Text measurement ============

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

fn char_width(c: char) -> u32 {
    let code = c as u32;
    if (32..=126).contains(&code) {
        u32::from(HELVETICA_WIDTHS[(code - 32) as usize])
    } else {
        556
    }
}

/// Width of `text` in points. Bold runs about 6% wider than regular.
fn text_width(text: &str, style: Style) -> f64 {
    let units: u32 = text.chars().map(char_width).sum();
    let scale = if style.bold() { 1.06 } else { 1.0 };
    f64::from(units) * scale * style.size() as f64 / 1000.0
}

/// Greedy word wrap. Words wider than a whole line are split by character.
fn wrap(text: &str, style: Style, max_width: i64) -> Vec<String> {
    let max = max_width as f64;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(&candidate, style) <= max {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width(word, style) <= max {
            current = word.to_string();
            continue;
        }

        for c in word.chars() {
            current.push(c);
            if text_width(&current, style) > max {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encode text for a WinAnsiEncoding font.
fn encode_winansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' '..='~' => out.push(c as u8),
            '\u{a0}'..='\u{ff}' => out.push(c as u32 as u8),
            '€' => out.push(0x80),
            '…' => out.push(0x85),
            '‘' => out.push(0x91),
            '’' => out.push(0x92),
            '“' => out.push(0x93),
            '”' => out.push(0x94),
            '•' => out.push(0x95),
            '–' => out.push(0x96),
            '—' => out.push(0x97),
            '™' => out.push(0x99),
            '\t' => out.push(b' '),
            '‐' | '‑' | '‒' | '−' => out.push(b'-'),
            '→' => out.extend_from_slice(b"->"),
            '←' => out.extend_from_slice(b"<-"),
            '▪' | '◦' | '●' | '‣' => out.push(0x95),
            '\u{200b}' | '\u{feff}' => {}
            _ => out.push(b'?'),
        }
    }
    out
}

// ============ Document assembly ============

fn build_document(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_REGULAR => regular,
            FONT_BOLD => bold,
        },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let encoded = content.encode().context("encoding PDF page content")?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf).context("serializing PDF")?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::Experience;

    fn sample() -> Resume {
        let mut resume = Resume {
            name: "Jane Doe".into(),
            summary: "Systems engineer who ships.".into(),
            ..Default::default()
        };
        resume.contact.email = "jane@example.com".into();
        resume
            .skills
            .insert("cloud_platforms".into(), vec!["AWS".into(), "GCP".into()]);
        resume.experience.push(Experience {
            title: "Staff Engineer".into(),
            company: "Acme".into(),
            location: "Berlin".into(),
            duration: "2019 – 2024".into(),
            responsibilities: vec!["Built the ingestion pipeline.".into()],
        });
        resume
    }

    fn page_count(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn renders_a_loadable_pdf() {
        let bytes = render_pdf(&sample()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn rendered_text_is_extractable() {
        let bytes = render_pdf(&sample()).unwrap();
        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        assert!(text.contains("Jane Doe"));
        assert!(text.contains("Professional Experience"));
        assert!(text.contains("Cloud platforms"));
        assert!(text.contains("Available upon request."));
    }

    #[test]
    fn empty_resume_uses_defaults() {
        let bytes = render_pdf(&Resume::default()).unwrap();
        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        assert!(text.contains("Your Name"));
        assert!(text.contains("Summary not provided"));
        assert!(!text.contains("Projects"));
    }

    #[test]
    fn long_resume_breaks_pages() {
        let mut resume = sample();
        resume.experience[0].responsibilities =
            (0..120).map(|i| format!("Delivered improvement number {}.", i)).collect();
        let bytes = render_pdf(&resume).unwrap();
        assert!(page_count(&bytes) >= 3);
    }

    #[test]
    fn wrap_respects_width() {
        let text = "word ".repeat(200);
        let lines = wrap(&text, Style::Body, TEXT_WIDTH);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, Style::Body) <= TEXT_WIDTH as f64);
        }
    }

    #[test]
    fn wrap_splits_overlong_words() {
        let word = "x".repeat(500);
        let lines = wrap(&word, Style::Body, 100);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn winansi_transliteration() {
        assert_eq!(encode_winansi("a–b"), vec![b'a', 0x96, b'b']);
        assert_eq!(encode_winansi("café"), vec![b'c', b'a', b'f', 0xe9]);
        assert_eq!(encode_winansi("x → y"), b"x -> y".to_vec());
        assert_eq!(encode_winansi("日本"), b"??".to_vec());
    }

    #[test]
    fn write_pdf_uses_job_id_as_file_name() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("out");
        let path = write_pdf(&sample(), &dir, "3912345678").unwrap();
        assert_eq!(path, dir.join("3912345678.pdf"));
        assert!(path.exists());

        let odd = write_pdf(&sample(), &dir, "../evil id").unwrap();
        assert_eq!(odd, dir.join("___evil_id.pdf"));
        assert!(write_pdf(&sample(), &dir, "  ").is_err());
    }
}
