//! CLI command implementations.
//!
//! Each `run_*` function backs one `tailor` subcommand. Results go to
//! stdout, progress and logs to stderr.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::assess;
use crate::config::Config;
use crate::extract;
use crate::llm::{self, ChatModel};
use crate::models::{JobQuery, RunReport};
use crate::pipeline::{self, Tailor};
use crate::progress::ProgressMode;
use crate::regen;
use crate::relevance::RelevanceScorer;
use crate::render;
use crate::restructure::{self, ResumeCache};
use crate::resume::Resume;
use crate::scraper::{self, JobBoard};

/// Where a job description comes from.
#[derive(Debug, Clone)]
pub enum JobSource {
    /// A job id or posting URL, fetched from the job board.
    Board(String),
    /// A local text, PDF, or DOCX file.
    File(PathBuf),
}

impl JobSource {
    pub fn from_args(job_id: Option<String>, job_file: Option<PathBuf>) -> Result<Self> {
        match (job_id, job_file) {
            (Some(id), None) => Ok(JobSource::Board(id)),
            (None, Some(path)) => Ok(JobSource::File(path)),
            (Some(_), Some(_)) => bail!("pass either --job-id or --job-file, not both"),
            (None, None) => bail!("a job description is required: pass --job-id or --job-file"),
        }
    }

    pub async fn description(&self, config: &Config) -> Result<String> {
        match self {
            JobSource::Board(job) => JobBoard::new(&config.scraper)?.describe(job).await,
            JobSource::File(path) => extract::extract_file(path)
                .with_context(|| format!("reading job description {}", path.display())),
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Load a résumé from schema JSON, or extract and restructure a document.
async fn load_resume(
    config: &Config,
    model: &dyn ChatModel,
    path: &Path,
    use_cache: bool,
) -> Result<Resume> {
    if is_json(path) {
        return restructure::load_resume_json(path);
    }
    let text = extract::extract_file(path)
        .with_context(|| format!("reading résumé {}", path.display()))?;
    let cache = ResumeCache::new(&config.output.cache_dir);
    restructure::restructure_cached(model, &text, use_cache.then_some(&cache)).await
}

/// Plain text of a résumé file, without calling the model.
fn resume_text(path: &Path) -> Result<String> {
    if is_json(path) {
        return Ok(restructure::load_resume_json(path)?.to_plain_text());
    }
    extract::extract_file(path).with_context(|| format!("reading résumé {}", path.display()))
}

fn write_json(resume: &Resume, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(resume)?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn write_pdf_to(resume: &Resume, path: &Path) -> Result<()> {
    let bytes = render::render_pdf(resume)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub fn run_extract(path: &Path) -> Result<()> {
    let text = extract::extract_file(path)
        .with_context(|| format!("extracting {}", path.display()))?;
    println!("{}", text);
    Ok(())
}

pub async fn run_restructure(
    config: &Config,
    path: &Path,
    out: Option<PathBuf>,
    pdf: Option<PathBuf>,
    no_cache: bool,
) -> Result<()> {
    let model = llm::create_chat_model(&config.llm)?;
    let resume = load_resume(config, model.as_ref(), path, !no_cache).await?;
    write_json(&resume, out.as_deref())?;
    if let Some(pdf) = pdf {
        write_pdf_to(&resume, &pdf)?;
    }
    Ok(())
}

pub fn run_render(json: &Path, out: &Path) -> Result<()> {
    let resume = restructure::load_resume_json(json)?;
    write_pdf_to(&resume, out)
}

pub async fn run_search(
    config: &Config,
    keywords: &str,
    location: &str,
    limit: usize,
    csv: Option<PathBuf>,
) -> Result<()> {
    let board = JobBoard::new(&config.scraper)?;
    let listings = board.search(keywords, location, limit, |_, _| {}).await?;

    if listings.is_empty() {
        println!("No listings.");
    }
    for (i, l) in listings.iter().enumerate() {
        println!("{}. {} at {}", i + 1, l.title, l.company);
        println!("    location: {}", l.location);
        println!("    id: {}", l.job_id);
        println!("    url: {}", l.url);
        println!();
    }

    if let Some(path) = csv {
        scraper::export_listings_csv(&listings, &path)?;
        println!("Wrote {} listings to {}", listings.len(), path.display());
    }
    Ok(())
}

pub async fn run_describe(config: &Config, job: &str) -> Result<()> {
    let board = JobBoard::new(&config.scraper)?;
    println!("{}", board.describe(job).await?);
    Ok(())
}

pub async fn run_score(config: &Config, resume_path: &Path, job: JobSource) -> Result<()> {
    let scorer = RelevanceScorer::new(&config.embedding)?;
    let text = resume_text(resume_path)?;
    let description = job.description(config).await?;
    let score = scorer.score(&text, &description).await?;
    println!("Relevance: {:.2} / 100  (model: {})", score, scorer.model_name());
    Ok(())
}

pub async fn run_regen(
    config: &Config,
    resume_path: &Path,
    job: JobSource,
    out_json: Option<PathBuf>,
    out_pdf: Option<PathBuf>,
) -> Result<()> {
    let model = llm::create_chat_model(&config.llm)?;
    let resume = load_resume(config, model.as_ref(), resume_path, true).await?;
    let description = job.description(config).await?;
    let tailored = regen::regenerate(
        model.as_ref(),
        &resume,
        &description,
        config.llm.structure_retries,
    )
    .await?;

    write_json(&tailored, out_json.as_deref())?;
    if let Some(pdf) = out_pdf {
        write_pdf_to(&tailored, &pdf)?;
    }
    Ok(())
}

pub async fn run_assess(config: &Config, resume_path: &Path, job: JobSource) -> Result<()> {
    let model = llm::create_chat_model(&config.llm)?;
    let text = resume_text(resume_path)?;
    let description = job.description(config).await?;
    let assessment = assess::assess(model.as_ref(), &text, &description).await?;

    println!("Fit assessment ({})", model.model_name());
    println!("{}", "-".repeat(40));
    for (aspect, score) in assessment.aspects() {
        println!("  {:<26} {:>6.1}", aspect, score);
    }
    Ok(())
}

pub async fn run_pipeline(
    config: &Config,
    resume_path: &Path,
    query: JobQuery,
    progress: ProgressMode,
    no_cache: bool,
) -> Result<()> {
    let mut tailor = Tailor::from_config(config)?.with_reporter(progress.reporter());
    if no_cache {
        tailor = tailor.without_cache();
    }

    let report = tailor.run(resume_path, query).await?;
    let (report_path, csv_path) = pipeline::write_report(&report, &config.output.dir)?;

    print_summary(&report);
    println!();
    println!("Restructured résumé: {}", report.restructured_pdf.display());
    println!("Report:              {}", report_path.display());
    println!("Listings:            {}", csv_path.display());
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!(
        "Tailored {} of {} listings for \"{}\"",
        report.jobs.len(),
        report.listings.len(),
        report.query.keywords
    );
    println!();
    println!(
        "  {:<12} {:>9} {:>9} {:>7}  {}",
        "Job ID", "Original", "Tailored", "Delta", "Title"
    );
    println!("  {}", "-".repeat(76));
    for job in &report.jobs {
        println!(
            "  {:<12} {:>9.2} {:>9.2} {:>+7.2}  {}",
            job.posting.listing.job_id,
            job.original_score,
            job.tailored_score,
            job.improvement(),
            job.posting.listing.title
        );
    }
    for skipped in &report.skipped {
        println!("  {:<12} skipped: {}", skipped.job_id, skipped.reason);
    }
}
