//! Pipeline progress reporting.
//!
//! Reports what a `tailor run` is doing (searching, fetching descriptions,
//! scoring, tailoring) and how much is left. Progress is emitted on
//! **stderr** so stdout stays parseable for scripts.

use std::io::Write;

/// A single progress event from the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEvent {
    /// Restructuring the résumé (or loading it from cache).
    Restructuring,
    /// Fetched search page `page` (1-based); `found` listings so far.
    Searching { page: usize, found: usize },
    /// Fetched `n` of `total` job descriptions.
    Describing { n: usize, total: usize },
    /// Scored `n` of `total` postings against the original résumé.
    Scoring { n: usize, total: usize },
    /// Tailoring for posting `n` of `total`.
    Tailoring {
        n: usize,
        total: usize,
        job_id: String,
    },
}

/// Reports pipeline progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: PipelineEvent);
}

/// Human-friendly progress on stderr: "tailor  tailoring  3 / 12  (3912345678)".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: PipelineEvent) {
        let line = match &event {
            PipelineEvent::Restructuring => "tailor  restructuring résumé...\n".to_string(),
            PipelineEvent::Searching { page, found } => {
                format!(
                    "tailor  searching  page {}  ({} listings)\n",
                    page,
                    format_number(*found)
                )
            }
            PipelineEvent::Describing { n, total } => {
                format!(
                    "tailor  describing  {} / {}\n",
                    format_number(*n),
                    format_number(*total)
                )
            }
            PipelineEvent::Scoring { n, total } => {
                format!(
                    "tailor  scoring  {} / {}\n",
                    format_number(*n),
                    format_number(*total)
                )
            }
            PipelineEvent::Tailoring { n, total, job_id } => {
                format!(
                    "tailor  tailoring  {} / {}  ({})\n",
                    format_number(*n),
                    format_number(*total),
                    job_id
                )
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl JsonProgress {
    fn to_json(event: &PipelineEvent) -> serde_json::Value {
        match event {
            PipelineEvent::Restructuring => serde_json::json!({
                "event": "progress",
                "phase": "restructuring"
            }),
            PipelineEvent::Searching { page, found } => serde_json::json!({
                "event": "progress",
                "phase": "searching",
                "page": page,
                "found": found
            }),
            PipelineEvent::Describing { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "describing",
                "n": n,
                "total": total
            }),
            PipelineEvent::Scoring { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "scoring",
                "n": n,
                "total": total
            }),
            PipelineEvent::Tailoring { n, total, job_id } => serde_json::json!({
                "event": "progress",
                "phase": "tailoring",
                "n": n,
                "total": total,
                "job_id": job_id
            }),
        }
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: PipelineEvent) {
        if let Ok(line) = serde_json::to_string(&Self::to_json(&event)) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: PipelineEvent) {}
}

fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse a `--progress` value.
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "off" | "none" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => anyhow::bail!(
                "Unknown progress mode: '{}'. Must be off, human, or json.",
                other
            ),
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
