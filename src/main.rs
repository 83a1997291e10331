//! # Résumé Tailor CLI (`tailor`)
//!
//! The `tailor` binary restructures a résumé into a fixed schema, searches a
//! job board, rewrites the résumé for each posting, and scores the result.
//!
//! ## Usage
//!
//! ```bash
//! tailor --config ./config/tailor.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tailor extract <file>` | Print the text of a PDF, DOCX, or text file |
//! | `tailor restructure <file>` | Restructure a résumé into schema JSON |
//! | `tailor render <json>` | Render schema JSON to PDF |
//! | `tailor search "<keywords>"` | List job postings |
//! | `tailor describe <job>` | Print a posting's description |
//! | `tailor score <résumé>` | Relevance of a résumé to a posting, 0-100 |
//! | `tailor regen <résumé>` | Rewrite a résumé for one posting |
//! | `tailor assess <résumé>` | Seven-aspect LLM fit assessment |
//! | `tailor run <résumé> "<keywords>"` | Search, tailor, render, and score |
//!
//! ## Examples
//!
//! ```bash
//! # Restructure once, keep the JSON for later
//! tailor restructure cv.pdf --out cv.json --pdf cv-clean.pdf
//!
//! # Score against a posting on the board
//! tailor score cv.json --job-id 3912345678
//!
//! # Full run: the five best postings in Berlin
//! tailor run cv.pdf "rust engineer" --location Berlin --limit 5
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use resume_tailor::commands::{self, JobSource};
use resume_tailor::config;
use resume_tailor::models::JobQuery;
use resume_tailor::progress::ProgressMode;

/// Résumé Tailor: rewrite a résumé for each job posting and measure the fit.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means defaults throughout.
#[derive(Parser)]
#[command(
    name = "tailor",
    about = "Résumé Tailor: rewrite a résumé for each job posting and measure the fit",
    version,
    long_about = "Résumé Tailor restructures a résumé into a fixed JSON schema with an LLM, \
    searches a job board, rewrites the résumé for each posting without changing its structure, \
    renders every version to PDF, and scores each one against its posting with sentence embeddings."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/tailor.toml`. LLM, embedding, scraper, and
    /// output settings are read from this file.
    #[arg(long, global = true, default_value = "./config/tailor.toml")]
    config: PathBuf,

    /// Progress on stderr: `off`, `human`, or `json`.
    /// Defaults to `human` when stderr is a terminal, otherwise `off`.
    #[arg(long, global = true)]
    progress: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Print the plain text of a PDF, DOCX, or text file.
    Extract {
        /// File to extract.
        path: PathBuf,
    },

    /// Restructure a résumé into the schema JSON.
    ///
    /// The result is cached by a fingerprint of the résumé text, so running
    /// this twice on the same file calls the model once.
    Restructure {
        /// Résumé file (PDF, DOCX, or text).
        path: PathBuf,

        /// Write the JSON here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Also render the restructured résumé to this PDF.
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Ignore the cache and call the model.
        #[arg(long)]
        no_cache: bool,
    },

    /// Render schema JSON to PDF.
    Render {
        /// Schema JSON, as written by `tailor restructure`.
        json: PathBuf,

        /// Output PDF path.
        #[arg(long, default_value = "resume.pdf")]
        out: PathBuf,
    },

    /// Search the job board and list postings.
    Search {
        /// Search keywords, e.g. "rust engineer".
        keywords: String,

        /// Location filter.
        #[arg(long, default_value = "")]
        location: String,

        /// Maximum number of listings.
        #[arg(long, default_value_t = 25)]
        limit: usize,

        /// Also write the listings to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Print the description of a posting.
    Describe {
        /// Job id or posting URL.
        job: String,
    },

    /// Score a résumé against a posting (0-100).
    Score {
        /// Résumé file, or schema JSON.
        resume: PathBuf,

        /// Job id or posting URL on the job board.
        #[arg(long)]
        job_id: Option<String>,

        /// Job description file.
        #[arg(long)]
        job_file: Option<PathBuf>,
    },

    /// Rewrite a résumé for one posting, keeping its structure.
    Regen {
        /// Résumé file, or schema JSON.
        resume: PathBuf,

        /// Job id or posting URL on the job board.
        #[arg(long)]
        job_id: Option<String>,

        /// Job description file.
        #[arg(long)]
        job_file: Option<PathBuf>,

        /// Write the tailored JSON here instead of stdout.
        #[arg(long)]
        out_json: Option<PathBuf>,

        /// Also render the tailored résumé to this PDF.
        #[arg(long)]
        out_pdf: Option<PathBuf>,
    },

    /// Ask the LLM to grade a résumé against a posting on seven aspects.
    Assess {
        /// Résumé file, or schema JSON.
        resume: PathBuf,

        /// Job id or posting URL on the job board.
        #[arg(long)]
        job_id: Option<String>,

        /// Job description file.
        #[arg(long)]
        job_file: Option<PathBuf>,
    },

    /// Search, tailor, render, and score in one go.
    ///
    /// Writes `restructured.pdf`, one `<job_id>.pdf` per posting,
    /// `report.json`, and `listings.csv` into the output directory.
    Run {
        /// Résumé file (PDF, DOCX, or text).
        resume: PathBuf,

        /// Search keywords.
        keywords: String,

        /// Location filter.
        #[arg(long, default_value = "")]
        location: String,

        /// Maximum number of postings to tailor for.
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Ignore the restructure cache.
        #[arg(long)]
        no_cache: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("resume_tailor=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let progress = match cli.progress.as_deref() {
        Some(value) => ProgressMode::parse(value)?,
        None => ProgressMode::default_for_tty(),
    };

    // Commands that don't require config
    match &cli.command {
        Commands::Extract { path } => return commands::run_extract(path),
        Commands::Render { json, out } => return commands::run_render(json, out),
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Extract { .. } | Commands::Render { .. } => {}
        Commands::Restructure {
            path,
            out,
            pdf,
            no_cache,
        } => {
            commands::run_restructure(&cfg, &path, out, pdf, no_cache).await?;
        }
        Commands::Search {
            keywords,
            location,
            limit,
            csv,
        } => {
            commands::run_search(&cfg, &keywords, &location, limit, csv).await?;
        }
        Commands::Describe { job } => {
            commands::run_describe(&cfg, &job).await?;
        }
        Commands::Score {
            resume,
            job_id,
            job_file,
        } => {
            let job = JobSource::from_args(job_id, job_file)?;
            commands::run_score(&cfg, &resume, job).await?;
        }
        Commands::Regen {
            resume,
            job_id,
            job_file,
            out_json,
            out_pdf,
        } => {
            let job = JobSource::from_args(job_id, job_file)?;
            commands::run_regen(&cfg, &resume, job, out_json, out_pdf).await?;
        }
        Commands::Assess {
            resume,
            job_id,
            job_file,
        } => {
            let job = JobSource::from_args(job_id, job_file)?;
            commands::run_assess(&cfg, &resume, job).await?;
        }
        Commands::Run {
            resume,
            keywords,
            location,
            limit,
            no_cache,
        } => {
            let query = JobQuery {
                keywords,
                location,
                limit,
            };
            commands::run_pipeline(&cfg, &resume, query, progress, no_cache).await?;
        }
    }

    Ok(())
}
