//! End-to-end tailoring run.
//!
//! ```text
//! résumé file ─▶ text ─▶ Resume ─▶ restructured.pdf
//! search ─▶ listings ─▶ descriptions ─▶ original scores
//! per posting: regenerate ─▶ tailored score ─▶ <job_id>.pdf
//! ```
//!
//! A posting whose description, rewrite, scoring, or rendering fails is
//! recorded as skipped, leaves no PDF behind, and the run carries on.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::extract;
use crate::llm::{self, ChatModel};
use crate::models::{JobPosting, JobQuery, RunReport, SkippedJob, TailoredJob};
use crate::progress::{NoProgress, PipelineEvent, ProgressReporter};
use crate::regen;
use crate::relevance::RelevanceScorer;
use crate::render;
use crate::restructure::{self, ResumeCache};
use crate::resume::Resume;
use crate::scraper::{self, JobBoard};

/// File stem of the untailored résumé PDF.
pub const RESTRUCTURED_STEM: &str = "restructured";

/// Everything a run needs: the chat model, the scorer, and the job board.
pub struct Tailor {
    config: Config,
    model: Box<dyn ChatModel>,
    scorer: RelevanceScorer,
    board: JobBoard,
    reporter: Box<dyn ProgressReporter>,
    use_cache: bool,
}

impl Tailor {
    /// Build every component from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let model = llm::create_chat_model(&config.llm)?;
        let scorer = RelevanceScorer::new(&config.embedding)?;
        let board = JobBoard::new(&config.scraper)?;
        Ok(Self::new(config, model, scorer, board))
    }

    pub fn new(
        config: &Config,
        model: Box<dyn ChatModel>,
        scorer: RelevanceScorer,
        board: JobBoard,
    ) -> Self {
        Self {
            config: config.clone(),
            model,
            scorer,
            board,
            reporter: Box::new(NoProgress),
            use_cache: true,
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Always restructure, ignoring and not writing the cache.
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    fn output_dir(&self) -> &Path {
        &self.config.output.dir
    }

    /// Extract and restructure the résumé at `path`.
    pub async fn load_resume(&self, path: &Path) -> Result<(String, Resume)> {
        let text = extract::extract_file(path)
            .with_context(|| format!("reading résumé {}", path.display()))?;
        self.reporter.report(PipelineEvent::Restructuring);

        let cache = ResumeCache::new(&self.config.output.cache_dir);
        let cache = self.use_cache.then_some(&cache);
        let resume = restructure::restructure_cached(self.model.as_ref(), &text, cache).await?;
        Ok((text, resume))
    }

    /// Run the whole pipeline for the résumé at `resume_path`.
    pub async fn run(&self, resume_path: &Path, query: JobQuery) -> Result<RunReport> {
        let (text, resume) = self.load_resume(resume_path).await?;
        let restructured_pdf =
            render::write_pdf(&resume, self.output_dir(), RESTRUCTURED_STEM)?;
        info!(path = %restructured_pdf.display(), "restructured résumé written");

        let listings = self
            .board
            .search(&query.keywords, &query.location, query.limit, |page, found| {
                self.reporter
                    .report(PipelineEvent::Searching { page, found })
            })
            .await?;

        let mut skipped = Vec::new();
        let mut postings = Vec::with_capacity(listings.len());
        let total = listings.len();
        for (i, listing) in listings.iter().enumerate() {
            match self.board.describe(&listing.job_id).await {
                Ok(description) => postings.push(JobPosting {
                    listing: listing.clone(),
                    description,
                }),
                Err(e) => {
                    warn!(job_id = %listing.job_id, error = %e, "skipping posting without description");
                    skipped.push(SkippedJob {
                        job_id: listing.job_id.clone(),
                        reason: format!("{:#}", e),
                    });
                }
            }
            self.reporter.report(PipelineEvent::Describing { n: i + 1, total });
        }

        let resume_text = resume.to_plain_text();
        let descriptions: Vec<String> = postings.iter().map(|p| p.description.clone()).collect();
        let original_scores = self
            .scorer
            .score_many(&resume_text, &descriptions)
            .await
            .context("scoring the restructured résumé")?;
        self.reporter.report(PipelineEvent::Scoring {
            n: postings.len(),
            total: postings.len(),
        });

        let mut jobs = Vec::with_capacity(postings.len());
        let total = postings.len();
        for (i, (posting, original_score)) in
            postings.into_iter().zip(original_scores).enumerate()
        {
            let job_id = posting.listing.job_id.clone();
            self.reporter.report(PipelineEvent::Tailoring {
                n: i + 1,
                total,
                job_id: job_id.clone(),
            });

            match self.tailor_one(&resume, posting, original_score).await {
                Ok(job) => {
                    info!(
                        job_id = %job_id,
                        original = job.original_score,
                        tailored = job.tailored_score,
                        "résumé tailored"
                    );
                    jobs.push(job);
                }
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "tailoring failed");
                    skipped.push(SkippedJob {
                        job_id,
                        reason: format!("{:#}", e),
                    });
                }
            }
        }

        Ok(RunReport {
            generated_at: Utc::now(),
            resume_fingerprint: restructure::fingerprint(&text),
            query,
            restructured_pdf,
            listings,
            jobs,
            skipped,
        })
    }

    async fn tailor_one(
        &self,
        resume: &Resume,
        posting: JobPosting,
        original_score: f64,
    ) -> Result<TailoredJob> {
        let tailored = regen::regenerate(
            self.model.as_ref(),
            resume,
            &posting.description,
            self.config.llm.structure_retries,
        )
        .await?;
        let tailored_score = self
            .scorer
            .score(&tailored.to_plain_text(), &posting.description)
            .await
            .context("scoring the tailored résumé")?;
        let pdf_path = render::write_pdf(&tailored, self.output_dir(), &posting.listing.job_id)?;

        Ok(TailoredJob {
            posting,
            original_score,
            tailored_score,
            resume: tailored,
            pdf_path,
        })
    }
}

/// Write `report.json` and `listings.csv` into `dir`.
pub fn write_report(report: &RunReport, dir: &Path) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let report_path = dir.join("report.json");
    std::fs::write(&report_path, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("writing {}", report_path.display()))?;

    let csv_path = dir.join("listings.csv");
    scraper::export_listings_csv(&report.listings, &csv_path)?;

    Ok((report_path, csv_path))
}
