//! Core data models that flow through the tailoring pipeline.
//!
//! Listings come out of the job board scraper, postings add the fetched
//! description, and a [`TailoredJob`] carries the rewritten résumé and
//! both relevance scores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::resume::Resume;

/// A search-result entry scraped from the job board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
}

/// A listing together with its free-text description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(flatten)]
    pub listing: JobListing,
    pub description: String,
}

/// Result of tailoring the résumé to one posting.
#[derive(Debug, Clone, Serialize)]
pub struct TailoredJob {
    pub posting: JobPosting,
    /// Relevance of the restructured (untailored) résumé, 0–100.
    pub original_score: f64,
    /// Relevance of the tailored résumé, 0–100.
    pub tailored_score: f64,
    pub resume: Resume,
    pub pdf_path: PathBuf,
}

impl TailoredJob {
    pub fn improvement(&self) -> f64 {
        self.tailored_score - self.original_score
    }
}

/// A posting that was dropped from a run, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedJob {
    pub job_id: String,
    pub reason: String,
}

/// Search parameters for a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct JobQuery {
    pub keywords: String,
    pub location: String,
    pub limit: usize,
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub resume_fingerprint: String,
    pub query: JobQuery,
    pub restructured_pdf: PathBuf,
    /// Every listing the search returned, tailored or not.
    pub listings: Vec<JobListing>,
    pub jobs: Vec<TailoredJob>,
    pub skipped: Vec<SkippedJob>,
}
