//! Relevance scoring: how close a résumé is to a job description.
//!
//! Both texts are embedded with the configured provider and compared with
//! cosine similarity. The similarity in `[-1, 1]` is mapped linearly onto
//! a 0–100 score rounded to two decimals, so 50 means "unrelated".

use anyhow::{bail, Result};
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::embedding::{self, EmbeddingProvider};

/// Map a cosine similarity onto the 0–100 relevance scale.
pub fn similarity_to_score(cosine: f32) -> f64 {
    let score = (f64::from(cosine) + 1.0) / 2.0 * 100.0;
    ((score * 100.0).round() / 100.0).clamp(0.0, 100.0)
}

/// Scores résumé text against job descriptions.
pub struct RelevanceScorer {
    provider: Box<dyn EmbeddingProvider>,
    config: EmbeddingConfig,
}

impl RelevanceScorer {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        if !config.is_enabled() {
            bail!("Relevance scoring needs an embedding provider. Set [embedding] provider in config.");
        }
        let provider = embedding::create_provider(config)?;
        Ok(Self {
            provider,
            config: config.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Relevance of `resume_text` to one job description.
    pub async fn score(&self, resume_text: &str, job_description: &str) -> Result<f64> {
        check_text("résumé", resume_text)?;
        check_text("job description", job_description)?;

        let vectors = embedding::embed_texts(
            self.provider.as_ref(),
            &self.config,
            &[resume_text.to_string(), job_description.to_string()],
        )
        .await?;
        let [resume_vec, job_vec] = vectors.as_slice() else {
            bail!("expected 2 embeddings, got {}", vectors.len());
        };

        let cosine = embedding::cosine_similarity(resume_vec, job_vec);
        let score = similarity_to_score(cosine);
        debug!(cosine, score, "relevance scored");
        Ok(score)
    }

    /// Relevance of `resume_text` to each description, in order.
    ///
    /// The résumé is embedded once; the descriptions are embedded in
    /// batches of the configured size.
    pub async fn score_many(&self, resume_text: &str, descriptions: &[String]) -> Result<Vec<f64>> {
        check_text("résumé", resume_text)?;
        for description in descriptions {
            check_text("job description", description)?;
        }
        if descriptions.is_empty() {
            return Ok(Vec::new());
        }

        let resume_vec =
            embedding::embed_one(self.provider.as_ref(), &self.config, resume_text).await?;
        let job_vecs =
            embedding::embed_texts(self.provider.as_ref(), &self.config, descriptions).await?;

        Ok(job_vecs
            .iter()
            .map(|v| similarity_to_score(embedding::cosine_similarity(&resume_vec, v)))
            .collect())
    }
}

fn check_text(what: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        bail!("cannot score an empty {}", what);
    }
    Ok(())
}
