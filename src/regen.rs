//! Rewrite a résumé toward one job description.
//!
//! The model may change values but not the shape of the résumé. Replies are
//! checked with [`schema::compare_structure`]; a drifting reply is retried,
//! and if retries run out the rewritten values are merged back onto the
//! original shape with [`schema::conform`].

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::llm::{self, ChatModel};
use crate::prompts;
use crate::resume::Resume;
use crate::schema;

/// Regenerate `resume` for `job_description`.
///
/// `structure_retries` is the number of extra model calls allowed when a
/// reply does not preserve the résumé's structure.
pub async fn regenerate(
    model: &dyn ChatModel,
    resume: &Resume,
    job_description: &str,
    structure_retries: u32,
) -> Result<Resume> {
    if job_description.trim().is_empty() {
        bail!("job description is empty");
    }

    let original = resume.to_value();
    let resume_json = serde_json::to_string_pretty(&original)?;
    let prompt = prompts::regenerate_prompt(job_description, &resume_json);

    let mut last_reply = None;
    for attempt in 0..=structure_retries {
        let reply: serde_json::Value =
            llm::complete_json(model, Some(prompts::JSON_ONLY_SYSTEM), &prompt)
                .await
                .context("regenerating résumé")?;

        let diffs = schema::compare_structure(&original, &reply);
        if diffs.is_empty() {
            info!(attempt, "regenerated résumé preserved structure");
            return Resume::from_value(reply).context("decoding regenerated résumé");
        }

        warn!(
            attempt,
            drift = diffs.len(),
            first = %diffs[0],
            "regenerated résumé changed structure"
        );
        last_reply = Some(reply);
    }

    let Some(reply) = last_reply else {
        bail!("model produced no reply");
    };
    warn!("structure retries exhausted, conforming reply to original shape");
    Resume::from_value(schema::conform(&original, &reply)).context("decoding conformed résumé")
}
