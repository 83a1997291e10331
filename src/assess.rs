//! Seven-aspect fit assessment of a résumé against a job description.
//!
//! Unlike the embedding score this asks the chat model to grade the résumé
//! the way a recruiter would, aspect by aspect.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::llm::{self, ChatModel};
use crate::prompts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitAssessment {
    #[serde(rename = "Keyword_Matching_Score", deserialize_with = "score")]
    pub keyword_matching: f64,
    #[serde(rename = "Skills_Matching_Score", deserialize_with = "score")]
    pub skills_matching: f64,
    #[serde(rename = "Qualifications_Matching_Score", deserialize_with = "score")]
    pub qualifications_matching: f64,
    #[serde(rename = "Experience_Alignment_Score", deserialize_with = "score")]
    pub experience_alignment: f64,
    #[serde(
        rename = "Education_and_Certifications_Alignment_Score",
        deserialize_with = "score"
    )]
    pub education_alignment: f64,
    #[serde(
        rename = "Soft_Skills_and_Personal_Attributes_Score",
        deserialize_with = "score"
    )]
    pub soft_skills: f64,
    #[serde(rename = "Overall_Fit_Score", deserialize_with = "score")]
    pub overall_fit: f64,
}

impl FitAssessment {
    /// `(label, score)` pairs in report order.
    pub fn aspects(&self) -> [(&'static str, f64); 7] {
        [
            ("Keyword matching", self.keyword_matching),
            ("Skills matching", self.skills_matching),
            ("Qualifications matching", self.qualifications_matching),
            ("Experience alignment", self.experience_alignment),
            ("Education & certifications", self.education_alignment),
            ("Soft skills & attributes", self.soft_skills),
            ("Overall fit", self.overall_fit),
        ]
    }
}

/// Accept numbers or numeric strings (`"85"`, `"85%"`), clamped to 0–100.
fn score<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(d)?;
    let n = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| D::Error::custom(format!("expected a numeric score, got {}", value)))?;

    if !n.is_finite() {
        return Err(D::Error::custom("score is not finite"));
    }
    Ok(n.clamp(0.0, 100.0))
}

/// Ask the model to grade `resume_text` against `job_description`.
pub async fn assess(
    model: &dyn ChatModel,
    resume_text: &str,
    job_description: &str,
) -> Result<FitAssessment> {
    if resume_text.trim().is_empty() {
        bail!("résumé text is empty");
    }
    if job_description.trim().is_empty() {
        bail!("job description is empty");
    }

    let prompt = prompts::assessment_prompt(resume_text, job_description);
    let assessment: FitAssessment =
        llm::complete_json(model, Some(prompts::JSON_ONLY_SYSTEM), &prompt)
            .await
            .context("assessing résumé fit")?;

    tracing::info!(
        overall = assessment.overall_fit,
        model = model.model_name(),
        "fit assessed"
    );
    Ok(assessment)
}
