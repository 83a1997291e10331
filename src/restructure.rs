//! Restructure free résumé text into the canonical schema.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::llm::{self, ChatModel};
use crate::prompts;
use crate::resume::Resume;

/// Stable fingerprint of résumé text, used as the cache key.
pub fn fingerprint(resume_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(resume_text.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Ask the model to fill the résumé schema from `resume_text`.
pub async fn restructure(model: &dyn ChatModel, resume_text: &str) -> Result<Resume> {
    if resume_text.trim().is_empty() {
        bail!("résumé text is empty");
    }

    let prompt = prompts::restructure_prompt(resume_text);
    info!(model = model.model_name(), chars = resume_text.len(), "restructuring résumé");

    let value: serde_json::Value =
        llm::complete_json(model, Some(prompts::JSON_ONLY_SYSTEM), &prompt)
            .await
            .context("restructuring résumé")?;
    let resume = Resume::from_value(value).context("decoding restructured résumé")?;

    if resume.is_empty() {
        bail!("the model extracted nothing from the résumé");
    }
    Ok(resume)
}

/// Where restructured résumés are cached between runs.
#[derive(Debug, Clone)]
pub struct ResumeCache {
    dir: PathBuf,
}

impl ResumeCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{}.json", fingerprint))
    }

    /// Load a cached résumé. Unreadable or stale entries count as a miss.
    pub fn load(&self, fingerprint: &str) -> Option<Resume> {
        let path = self.path_for(fingerprint);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<Resume>(&content) {
            Ok(resume) if !resume.is_empty() => {
                debug!(path = %path.display(), "restructured résumé cache hit");
                Some(resume)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt cache entry");
                None
            }
        }
    }

    pub fn store(&self, fingerprint: &str, resume: &Resume) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating cache dir {}", self.dir.display()))?;
        let path = self.path_for(fingerprint);
        std::fs::write(&path, serde_json::to_string_pretty(resume)?)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

/// Restructure with an optional cache in front of the model.
pub async fn restructure_cached(
    model: &dyn ChatModel,
    resume_text: &str,
    cache: Option<&ResumeCache>,
) -> Result<Resume> {
    let key = fingerprint(resume_text);

    if let Some(resume) = cache.and_then(|c| c.load(&key)) {
        info!(fingerprint = %&key[..12], "using cached restructured résumé");
        return Ok(resume);
    }

    let resume = restructure(model, resume_text).await?;

    if let Some(cache) = cache {
        if let Err(e) = cache.store(&key, &resume) {
            warn!(error = %e, "could not cache restructured résumé");
        }
    }
    Ok(resume)
}

/// Read a schema JSON file written by `tailor restructure` (or by hand).
pub fn load_resume_json(path: &Path) -> Result<Resume> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read résumé JSON: {}", path.display()))?;
    let value = llm::parse_json_reply(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Resume::from_value(value).with_context(|| format!("decoding {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedModel {
        reply: String,
        calls: AtomicUsize,
    }

    impl CannedModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChatModel for CannedModel {
        fn model_name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, _system: Option<&str>, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn restructures_fenced_reply() {
        let model = CannedModel::new(
            "```json\n{\"name\": \"Jane Doe\", \"skills\": {\"languages\": [\"Rust\"]}}\n```",
        );
        let resume = restructure(&model, "Jane Doe. Rust.").await.unwrap();
        assert_eq!(resume.name, "Jane Doe");
        assert_eq!(resume.skills["languages"], vec!["Rust"]);
    }

    #[tokio::test]
    async fn empty_text_never_calls_model() {
        let model = CannedModel::new("{}");
        assert!(restructure(&model, "   ").await.is_err());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_extraction_is_an_error() {
        let model = CannedModel::new("{\"name\": \"\", \"experience\": []}");
        let err = restructure(&model, "some text").await.unwrap_err();
        assert!(err.to_string().contains("extracted nothing"));
    }

    #[tokio::test]
    async fn cache_skips_second_call() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = ResumeCache::new(tmp.path());
        let model = CannedModel::new("{\"name\": \"Jane\"}");

        let first = restructure_cached(&model, "Jane", Some(&cache)).await.unwrap();
        let second = restructure_cached(&model, "Jane", Some(&cache)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fingerprint_ignores_surrounding_whitespace() {
        assert_eq!(fingerprint("abc"), fingerprint("  abc\n"));
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
        assert_eq!(fingerprint("abc").len(), 64);
    }

    #[test]
    fn corrupt_cache_entry_is_a_miss() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = ResumeCache::new(tmp.path());
        std::fs::write(tmp.path().join("deadbeef.json"), "not json").unwrap();
        assert!(cache.load("deadbeef").is_none());
    }
}
