//! Chat-completion clients.
//!
//! Every LLM call in the crate goes through a [`ChatModel`]. Two backends
//! are provided:
//! - **[`OpenAiChat`]** calls `POST /v1/chat/completions`.
//! - **[`AnthropicChat`]** calls `POST /v1/messages`.
//!
//! Model replies are meant to be JSON but frequently arrive wrapped in
//! Markdown fences or with a sentence of preamble. [`parse_json_reply`]
//! recovers the JSON from those replies.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("could not parse model reply as JSON: {reason}")]
    Parse { reason: String, reply: String },

    #[error("model returned empty content")]
    EmptyContent,

    #[error("{0} environment variable not set")]
    MissingApiKey(String),

    #[error("unknown llm provider: {0}")]
    UnknownProvider(String),

    #[error("gave up after {retries} retries: {last}")]
    RetriesExhausted { retries: u32, last: Box<LlmError> },
}

/// A chat model that answers a single-turn prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, e.g. `"gpt-4o-mini"`.
    fn model_name(&self) -> &str;

    /// Send one user prompt (with an optional system prompt) and return the
    /// model's text reply.
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, LlmError>;
}

/// Complete a prompt and decode the reply as JSON into `T`.
pub async fn complete_json<T: DeserializeOwned>(
    model: &dyn ChatModel,
    system: Option<&str>,
    prompt: &str,
) -> Result<T, LlmError> {
    let reply = model.complete(system, prompt).await?;
    let value = parse_json_reply(&reply)?;
    serde_json::from_value(value).map_err(|e| LlmError::Parse {
        reason: e.to_string(),
        reply,
    })
}

/// Build the configured chat model, reading the API key from the environment.
pub fn create_chat_model(config: &LlmConfig) -> Result<Box<dyn ChatModel>, LlmError> {
    let key_env = config.key_env();
    let api_key = std::env::var(key_env)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| LlmError::MissingApiKey(key_env.to_string()))?;

    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiChat::new(config, api_key)?)),
        "anthropic" => Ok(Box::new(AnthropicChat::new(config, api_key)?)),
        other => Err(LlmError::UnknownProvider(other.to_string())),
    }
}

// ============ OpenAI ============

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Chat model backed by the OpenAI chat completions API (or any server
/// speaking the same protocol, via `llm.url`).
pub struct OpenAiChat {
    client: Client,
    api_key: String,
    model: String,
    url: String,
    max_tokens: u32,
    temperature: Option<f32>,
    max_retries: u32,
}

impl OpenAiChat {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base = config.url.as_deref().unwrap_or("https://api.openai.com");
        Ok(Self {
            client,
            api_key,
            model: config.model_name().to_string(),
            url: format!("{}/v1/chat/completions", base.trim_end_matches('/')),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(Message {
                role: "system",
                content: system,
            });
        }
        messages.push(Message {
            role: "user",
            content: prompt,
        });
        let body = OpenAiRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = send_with_retry(self.max_retries, || {
            self.client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await?;

        let parsed: OpenAiResponse = response.json().await?;
        if let Some(usage) = &parsed.usage {
            debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion succeeded"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

// ============ Anthropic ============

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Chat model backed by the Anthropic Messages API.
pub struct AnthropicChat {
    client: Client,
    api_key: String,
    model: String,
    url: String,
    max_tokens: u32,
    temperature: Option<f32>,
    max_retries: u32,
}

impl AnthropicChat {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base = config.url.as_deref().unwrap_or("https://api.anthropic.com");
        Ok(Self {
            client,
            api_key,
            model: config.model_name().to_string(),
            url: format!("{}/v1/messages", base.trim_end_matches('/')),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl ChatModel for AnthropicChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, LlmError> {
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = send_with_retry(self.max_retries, || {
            self.client
                .post(&self.url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
        })
        .await?;

        let parsed: AnthropicResponse = response.json().await?;
        if let Some(usage) = &parsed.usage {
            debug!(
                model = %self.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "messages call succeeded"
            );
        }

        parsed
            .content
            .into_iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

// ============ Shared plumbing ============

/// Send a request, retrying rate limits, server errors and network failures.
///
/// Other 4xx responses fail at once. When every attempt failed and retries
/// were allowed, the last error comes back wrapped in
/// [`LlmError::RetriesExhausted`].
async fn send_with_retry<F>(max_retries: u32, build: F) -> Result<reqwest::Response, LlmError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        let error = match build().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }
                let body = response.text().await.unwrap_or_default();
                let error = LlmError::Api {
                    status: status.as_u16(),
                    message: api_error_message(&body),
                };
                if status.as_u16() != 429 && !status.is_server_error() {
                    return Err(error);
                }
                error
            }
            Err(e) => LlmError::Http(e),
        };

        if attempt >= max_retries {
            return Err(if max_retries == 0 {
                error
            } else {
                LlmError::RetriesExhausted {
                    retries: max_retries,
                    last: Box::new(error),
                }
            });
        }

        attempt += 1;
        let delay = Duration::from_secs(1 << (attempt - 1).min(5));
        warn!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "LLM call failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Pull `error.message` out of an OpenAI/Anthropic error body, falling back
/// to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Recover a JSON value from a model reply.
///
/// Tries, in order: the reply as-is, the reply with ```` ```json ```` / ```` ``` ````
/// fences removed, and the outermost `{ ... }` span of the reply.
pub fn parse_json_reply(reply: &str) -> Result<serde_json::Value, LlmError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(LlmError::EmptyContent);
    }

    let first_err = match serde_json::from_str(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let unfenced = strip_json_fences(trimmed);
    if unfenced.len() != trimmed.len() {
        if let Ok(value) = serde_json::from_str(unfenced) {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(LlmError::Parse {
        reason: first_err.to_string(),
        reply: reply.to_string(),
    })
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```JSON"))
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(|s| s.trim())
                .unwrap_or(stripped)
        }
        None => text,
    }
}
