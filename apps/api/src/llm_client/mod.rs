//! Client for the Anthropic Messages API — the inference capability behind
//! resume feedback. The review analyzer is the only caller; no other module
//! may talk to the API directly.
//!
//! Model: claude-sonnet-4-5 (hardcoded — do not make configurable to prevent drift)

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls in Critiq.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },
}

/// Transport faults and 429/5xx answers are worth another attempt; every
/// other API status is a terminal answer about this request.
fn retryable(err: &LlmError) -> bool {
    match err {
        LlmError::Http(_) => true,
        LlmError::Api { status, .. } => *status == 429 || *status >= 500,
        LlmError::RateLimited { .. } => false,
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a [RequestBlock<'a>],
}

/// One block of user content: text, or an inline base64 image.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
pub struct ImageSource<'a> {
    #[serde(rename = "type")]
    source_type: &'a str,
    media_type: &'a str,
    data: &'a str,
}

impl<'a> RequestBlock<'a> {
    pub fn text(text: &'a str) -> Self {
        RequestBlock::Text { text }
    }

    pub fn base64_image(media_type: &'a str, data: &'a str) -> Self {
        RequestBlock::Image {
            source: ImageSource {
                source_type: "base64",
                media_type,
                data,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: MessageContent,
    pub usage: Usage,
}

/// Message content arrives either as a bare string or as a sequence of
/// blocks. Both shapes normalize to the same extracted text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub block_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageContent {
    /// Extracts the text: the string itself, or the first text-bearing block.
    /// Untyped blocks count as text; non-text block types are skipped.
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text.as_str()),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter(|b| b.block_type.as_deref().map_or(true, |t| t == "text"))
                .find_map(|b| b.text.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API with bounded retry. One instance is
/// built at startup and shared by the analyzer.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Submits one user turn and returns the full response object. Transport
    /// faults, 429s, and 5xx answers are retried with exponential backoff;
    /// any other non-success status ends the call immediately.
    pub async fn call(
        &self,
        content: &[RequestBlock<'_>],
        system: &str,
    ) -> Result<LlmResponse, LlmError> {
        let body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 1s, 2s, 4s
                let delay = Duration::from_secs(1 << (attempt - 1));
                warn!(
                    "retrying LLM call in {}s (attempt {} of {MAX_RETRIES})",
                    delay.as_secs(),
                    attempt + 1
                );
                tokio::time::sleep(delay).await;
            }

            match self.send(&body).await {
                Ok(response) => return Ok(response),
                Err(e) if retryable(&e) => {
                    warn!("LLM call failed: {e}");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    async fn send(&self, body: &AnthropicRequest<'_>) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: LlmResponse = response.json().await?;
        debug!(
            "LLM reply: {} input tokens, {} output tokens",
            parsed.usage.input_tokens, parsed.usage.output_tokens
        );
        Ok(parsed)
    }
}

/// Removes a markdown code fence wrapping, which the model sometimes adds
/// despite being told not to.
pub fn strip_json_fences(text: &str) -> &str {
    let trimmed = text.trim();
    for prefix in ["```json", "```"] {
        if let Some(inner) = trimmed.strip_prefix(prefix) {
            let inner = inner.trim_start();
            return inner.strip_suffix("```").map_or(inner, str::trim);
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_language_tag() {
        let input = "```json\n{\"ATS\": {\"score\": 82}}\n```";
        assert_eq!(strip_json_fences(input), "{\"ATS\": {\"score\": 82}}");
    }

    #[test]
    fn test_strip_json_fences_bare_fence() {
        assert_eq!(strip_json_fences("```\n{}\n```"), "{}");
    }

    #[test]
    fn test_strip_json_fences_passes_unfenced_text_through() {
        assert_eq!(strip_json_fences("  {\"score\": 1} "), "{\"score\": 1}");
    }

    #[test]
    fn test_retryable_statuses() {
        let rate_limited = LlmError::Api {
            status: 429,
            message: String::new(),
        };
        let server_fault = LlmError::Api {
            status: 503,
            message: String::new(),
        };
        let bad_request = LlmError::Api {
            status: 400,
            message: String::new(),
        };
        assert!(retryable(&rate_limited));
        assert!(retryable(&server_fault));
        assert!(!retryable(&bad_request));
    }

    #[test]
    fn test_content_normalizes_bare_string() {
        let content: MessageContent = serde_json::from_str(r#""the feedback""#).unwrap();
        assert_eq!(content.text(), Some("the feedback"));
    }

    #[test]
    fn test_content_normalizes_block_sequence() {
        let content: MessageContent =
            serde_json::from_str(r#"[{"type": "text", "text": "the feedback"}]"#).unwrap();
        assert_eq!(content.text(), Some("the feedback"));
    }

    #[test]
    fn test_content_normalizes_untyped_block() {
        let content: MessageContent = serde_json::from_str(r#"[{"text": "the feedback"}]"#).unwrap();
        assert_eq!(content.text(), Some("the feedback"));
    }

    #[test]
    fn test_both_shapes_extract_identical_text() {
        let bare: MessageContent = serde_json::from_str(r#""same text""#).unwrap();
        let blocks: MessageContent = serde_json::from_str(r#"[{"text": "same text"}]"#).unwrap();
        assert_eq!(bare.text(), blocks.text());
    }

    #[test]
    fn test_empty_block_sequence_has_no_text() {
        let content: MessageContent = serde_json::from_str("[]").unwrap();
        assert_eq!(content.text(), None);
    }

    #[test]
    fn test_request_block_serialization() {
        let block = RequestBlock::base64_image("image/jpeg", "QUJD");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["source"]["type"], "base64");
        assert_eq!(json["source"]["media_type"], "image/jpeg");
    }
}
