//! Core `TextEnhancer` trait and `ApiEnhancer` implementation.
//!
//! `ApiEnhancer` calls any OpenAI-compatible `/v1/chat/completions` endpoint
//! to turn a user's message into a script that reads well when spoken.
//! All connection details come from [`LlmConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LlmConfig;

/// System prompt for the voice-script rewrite.
const SYSTEM_PROMPT: &str = "You edit scripts for a speech synthesizer. \
Fix grammar and punctuation. Make the text sound conversational and alive. \
Where it fits the meaning, and sparingly, add non-verbal cues in parentheses: \
(sighs), (laughs), (clears throat), (pause), (whispers). Always write these cues in English. \
If the text is only one or two words, just fix mistakes. \
Never change the meaning. Reply with the rewritten text only.";

/// Inputs shorter than this (in characters) are returned untouched.
const MIN_INPUT_CHARS: usize = 2;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur during text enhancement.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The LLM returned a response with no usable text content.
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// TextEnhancer trait
// ---------------------------------------------------------------------------

/// Async trait for rewriting text before synthesis.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn TextEnhancer>`).
#[async_trait]
pub trait TextEnhancer: Send + Sync {
    async fn enhance(&self, text: &str) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// ApiEnhancer
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct ApiEnhancer {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ApiEnhancer {
    /// Build an `ApiEnhancer` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.  A default client is used if the builder
    /// fails.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user",   "content": text }
            ],
            "temperature": self.config.temperature,
            "max_tokens":  self.config.max_tokens
        })
    }
}

#[async_trait]
impl TextEnhancer for ApiEnhancer {
    /// The `Authorization: Bearer …` header is attached only when
    /// `config.api_key` is a non-empty string.
    async fn enhance(&self, text: &str) -> Result<String, LlmError> {
        if text.chars().count() < MIN_INPUT_CHARS {
            return Ok(text.to_string());
        }

        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let mut req = self.client.post(&url).json(&self.request_body(text));

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let enhanced = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(LlmError::EmptyResponse)?
            .trim()
            .to_string();

        if enhanced.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        log::debug!("llm: {:?} -> {:?}", text, enhanced);
        Ok(enhanced)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            enabled: true,
            api_key: api_key.map(|s| s.to_string()),
            // Nothing listens here; requests fail fast.
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
            ..LlmConfig::default()
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _enhancer = ApiEnhancer::from_config(&make_config(None));
        let _enhancer = ApiEnhancer::from_config(&make_config(Some("")));
        let _enhancer = ApiEnhancer::from_config(&make_config(Some("sk-test-1234")));
    }

    #[test]
    fn request_body_carries_model_and_prompt() {
        let enhancer = ApiEnhancer::from_config(&make_config(None));
        let body = enhancer.request_body("hello there");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello there");
    }

    #[tokio::test]
    async fn one_char_input_is_returned_without_a_request() {
        let enhancer = ApiEnhancer::from_config(&make_config(None));
        assert_eq!(enhancer.enhance("k").await.unwrap(), "k");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let enhancer = ApiEnhancer::from_config(&make_config(None));
        assert!(enhancer.enhance("hello there").await.is_err());
    }

    /// Verify that `ApiEnhancer` is object-safe (usable as `dyn TextEnhancer`).
    #[test]
    fn enhancer_is_object_safe() {
        let enhancer: Box<dyn TextEnhancer> =
            Box::new(ApiEnhancer::from_config(&make_config(None)));
        drop(enhancer);
    }
}
