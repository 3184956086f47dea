//! Speech synthesis seam and the HTTP client behind it.
//!
//! [`SpeechSynthesizer`] returns MP3 bytes for a text and a
//! [`VoiceProfile`].  [`HttpSynthesizer`] posts to a
//! `/v1/text-to-speech/{voice_id}` endpoint with an `xi-api-key` header.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TtsConfig;

// ---------------------------------------------------------------------------
// SynthesisError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("synthesis API key is not configured")]
    MissingApiKey,

    #[error("synthesis request failed: {0}")]
    Request(String),

    #[error("synthesis request timed out")]
    Timeout,

    #[error("synthesis API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("synthesis API returned no audio")]
    EmptyAudio,
}

impl From<reqwest::Error> for SynthesisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SynthesisError::Timeout
        } else {
            SynthesisError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceProfile
// ---------------------------------------------------------------------------

/// Named voice plus its synthesis parameters.
///
/// Missing fields in a stored profile take the [`Default`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VoiceProfile {
    pub voice_id: String,
    pub voice_name: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            voice_id: String::new(),
            voice_name: String::new(),
            stability: 0.5,
            similarity_boost: 0.9,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

impl VoiceProfile {
    /// Profile with default parameters for an uncatalogued `voice_id`; the
    /// id doubles as the name.
    pub fn with_id(voice_id: impl Into<String>) -> Self {
        let voice_id = voice_id.into();
        Self {
            voice_name: voice_id.clone(),
            voice_id,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`; the result is always MP3.
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<Bytes, SynthesisError>;
}

// ---------------------------------------------------------------------------
// HttpSynthesizer
// ---------------------------------------------------------------------------

pub struct HttpSynthesizer {
    client: reqwest::Client,
    config: TtsConfig,
}

impl HttpSynthesizer {
    pub fn from_config(config: &TtsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self, voice: &VoiceProfile) -> String {
        format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            voice.voice_id
        )
    }

    fn request_body(&self, text: &str, voice: &VoiceProfile) -> serde_json::Value {
        serde_json::json!({
            "text": text,
            "model_id": self.config.model_id,
            "voice_settings": {
                "stability": voice.stability,
                "similarity_boost": voice.similarity_boost,
                "style": voice.style,
                "use_speaker_boost": voice.use_speaker_boost
            }
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<Bytes, SynthesisError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(SynthesisError::MissingApiKey)?;

        let response = self
            .client
            .post(self.endpoint(voice))
            .header("xi-api-key", key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&self.request_body(text, voice))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        log::debug!("tts: {} chars -> {} bytes", text.chars().count(), audio.len());
        Ok(audio)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_parameters() {
        let v = VoiceProfile::with_id("21m00Tcm4TlvDq8ikWAM");
        assert_eq!(v.stability, 0.5);
        assert_eq!(v.similarity_boost, 0.9);
        assert_eq!(v.style, 0.0);
        assert!(v.use_speaker_boost);
    }

    #[test]
    fn endpoint_and_body() {
        let synth = HttpSynthesizer::from_config(&TtsConfig {
            base_url: "https://tts.example/".into(),
            ..TtsConfig::default()
        });
        let voice = VoiceProfile::with_id("abc");
        assert_eq!(synth.endpoint(&voice), "https://tts.example/v1/text-to-speech/abc");

        let body = synth.request_body("hi", &voice);
        assert_eq!(body["text"], "hi");
        assert_eq!(body["voice_settings"]["use_speaker_boost"], true);
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let synth = HttpSynthesizer::from_config(&TtsConfig::default());
        let err = synth
            .synthesize("hello", &VoiceProfile::with_id("abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::MissingApiKey));
    }
}
