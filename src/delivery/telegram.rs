//! Telegram Bot API implementation of [`DeliveryClient`].
//!
//! Uploads go through `multipart/form-data` to `sendVoice` / `sendAudio`;
//! failures are classified from the `description` field of the API reply.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::DeliveryConfig;

use super::client::{ChatTarget, DeliveryClient, DeliveryError};

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
}

impl ApiReply {
    fn into_result(self) -> Result<(), DeliveryError> {
        if self.ok {
            return Ok(());
        }
        let description = self.description.unwrap_or_else(|| match self.error_code {
            Some(code) => format!("error code {code}"),
            None => "unknown error".to_string(),
        });
        Err(DeliveryError::from_description(&description))
    }
}

pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    /// `None` when no bot token is configured.
    pub fn from_config(config: &DeliveryConfig) -> Option<Self> {
        let token = config.bot_token.as_deref().filter(|t| !t.is_empty())?;
        Some(Self::new(config.api_base.clone(), token, config.timeout_secs))
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }

    fn audio_part(audio: Bytes, file_name: &str, mime: &str) -> Result<Part, DeliveryError> {
        Ok(Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime)?)
    }

    async fn post_form(&self, method: &str, form: Form) -> Result<(), DeliveryError> {
        let response = self.client.post(self.method_url(method)).multipart(form).send().await?;
        let reply: ApiReply = response.json().await?;
        reply.into_result()
    }
}

fn mime_for(file_name: &str) -> &'static str {
    if file_name.ends_with(".ogg") || file_name.ends_with(".oga") {
        "audio/ogg"
    } else {
        "audio/mpeg"
    }
}

#[async_trait]
impl DeliveryClient for TelegramClient {
    async fn send_voice(
        &self,
        chat: &ChatTarget,
        audio: Bytes,
        file_name: &str,
    ) -> Result<(), DeliveryError> {
        let size = audio.len();
        let form = Form::new()
            .text("chat_id", chat.as_str().to_string())
            .part("voice", Self::audio_part(audio, file_name, mime_for(file_name))?);
        self.post_form("sendVoice", form).await?;
        log::info!("delivery: voice message ({size} bytes) sent to {chat}");
        Ok(())
    }

    async fn send_audio(
        &self,
        chat: &ChatTarget,
        audio: Bytes,
        file_name: &str,
        caption: &str,
    ) -> Result<(), DeliveryError> {
        let size = audio.len();
        let form = Form::new()
            .text("chat_id", chat.as_str().to_string())
            .text("caption", caption.to_string())
            .part("audio", Self::audio_part(audio, file_name, mime_for(file_name))?);
        self.post_form("sendAudio", form).await?;
        log::info!("delivery: audio attachment ({size} bytes) sent to {chat}");
        Ok(())
    }

    async fn send_text(&self, chat: &ChatTarget, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&serde_json::json!({ "chat_id": chat.as_str(), "text": text }))
            .send()
            .await?;
        let reply: ApiReply = response.json().await?;
        reply.into_result()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(json: &str) -> ApiReply {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn ok_reply_is_success() {
        assert!(reply(r#"{"ok":true,"result":{}}"#).into_result().is_ok());
    }

    #[test]
    fn voice_forbidden_reply_is_classified() {
        let r = reply(r#"{"ok":false,"error_code":400,"description":"Bad Request: VOICE_MESSAGES_FORBIDDEN"}"#);
        assert_eq!(r.into_result(), Err(DeliveryError::VoiceForbidden));
    }

    #[test]
    fn other_failure_keeps_description() {
        let r = reply(r#"{"ok":false,"error_code":403,"description":"Forbidden: bot was blocked by the user"}"#);
        assert!(matches!(r.into_result(), Err(DeliveryError::Other(d)) if d.contains("blocked")));
    }

    #[test]
    fn failure_without_description_uses_code() {
        let r = reply(r#"{"ok":false,"error_code":429}"#);
        assert_eq!(
            r.into_result(),
            Err(DeliveryError::Other("error code 429".into()))
        );
    }

    #[test]
    fn urls_and_config() {
        let client = TelegramClient::new("https://api.telegram.org/", "123:abc", 5);
        assert_eq!(
            client.method_url("sendVoice"),
            "https://api.telegram.org/bot123:abc/sendVoice"
        );
        assert!(TelegramClient::from_config(&DeliveryConfig::default()).is_none());
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for("voice.ogg"), "audio/ogg");
        assert_eq!(mime_for("voice.mp3"), "audio/mpeg");
    }
}
