//! Delivery seam: how finished audio reaches the user.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Error text the Bot API uses when the recipient blocks voice messages.
pub const VOICE_FORBIDDEN_MARKER: &str = "VOICE_MESSAGES_FORBIDDEN";

// ---------------------------------------------------------------------------
// DeliveryError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The recipient disabled voice messages; an audio attachment may
    /// still go through.
    #[error("recipient does not accept voice messages")]
    VoiceForbidden,

    /// Anything else; terminal for the interaction.
    #[error("delivery failed: {0}")]
    Other(String),
}

impl DeliveryError {
    /// Map a platform error description onto the taxonomy.
    pub fn from_description(description: &str) -> Self {
        if description.contains(VOICE_FORBIDDEN_MARKER) {
            DeliveryError::VoiceForbidden
        } else {
            DeliveryError::Other(description.to_string())
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        DeliveryError::Other(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// ChatTarget
// ---------------------------------------------------------------------------

/// Chat identifier as the platform expects it (numeric id or `@channel`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatTarget(pub String);

impl ChatTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// DeliveryClient trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Send `audio` as a voice message.
    async fn send_voice(
        &self,
        chat: &ChatTarget,
        audio: Bytes,
        file_name: &str,
    ) -> Result<(), DeliveryError>;

    /// Send `audio` as a generic audio attachment with a caption.
    async fn send_audio(
        &self,
        chat: &ChatTarget,
        audio: Bytes,
        file_name: &str,
        caption: &str,
    ) -> Result<(), DeliveryError>;

    /// Send a plain text message.
    async fn send_text(&self, chat: &ChatTarget, text: &str) -> Result<(), DeliveryError>;
}
