//! Per-interaction inputs and outcomes.
//!
//! [`DeliveryOutcome`] records which rung of the degradation ladder an
//! interaction ended on:
//!
//! ```text
//! Voice ──pipeline failed──▶ VoiceUnprocessed
//!   │
//!   └──VOICE_MESSAGES_FORBIDDEN──▶ AudioAttachment
//!                                   └──MP3 pipeline failed──▶ AudioAttachmentUnprocessed
//! ```

/// What the orchestrator needs to know about the requesting user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    /// Platform user handle.
    pub user: String,
    /// Selected voice id; `None` uses the configured default.
    pub selected_voice: Option<String>,
    /// Noise tag the user picked; `None` disables noise.
    pub noise_tag: Option<String>,
}

impl UserProfile {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Self::default()
        }
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.selected_voice = Some(voice_id.into());
        self
    }

    pub fn with_noise_tag(mut self, tag: impl Into<String>) -> Self {
        self.noise_tag = Some(tag.into());
        self
    }
}

/// How an interaction was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Processed Opus voice message.
    Voice,
    /// Raw synthesized audio sent as a voice message after the pipeline failed.
    VoiceUnprocessed,
    /// Processed MP3 sent as an audio attachment (voice messages forbidden).
    AudioAttachment,
    /// Raw MP3 sent as an attachment after the MP3 pipeline also failed.
    AudioAttachmentUnprocessed,
}

impl DeliveryOutcome {
    /// Returns `true` when the post-processing pipeline output was delivered.
    ///
    /// ```
    /// use voice_relay::pipeline::DeliveryOutcome;
    ///
    /// assert!(DeliveryOutcome::Voice.is_processed());
    /// assert!(DeliveryOutcome::AudioAttachment.is_processed());
    /// assert!(!DeliveryOutcome::VoiceUnprocessed.is_processed());
    /// assert!(!DeliveryOutcome::AudioAttachmentUnprocessed.is_processed());
    /// ```
    pub fn is_processed(&self) -> bool {
        matches!(self, DeliveryOutcome::Voice | DeliveryOutcome::AudioAttachment)
    }

    /// A short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Voice => "voice",
            DeliveryOutcome::VoiceUnprocessed => "voice (unprocessed)",
            DeliveryOutcome::AudioAttachment => "audio attachment",
            DeliveryOutcome::AudioAttachmentUnprocessed => "audio attachment (unprocessed)",
        }
    }
}
