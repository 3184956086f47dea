//! Conversion orchestrator — text → speech → post-processing → delivery.
//!
//! [`ConversionOrchestrator::convert_and_send`] runs one interaction.
//!
//! # Flow
//!
//! ```text
//! text ─▶ [enhance] ─▶ synthesize (MP3) ─▶ pipeline(TelegramVoice)
//!                                           ├─ Ok  ─▶ sendVoice(ogg)
//!                                           └─ Err ─▶ sendVoice(raw mp3)
//! sendVoice
//!   ├─ Ok                      ─▶ done
//!   ├─ VoiceForbidden          ─▶ pipeline(Mp3Audio) on the same raw audio + noise
//!   │                               ├─ Ok  ─▶ sendAudio(mp3, caption)
//!   │                               └─ Err ─▶ sendAudio(raw mp3, caption)
//!   └─ Other                   ─▶ notify user, error
//! ```
//!
//! There is exactly one fallback transition and no retry loop.  Any error
//! that ends the interaction sends the configured failure message to the
//! chat before it is returned.

use std::sync::Arc;

use thiserror::Error;

use crate::audio::{AudioBuffer, OutputProfile, PipelineExecutor, PipelineRequest};
use crate::config::AppConfig;
use crate::delivery::{ChatTarget, DeliveryClient, DeliveryError};
use crate::llm::TextEnhancer;
use crate::noise::{NoiseSelection, NoiseSelector};
use crate::tts::{SpeechSynthesizer, SynthesisError, VoiceProfile, VoiceRepository};

use super::state::{DeliveryOutcome, UserProfile};

// ---------------------------------------------------------------------------
// RelayError
// ---------------------------------------------------------------------------

/// Terminal failures of one interaction.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Nothing to say.
    #[error("message text is empty")]
    EmptyText,

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

// ---------------------------------------------------------------------------
// ConversionOrchestrator
// ---------------------------------------------------------------------------

pub struct ConversionOrchestrator {
    selector: NoiseSelector,
    voices: Arc<dyn VoiceRepository>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    enhancer: Option<Arc<dyn TextEnhancer>>,
    executor: Arc<PipelineExecutor>,
    delivery: Arc<dyn DeliveryClient>,
    default_voice_id: String,
    fallback_caption: String,
    failure_message: String,
}

impl ConversionOrchestrator {
    pub fn new(
        selector: NoiseSelector,
        voices: Arc<dyn VoiceRepository>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        executor: Arc<PipelineExecutor>,
        delivery: Arc<dyn DeliveryClient>,
        config: &AppConfig,
    ) -> Self {
        Self {
            selector,
            voices,
            synthesizer,
            enhancer: None,
            executor,
            delivery,
            default_voice_id: config.tts.default_voice_id.clone(),
            fallback_caption: config.delivery.fallback_caption.clone(),
            failure_message: config.delivery.failure_message.clone(),
        }
    }

    /// Rewrite text through `enhancer` before synthesis.
    pub fn with_enhancer(mut self, enhancer: Arc<dyn TextEnhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    /// Run one interaction end to end.
    pub async fn convert_and_send(
        &self,
        text: &str,
        user: &UserProfile,
        chat: &ChatTarget,
    ) -> Result<DeliveryOutcome, RelayError> {
        match self.relay(text, user, chat).await {
            Ok(outcome) => {
                log::info!("relay: {} delivered to {chat} as {}", user.user, outcome.label());
                Ok(outcome)
            }
            Err(e) => {
                log::error!("relay: interaction for {} failed: {e}", user.user);
                self.notify_failure(chat).await;
                Err(e)
            }
        }
    }

    async fn relay(
        &self,
        text: &str,
        user: &UserProfile,
        chat: &ChatTarget,
    ) -> Result<DeliveryOutcome, RelayError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RelayError::EmptyText);
        }

        // ── 1. Noise + voice ─────────────────────────────────────────────
        let noise = match self.selector.select(user.noise_tag.as_deref()).await {
            Ok(selection) => selection,
            Err(e) => {
                log::warn!("relay: noise lookup failed ({e}), continuing without noise");
                None
            }
        };
        let voice = self.resolve_voice(user).await;

        // ── 2. Synthesis ─────────────────────────────────────────────────
        let script = match &self.enhancer {
            Some(enhancer) => enhancer.enhance(text).await.unwrap_or_else(|e| {
                log::warn!("relay: text enhancement failed ({e}), using original text");
                text.to_string()
            }),
            None => text.to_string(),
        };
        let raw = self.synthesizer.synthesize(&script, &voice).await?;

        // ── 3. Voice pipeline ────────────────────────────────────────────
        let (payload, file_name, processed) = match self
            .executor
            .run(&request(&raw, noise.as_ref(), OutputProfile::TelegramVoice))
            .await
        {
            Ok(ogg) => (ogg, OutputProfile::TelegramVoice.file_name(), true),
            Err(e) => {
                log::warn!("relay: voice pipeline failed ({e}), sending unprocessed audio");
                (raw.clone(), OutputProfile::Mp3Audio.file_name(), false)
            }
        };

        // ── 4. Delivery with the single format fallback ─────────────────
        match self.delivery.send_voice(chat, payload, file_name).await {
            Ok(()) if processed => Ok(DeliveryOutcome::Voice),
            Ok(()) => Ok(DeliveryOutcome::VoiceUnprocessed),
            Err(DeliveryError::VoiceForbidden) => {
                log::warn!("relay: {chat} does not accept voice messages, re-encoding as MP3");
                self.send_as_attachment(raw, noise.as_ref(), chat).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stored profile of the user's voice, or default parameters when the
    /// voice is not catalogued.
    async fn resolve_voice(&self, user: &UserProfile) -> VoiceProfile {
        let voice_id = user.selected_voice.as_deref().unwrap_or(&self.default_voice_id);
        match self.voices.find_voice(voice_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                log::debug!("relay: voice {voice_id} not catalogued, using default parameters");
                VoiceProfile::with_id(voice_id)
            }
            Err(e) => {
                log::warn!("relay: voice lookup failed ({e}), using default parameters");
                VoiceProfile::with_id(voice_id)
            }
        }
    }

    async fn send_as_attachment(
        &self,
        raw: AudioBuffer,
        noise: Option<&NoiseSelection>,
        chat: &ChatTarget,
    ) -> Result<DeliveryOutcome, RelayError> {
        let (payload, outcome) = match self
            .executor
            .run(&request(&raw, noise, OutputProfile::Mp3Audio))
            .await
        {
            Ok(mp3) => (mp3, DeliveryOutcome::AudioAttachment),
            Err(e) => {
                log::warn!("relay: MP3 pipeline failed ({e}), sending unprocessed audio");
                (raw, DeliveryOutcome::AudioAttachmentUnprocessed)
            }
        };

        self.delivery
            .send_audio(
                chat,
                payload,
                OutputProfile::Mp3Audio.file_name(),
                &self.fallback_caption,
            )
            .await?;
        Ok(outcome)
    }

    async fn notify_failure(&self, chat: &ChatTarget) {
        if let Err(e) = self.delivery.send_text(chat, &self.failure_message).await {
            log::error!("relay: could not notify {chat} about the failure: {e}");
        }
    }
}

fn request(raw: &AudioBuffer, noise: Option<&NoiseSelection>, profile: OutputProfile) -> PipelineRequest {
    let req = PipelineRequest::new(raw.clone(), profile);
    match noise {
        Some(n) => req.with_noise(n.path.clone(), Some(n.volume.clone())),
        None => req,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
