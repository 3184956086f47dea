//! Message delivery to the chat platform.
//!
//! [`DeliveryClient`] is the seam the orchestrator uses; [`TelegramClient`]
//! talks to the Bot API.  [`DeliveryError::VoiceForbidden`] is the one
//! failure the orchestrator recovers from.

pub mod client;
pub mod telegram;

pub use client::{ChatTarget, DeliveryClient, DeliveryError, VOICE_FORBIDDEN_MARKER};
pub use telegram::TelegramClient;
