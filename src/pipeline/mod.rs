//! Interaction orchestration — one user message in, one audio message out.
//!
//! # Architecture
//!
//! ```text
//! UserProfile + text
//!        │
//!        ▼
//! ConversionOrchestrator::convert_and_send()
//!        │
//!        ├─ NoiseSelector::select(tag)          → Option<NoiseSelection>
//!        ├─ TextEnhancer::enhance (optional)
//!        ├─ SpeechSynthesizer::synthesize       → raw MP3
//!        ├─ PipelineExecutor::run(TelegramVoice) → Ogg/Opus | raw
//!        └─ DeliveryClient::send_voice
//!              └─ VoiceForbidden → PipelineExecutor::run(Mp3Audio) → send_audio
//! ```

pub mod runner;
pub mod state;

pub use crate::delivery::ChatTarget;
pub use runner::{ConversionOrchestrator, RelayError};
pub use state::{DeliveryOutcome, UserProfile};
