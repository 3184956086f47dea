//! Text-to-speech — the source of every voice buffer the pipeline processes.
//!
//! * [`SpeechSynthesizer`] / [`HttpSynthesizer`] — turn text into MP3.
//! * [`VoiceRepository`] — per-voice synthesis parameters keyed by voice id.

pub mod synthesizer;
pub mod voices;

pub use synthesizer::{HttpSynthesizer, SpeechSynthesizer, SynthesisError, VoiceProfile};
pub use voices::{
    InMemoryVoiceRepository, JsonVoiceRepository, VoiceCatalogError, VoiceRepository,
};
