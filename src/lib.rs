//! Voice relay: turns chat text into a post-processed voice message.
//!
//! ```text
//! text ─▶ llm (optional) ─▶ tts ─▶ audio pipeline (EQ, noise) ─▶ delivery
//!                                   ▲
//!                         noise catalog (tag → clip)
//! ```

pub mod audio;
pub mod config;
pub mod delivery;
pub mod llm;
pub mod noise;
pub mod pipeline;
pub mod tts;
