//! Audio post-processing — path gate → filter graph → ffmpeg → encoded buffer.
//!
//! # Pipeline
//!
//! ```text
//! synthesized MP3 ─┐
//!                  ├─ validate(noise path) ─ FilterGraph (EQ | EQ + noise mix)
//! noise clip ──────┘        │
//!                           ▼
//!              PipelineExecutor::run ── Semaphore ── AudioEngine (ffmpeg)
//!                           │
//!                           ▼
//!              Ogg/Opus voice  or  MP3 attachment
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use voice_relay::audio::{FfmpegEngine, OutputProfile, PipelineExecutor, PipelineRequest};
//! use voice_relay::config::AppConfig;
//!
//! # async fn example(mp3: bytes::Bytes) {
//! let config = AppConfig::default();
//! let engine = Arc::new(FfmpegEngine::new(config.pipeline.ffmpeg_path.clone()));
//! let executor = PipelineExecutor::from_config(engine, &config);
//!
//! let request = PipelineRequest::new(mp3, OutputProfile::TelegramVoice);
//! let ogg = executor.run(&request).await.unwrap();
//! println!("{} bytes of Ogg/Opus", ogg.len());
//! # }
//! ```

pub mod engine;
pub mod executor;
pub mod filter;
pub mod profile;
pub mod validate;

pub use engine::{is_ffmpeg_available, AudioEngine, EngineInvocation, FfmpegEngine};
pub use executor::{AudioBuffer, PipelineError, PipelineExecutor, PipelineRequest};
pub use filter::{effective_volume, eq_chain, FilterGraph};
pub use profile::{EncodingSpec, OutputProfile};
pub use validate::{is_safe_file_name, is_valid, validate, ValidatedPath, ValidationRejected};
