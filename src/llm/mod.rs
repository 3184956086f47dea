//! Optional LLM rewrite of the user's text before synthesis.
//!
//! * [`TextEnhancer`] — async trait implemented by all enhancer backends.
//! * [`ApiEnhancer`] — OpenAI-compatible REST API enhancer.
//! * [`FallbackEnhancer`] — wraps any enhancer; returns the input on failure.
//! * [`LlmError`] — error variants for LLM operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voice_relay::config::AppConfig;
//! use voice_relay::llm::{ApiEnhancer, FallbackEnhancer, TextEnhancer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let enhancer = FallbackEnhancer::new(ApiEnhancer::from_config(&config.llm));
//!     let script = enhancer.enhance("hi how r u").await.unwrap();
//!     println!("{script}");
//! }
//! ```

pub mod enhancer;
pub mod fallback;

pub use enhancer::{ApiEnhancer, LlmError, TextEnhancer};
pub use fallback::FallbackEnhancer;
