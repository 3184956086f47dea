//! Audio pipeline executor — EQ, optional noise mix, encode.
//!
//! [`PipelineExecutor::run`] turns one synthesized MP3 buffer into the
//! requested [`OutputProfile`].  Noise is best effort: a path that fails
//! [`validate`] or a volume that does not parse silently degrades the run
//! instead of failing it.  A run that ends with zero output bytes is an
//! error even when the engine reported success.
//!
//! At most `max_concurrent_runs` engine calls are in flight at once; extra
//! callers wait for a permit.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::{AppConfig, EqualizerConfig, NoiseConfig, PipelineConfig};

use super::engine::{AudioEngine, EngineInvocation, VOICE_INPUT_FORMAT};
use super::filter::{effective_volume, FilterGraph};
use super::profile::OutputProfile;
use super::validate::validate;

/// Encoded audio.  Cheap to clone, never mutated.
pub type AudioBuffer = Bytes;

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Failures of a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The engine finished but produced no bytes.
    #[error("audio engine produced an empty result")]
    EmptyOutput,

    /// The engine could not be started or reported an error.
    #[error("audio engine failed: {0}")]
    EngineFailure(String),

    /// The run exceeded its time budget and the subprocess was killed.
    #[error("audio engine timed out after {0:?}")]
    Timeout(Duration),
}

// ---------------------------------------------------------------------------
// PipelineRequest
// ---------------------------------------------------------------------------

/// Input of one run.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub voice_audio: AudioBuffer,
    /// Candidate noise clip; validated again at run time.
    pub noise_path: Option<PathBuf>,
    /// Raw volume string from the catalog.
    pub noise_volume: Option<String>,
    pub output_profile: OutputProfile,
}

impl PipelineRequest {
    pub fn new(voice_audio: AudioBuffer, output_profile: OutputProfile) -> Self {
        Self {
            voice_audio,
            noise_path: None,
            noise_volume: None,
            output_profile,
        }
    }

    pub fn with_noise(mut self, path: impl Into<PathBuf>, volume: Option<String>) -> Self {
        self.noise_path = Some(path.into());
        self.noise_volume = volume;
        self
    }
}

// ---------------------------------------------------------------------------
// PipelineExecutor
// ---------------------------------------------------------------------------

/// Builds engine invocations and runs them under a concurrency limit.
pub struct PipelineExecutor {
    engine: Arc<dyn AudioEngine>,
    pipeline: PipelineConfig,
    equalizer: EqualizerConfig,
    noise: NoiseConfig,
    permits: Semaphore,
    next_run_id: AtomicU64,
}

impl PipelineExecutor {
    pub fn new(
        engine: Arc<dyn AudioEngine>,
        pipeline: PipelineConfig,
        equalizer: EqualizerConfig,
        noise: NoiseConfig,
    ) -> Self {
        let permits = Semaphore::new(pipeline.max_concurrent_runs.max(1));
        Self {
            engine,
            pipeline,
            equalizer,
            noise,
            permits,
            next_run_id: AtomicU64::new(1),
        }
    }

    pub fn from_config(engine: Arc<dyn AudioEngine>, config: &AppConfig) -> Self {
        Self::new(
            engine,
            config.pipeline.clone(),
            config.equalizer.clone(),
            config.noise.clone(),
        )
    }

    /// Build the engine invocation for `request`, downgrading to the
    /// voice-only graph when the noise path does not validate.
    pub async fn plan(&self, request: &PipelineRequest) -> EngineInvocation {
        let noise = match &request.noise_path {
            Some(path) => match validate(path).await {
                Ok(validated) => Some(validated),
                Err(rejected) => {
                    log::warn!("pipeline: noise disabled for this run ({rejected})");
                    None
                }
            },
            None => None,
        };

        let filter = match &noise {
            Some(_) => {
                let volume = effective_volume(request.noise_volume.as_deref(), &self.noise);
                FilterGraph::with_noise(&self.equalizer, volume, self.noise.dropout_transition_secs)
            }
            None => FilterGraph::voice_only(&self.equalizer),
        };

        EngineInvocation {
            voice: request.voice_audio.clone(),
            voice_format: VOICE_INPUT_FORMAT,
            noise,
            filter,
            encoding: request.output_profile.encoding(&self.pipeline),
        }
    }

    /// Run one conversion.  No retries happen here.
    pub async fn run(&self, request: &PipelineRequest) -> Result<AudioBuffer, PipelineError> {
        let run_id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let invocation = self.plan(request).await;
        let mixed = invocation.filter.is_mix();

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PipelineError::EngineFailure("executor is shut down".into()))?;

        log::debug!(
            "pipeline run {run_id}: streaming {} bytes → {:?} (noise mix: {mixed})",
            request.voice_audio.len(),
            request.output_profile
        );

        let budget = Duration::from_secs(self.pipeline.timeout_secs);
        let output = match tokio::time::timeout(budget, self.engine.process(invocation)).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout(budget)),
        };

        match output {
            Ok(bytes) if bytes.is_empty() => {
                log::warn!("pipeline run {run_id}: engine returned an empty buffer");
                Err(PipelineError::EmptyOutput)
            }
            Ok(bytes) => {
                log::debug!("pipeline run {run_id}: complete, {} bytes", bytes.len());
                Ok(Bytes::from(bytes))
            }
            Err(e) => {
                log::warn!("pipeline run {run_id}: failed: {e}");
                Err(e)
            }
        }
    }

    /// Number of runs that could start right now without waiting.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
