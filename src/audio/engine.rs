//! Signal-processing engine seam and the ffmpeg subprocess implementation.
//!
//! [`AudioEngine`] is what the executor talks to.  [`FfmpegEngine`] is the
//! production backend: one child process per call, voice bytes on stdin,
//! encoded result on stdout, diagnostics on stderr.

use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

use super::executor::PipelineError;
use super::filter::FilterGraph;
use super::profile::EncodingSpec;
use super::validate::ValidatedPath;

/// Format of the voice stream fed on stdin.  The synthesis API always
/// returns MPEG layer 3.
pub const VOICE_INPUT_FORMAT: &str = "mp3";

/// Stderr lines kept for the failure message.
const STDERR_TAIL_LINES: usize = 8;

// ---------------------------------------------------------------------------
// EngineInvocation
// ---------------------------------------------------------------------------

/// Everything one engine call needs, in structured form.
#[derive(Debug, Clone)]
pub struct EngineInvocation {
    /// Encoded voice audio, streamed on stdin.
    pub voice: Bytes,
    /// Declared container of `voice`.
    pub voice_format: &'static str,
    /// Noise clip looped under the voice, when mixing.
    pub noise: Option<ValidatedPath>,
    pub filter: FilterGraph,
    pub encoding: EncodingSpec,
}

impl EngineInvocation {
    /// ffmpeg argv (without the program name).
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            self.voice_format.into(),
            "-i".into(),
            "pipe:0".into(),
        ];

        if let Some(noise) = &self.noise {
            args.push("-stream_loop".to_string());
            args.push("-1".to_string());
            args.push("-i".to_string());
            args.push(noise.as_str().to_string());
        }

        args.extend(self.filter.to_args());
        args.extend(self.encoding.to_args());
        args.push("pipe:1".into());
        args
    }
}

// ---------------------------------------------------------------------------
// AudioEngine trait
// ---------------------------------------------------------------------------

/// Runs one invocation to completion and returns whatever bytes it produced.
///
/// Implementors report engine-level failures as
/// [`PipelineError::EngineFailure`]; emptiness of the result is judged by
/// the executor.
#[async_trait]
pub trait AudioEngine: Send + Sync {
    async fn process(&self, invocation: EngineInvocation) -> Result<Vec<u8>, PipelineError>;
}

// ---------------------------------------------------------------------------
// FfmpegEngine
// ---------------------------------------------------------------------------

/// Drives an `ffmpeg` executable.
///
/// The child is started with `kill_on_drop`, so dropping the future of
/// [`process`](AudioEngine::process) terminates the subprocess.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    program: String,
}

impl FfmpegEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl AudioEngine for FfmpegEngine {
    async fn process(&self, invocation: EngineInvocation) -> Result<Vec<u8>, PipelineError> {
        let args = invocation.to_ffmpeg_args();
        log::debug!("ffmpeg: {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PipelineError::EngineFailure(format!("failed to spawn {}: {e}", self.program)))?;

        let (Some(mut stdin), Some(mut stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(PipelineError::EngineFailure("ffmpeg pipes unavailable".into()));
        };

        // stdin, stdout and stderr are driven together; writing the whole
        // input before reading would deadlock once the stdout pipe fills.
        let voice = invocation.voice;
        let feed = async move {
            let result = stdin.write_all(&voice).await;
            // Dropping stdin closes the pipe and signals EOF.
            drop(stdin);
            result
        };

        let collect = async move {
            let mut output = Vec::new();
            let mut chunk = [0u8; 16 * 1024];
            loop {
                let n = stdout.read(&mut chunk).await?;
                if n == 0 {
                    break;
                }
                output.extend_from_slice(&chunk[..n]);
            }
            Ok::<_, std::io::Error>(output)
        };

        let diagnostics = async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut tail: Vec<String> = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                log::debug!("[ffmpeg] {line}");
                if tail.len() == STDERR_TAIL_LINES {
                    tail.remove(0);
                }
                tail.push(line);
            }
            tail
        };

        let (fed, collected, tail) = tokio::join!(feed, collect, diagnostics);

        let status = child
            .wait()
            .await
            .map_err(|e| PipelineError::EngineFailure(format!("failed to wait for ffmpeg: {e}")))?;

        if !status.success() {
            return Err(PipelineError::EngineFailure(format!(
                "ffmpeg exited with {status}: {}",
                tail.join(" | ")
            )));
        }

        // A broken stdin pipe only matters if ffmpeg itself did not fail.
        if let Err(e) = fed {
            log::warn!("ffmpeg: writing input failed: {e}");
        }

        collected.map_err(|e| PipelineError::EngineFailure(format!("reading ffmpeg output: {e}")))
    }
}

/// Returns `true` when `program -version` runs successfully.
pub async fn is_ffmpeg_available(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
