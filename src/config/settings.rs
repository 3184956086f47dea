//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Settings for the ffmpeg-backed audio post-processing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// ffmpeg executable, either a bare name resolved via `PATH` or an
    /// absolute path (e.g. `/usr/bin/ffmpeg` in Alpine images).
    pub ffmpeg_path: String,
    /// Upper bound on ffmpeg subprocesses running at the same time.
    pub max_concurrent_runs: usize,
    /// Seconds a single run may take before the subprocess is killed.
    pub timeout_secs: u64,
    /// Output sample rate in Hz for both profiles.
    pub sample_rate: u32,
    /// Opus bitrate for voice messages; clamped to 24–64 kbit/s.
    pub opus_bitrate_kbps: u32,
    /// MP3 bitrate for the audio-attachment fallback.
    pub mp3_bitrate_kbps: u32,
}

impl PipelineConfig {
    pub const MIN_OPUS_KBPS: u32 = 24;
    pub const MAX_OPUS_KBPS: u32 = 64;

    /// Opus bitrate with the voice-message bounds applied.
    pub fn effective_opus_kbps(&self) -> u32 {
        self.opus_bitrate_kbps
            .clamp(Self::MIN_OPUS_KBPS, Self::MAX_OPUS_KBPS)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".into(),
            max_concurrent_runs: 4,
            timeout_secs: 60,
            sample_rate: 24_000,
            opus_bitrate_kbps: 24,
            mp3_bitrate_kbps: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// EqualizerConfig
// ---------------------------------------------------------------------------

/// Gains and corner frequencies of the fixed voice EQ chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualizerConfig {
    /// Low-shelf corner frequency in Hz.
    pub bass_freq_hz: f64,
    /// Low-shelf gain in dB.
    pub bass_gain_db: f64,
    /// Centre frequency of the parametric band in Hz.
    pub mid_freq_hz: f64,
    /// Width of the parametric band in octaves.
    pub mid_width_octaves: f64,
    /// Parametric band gain in dB.
    pub mid_gain_db: f64,
    /// High-shelf corner frequency in Hz.
    pub treble_freq_hz: f64,
    /// High-shelf gain in dB (negative attenuates).
    pub treble_gain_db: f64,
    /// Append a limiter so the bass boost does not clip.
    pub limiter: bool,
}

impl Default for EqualizerConfig {
    fn default() -> Self {
        Self {
            bass_freq_hz: 90.0,
            bass_gain_db: 12.7,
            mid_freq_hz: 1500.0,
            mid_width_octaves: 1.0,
            mid_gain_db: 5.9,
            treble_freq_hz: 8000.0,
            treble_gain_db: -8.2,
            limiter: true,
        }
    }
}

// ---------------------------------------------------------------------------
// NoiseConfig
// ---------------------------------------------------------------------------

/// Background-noise mixing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Directory holding noise clip files.  `None` means the platform data
    /// directory from [`AppPaths`].
    pub asset_dir: Option<PathBuf>,
    /// Mix volume used when a record has none or an unusable one.
    pub default_volume: f64,
    /// Largest accepted mix volume (inclusive).
    pub max_volume: f64,
    /// Dropout transition of the mix filter, in seconds.
    pub dropout_transition_secs: u32,
}

impl NoiseConfig {
    /// Resolved noise asset root.
    pub fn resolved_asset_dir(&self) -> PathBuf {
        self.asset_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().noise_asset_dir)
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            asset_dir: None,
            default_volume: 1.35,
            max_volume: 10.0,
            dropout_transition_secs: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-synthesis API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Base URL of the synthesis API.
    pub base_url: String,
    /// API key sent as `xi-api-key`.
    pub api_key: Option<String>,
    /// Synthesis model identifier.
    pub model_id: String,
    /// Voice used when the user has not picked one.
    pub default_voice_id: String,
    /// Maximum seconds to wait for a synthesis response.
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".into(),
            api_key: None,
            model_id: "eleven_multilingual_v2".into(),
            default_voice_id: "21m00Tcm4TlvDq8ikWAM".into(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the optional text-enhancement step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Whether text is rewritten before synthesis at all.
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// API key — `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token budget.
    pub max_tokens: u32,
    /// Maximum seconds to wait for an LLM response before timing out.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.75,
            max_tokens: 500,
            timeout_secs: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// DeliveryConfig
// ---------------------------------------------------------------------------

/// Settings for the chat-platform delivery client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Bot API base URL.
    pub api_base: String,
    /// Bot token; required for any delivery.
    pub bot_token: Option<String>,
    /// Maximum seconds to wait for an upload.
    pub timeout_secs: u64,
    /// Caption attached when a voice message is re-sent as an MP3 file.
    pub fallback_caption: String,
    /// Text shown to the user when an interaction cannot be completed.
    pub failure_message: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".into(),
            bot_token: None,
            timeout_secs: 30,
            fallback_caption:
                "Voice messages are disabled in your privacy settings, so here is an MP3 file instead."
                    .into(),
            failure_message: "Sorry, something went wrong while preparing your voice message."
                .into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_relay::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// ffmpeg pipeline settings.
    pub pipeline: PipelineConfig,
    /// Voice EQ chain.
    pub equalizer: EqualizerConfig,
    /// Noise mixing settings.
    pub noise: NoiseConfig,
    /// Speech synthesis API.
    pub tts: TtsConfig,
    /// Text enhancement API.
    pub llm: LlmConfig,
    /// Chat-platform delivery.
    pub delivery: DeliveryConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Fill secrets from `BOT_TOKEN`, `TTS_API_KEY` and `OPENAI_API_KEY`.
    ///
    /// Environment values win over the file so deployments can keep tokens
    /// out of `settings.toml`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("BOT_TOKEN") {
            self.delivery.bot_token = Some(token);
        }
        if let Some(key) = non_empty("TTS_API_KEY") {
            self.tts.api_key = Some(key);
        }
        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.pipeline.ffmpeg_path, default.pipeline.ffmpeg_path);
        assert_eq!(config.noise.default_volume, default.noise.default_volume);
        assert_eq!(config.tts.default_voice_id, default.tts.default_voice_id);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.pipeline.sample_rate, 24_000);
        assert_eq!(cfg.pipeline.opus_bitrate_kbps, 24);
        assert_eq!(cfg.pipeline.mp3_bitrate_kbps, 64);
        assert_eq!(cfg.pipeline.max_concurrent_runs, 4);
        assert_eq!(cfg.equalizer.bass_freq_hz, 90.0);
        assert_eq!(cfg.equalizer.mid_freq_hz, 1500.0);
        assert_eq!(cfg.equalizer.treble_freq_hz, 8000.0);
        assert_eq!(cfg.noise.default_volume, 1.35);
        assert_eq!(cfg.noise.max_volume, 10.0);
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert!(!cfg.llm.enabled);
        assert_eq!(cfg.delivery.api_base, "https://api.telegram.org");
        assert!(cfg.delivery.bot_token.is_none());
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.pipeline.ffmpeg_path = "/usr/bin/ffmpeg".into();
        cfg.pipeline.max_concurrent_runs = 2;
        cfg.equalizer.bass_gain_db = 3.5;
        cfg.noise.asset_dir = Some(PathBuf::from("/srv/noises"));
        cfg.noise.default_volume = 0.8;
        cfg.delivery.bot_token = Some("123:abc".into());
        cfg.llm.enabled = true;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.pipeline.ffmpeg_path, "/usr/bin/ffmpeg");
        assert_eq!(loaded.pipeline.max_concurrent_runs, 2);
        assert_eq!(loaded.equalizer.bass_gain_db, 3.5);
        assert_eq!(loaded.noise.asset_dir, Some(PathBuf::from("/srv/noises")));
        assert_eq!(loaded.noise.default_volume, 0.8);
        assert_eq!(loaded.delivery.bot_token.as_deref(), Some("123:abc"));
        assert!(loaded.llm.enabled);
    }

    /// A file that only sets one section keeps defaults everywhere else.
    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[pipeline]\nffmpeg_path = \"/opt/ffmpeg\"\n").unwrap();

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded.pipeline.ffmpeg_path, "/opt/ffmpeg");
        assert_eq!(loaded.pipeline.timeout_secs, 60);
        assert_eq!(loaded.noise.default_volume, 1.35);
    }

    #[test]
    fn opus_bitrate_is_clamped() {
        let mut p = PipelineConfig::default();
        p.opus_bitrate_kbps = 8;
        assert_eq!(p.effective_opus_kbps(), 24);
        p.opus_bitrate_kbps = 128;
        assert_eq!(p.effective_opus_kbps(), 64);
        p.opus_bitrate_kbps = 48;
        assert_eq!(p.effective_opus_kbps(), 48);
    }

    #[test]
    fn env_overrides_fill_secrets_and_skip_blank_values() {
        let mut cfg = AppConfig::default();
        cfg.tts.api_key = Some("from-file".into());

        cfg.apply_overrides_from(|key| match key {
            "BOT_TOKEN" => Some("42:token".into()),
            "TTS_API_KEY" => Some("   ".into()),
            _ => None,
        });

        assert_eq!(cfg.delivery.bot_token.as_deref(), Some("42:token"));
        assert_eq!(cfg.tts.api_key.as_deref(), Some("from-file"));
        assert!(cfg.llm.api_key.is_none());
    }
}
