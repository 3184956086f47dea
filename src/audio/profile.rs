//! Output profiles and their codec/container settings.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;

/// Target format of a pipeline run.
///
/// | profile       | container | codec      | channels | extra          |
/// |---------------|-----------|------------|----------|----------------|
/// | TelegramVoice | Ogg       | libopus    | 1        | `-application voip` |
/// | Mp3Audio      | MP3       | libmp3lame | 1        | —              |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputProfile {
    /// Opus-in-Ogg, accepted by the platform as a voice message.
    TelegramVoice,
    /// Plain MP3, sent as a generic audio attachment.
    Mp3Audio,
}

impl OutputProfile {
    /// ffmpeg muxer name (`-f`).
    pub fn container(self) -> &'static str {
        match self {
            OutputProfile::TelegramVoice => "ogg",
            OutputProfile::Mp3Audio => "mp3",
        }
    }

    /// ffmpeg encoder name (`-c:a`).
    pub fn codec(self) -> &'static str {
        match self {
            OutputProfile::TelegramVoice => "libopus",
            OutputProfile::Mp3Audio => "libmp3lame",
        }
    }

    /// File name used for the uploaded attachment.
    pub fn file_name(self) -> &'static str {
        match self {
            OutputProfile::TelegramVoice => "voice.ogg",
            OutputProfile::Mp3Audio => "voice.mp3",
        }
    }

    /// MIME type of the encoded result.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputProfile::TelegramVoice => "audio/ogg",
            OutputProfile::Mp3Audio => "audio/mpeg",
        }
    }

    /// Fully resolved encoder settings for this profile.
    pub fn encoding(self, config: &PipelineConfig) -> EncodingSpec {
        let (bitrate_kbps, extra) = match self {
            OutputProfile::TelegramVoice => (
                config.effective_opus_kbps(),
                vec!["-application".to_string(), "voip".to_string()],
            ),
            OutputProfile::Mp3Audio => (config.mp3_bitrate_kbps, Vec::new()),
        };

        EncodingSpec {
            container: self.container(),
            codec: self.codec(),
            channels: 1,
            sample_rate: config.sample_rate,
            bitrate_kbps,
            extra,
        }
    }
}

/// Output side of an engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingSpec {
    pub container: &'static str,
    pub codec: &'static str,
    pub channels: u8,
    pub sample_rate: u32,
    pub bitrate_kbps: u32,
    /// Encoder-specific options appended verbatim.
    pub extra: Vec<String>,
}

impl EncodingSpec {
    /// ffmpeg output arguments, excluding the output target itself.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:a".to_string(),
            self.codec.to_string(),
            "-ac".to_string(),
            self.channels.to_string(),
            "-ar".to_string(),
            self.sample_rate.to_string(),
            "-b:a".to_string(),
            format!("{}k", self.bitrate_kbps),
        ];
        args.extend(self.extra.iter().cloned());
        args.push("-f".to_string());
        args.push(self.container.to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_profile_is_mono_opus_24k_voip() {
        let spec = OutputProfile::TelegramVoice.encoding(&PipelineConfig::default());
        assert_eq!(spec.container, "ogg");
        assert_eq!(spec.codec, "libopus");
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 24_000);
        assert_eq!(spec.bitrate_kbps, 24);
        assert_eq!(spec.extra, vec!["-application", "voip"]);
    }

    #[test]
    fn mp3_profile_is_mono_lame_64k() {
        let spec = OutputProfile::Mp3Audio.encoding(&PipelineConfig::default());
        assert_eq!(spec.container, "mp3");
        assert_eq!(spec.codec, "libmp3lame");
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bitrate_kbps, 64);
        assert!(spec.extra.is_empty());
    }

    #[test]
    fn args_end_with_container() {
        let args = OutputProfile::Mp3Audio
            .encoding(&PipelineConfig::default())
            .to_args();
        assert_eq!(&args[args.len() - 2..], ["-f", "mp3"]);
        assert!(args.windows(2).any(|w| w == ["-b:a", "64k"]));
    }
}
