//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings + noise and voice catalogs):
//!   Windows: %APPDATA%\voice-relay\
//!   macOS:   ~/Library/Application Support/voice-relay/
//!   Linux:   ~/.config/voice-relay/
//!
//! Data dir (noise clips):
//!   Windows: %LOCALAPPDATA%\voice-relay\noises\
//!   macOS:   ~/Library/Application Support/voice-relay/noises/
//!   Linux:   ~/.local/share/voice-relay/noises/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`, `noises.json` and `voices.json`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Full path to the JSON noise catalog.
    pub noise_catalog_file: PathBuf,
    /// Full path to the JSON voice catalog.
    pub voice_catalog_file: PathBuf,
    /// Root directory holding the noise clip files.
    pub noise_asset_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "voice-relay";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (containers without a home directory, mostly).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let noise_catalog_file = config_dir.join("noises.json");
        let voice_catalog_file = config_dir.join("voices.json");
        let noise_asset_dir = data_dir.join("noises");

        Self {
            config_dir,
            settings_file,
            noise_catalog_file,
            voice_catalog_file,
            noise_asset_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
