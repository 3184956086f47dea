//! Path gate for anything handed to the audio engine.
//!
//! A noise path only reaches the ffmpeg command line as a [`ValidatedPath`],
//! and the only way to obtain one is [`validate`].  The same filename rules
//! back the catalog maintenance pass in [`crate::noise::maintenance`].

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Substrings that never appear in a legitimate noise path.
pub const FORBIDDEN_TOKENS: &[&str] = &[
    "(", ")", ";", "|", "&", "$", "`", "<", ">", "\n", "\r", "wget", "curl", "chmod", "busybox",
];

static SAFE_FILE_NAME: Lazy<Regex> = Lazy::new(|| {
    // Anchored: the whole basename must consist of these characters.
    Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("static regex")
});

// ---------------------------------------------------------------------------
// ValidationRejected
// ---------------------------------------------------------------------------

/// Why a path was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationRejected {
    #[error("path is empty")]
    Empty,

    #[error("path is not valid UTF-8")]
    NotUtf8,

    #[error("path contains forbidden token {0:?}")]
    ForbiddenToken(&'static str),

    #[error("file name {0:?} contains characters outside [a-zA-Z0-9_.-]")]
    UnsafeFileName(String),

    #[error("path does not point to an existing regular file: {0}")]
    NotAFile(String),
}

// ---------------------------------------------------------------------------
// ValidatedPath
// ---------------------------------------------------------------------------

/// A path that passed [`validate`].  Not persisted; recomputed per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath(PathBuf);

impl ValidatedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// The path as UTF-8 text.  Always succeeds: validation rejects
    /// non-UTF-8 paths.
    pub fn as_str(&self) -> &str {
        self.0.to_str().unwrap_or_default()
    }
}

impl AsRef<Path> for ValidatedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// First forbidden token found in `text`, if any.
pub fn find_forbidden_token(text: &str) -> Option<&'static str> {
    FORBIDDEN_TOKENS.iter().copied().find(|t| text.contains(t))
}

/// Returns `true` when `name` is a bare file name made only of
/// `[a-zA-Z0-9_.-]`, contains no forbidden token, and is not `.`/`..`.
pub fn is_safe_file_name(name: &str) -> bool {
    SAFE_FILE_NAME.is_match(name)
        && find_forbidden_token(name).is_none()
        && !name.chars().all(|c| c == '.')
}

/// Check `path` and wrap it as a [`ValidatedPath`].
///
/// Rejects empty or non-UTF-8 paths, any forbidden token anywhere in the
/// path, a basename outside `[a-zA-Z0-9_.-]+`, and anything that does not
/// resolve (following symlinks) to an existing regular file.
pub async fn validate(path: impl AsRef<Path>) -> Result<ValidatedPath, ValidationRejected> {
    let path = path.as_ref();
    let text = path.to_str().ok_or(ValidationRejected::NotUtf8)?;

    if text.is_empty() {
        return Err(ValidationRejected::Empty);
    }
    if let Some(token) = find_forbidden_token(text) {
        return Err(ValidationRejected::ForbiddenToken(token));
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ValidationRejected::UnsafeFileName(String::new()))?;
    if !SAFE_FILE_NAME.is_match(file_name) {
        return Err(ValidationRejected::UnsafeFileName(file_name.to_string()));
    }

    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(ValidatedPath(path.to_path_buf())),
        _ => Err(ValidationRejected::NotAFile(text.to_string())),
    }
}

/// Boolean form of [`validate`].
pub async fn is_valid(path: impl AsRef<Path>) -> bool {
    validate(path).await.is_ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
