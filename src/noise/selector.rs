//! Picks a noise clip for a tag, healing the catalog on the way.
//!
//! For every record carrying the tag the selector stats the backing file.
//! Records whose file is gone are deleted; records with an unsafe
//! `fileName` are skipped (the maintenance pass deletes those).  One of the
//! surviving candidates is picked uniformly at random.

use std::path::PathBuf;
use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::config::NoiseConfig;
use crate::audio::is_safe_file_name;

use super::record::NoiseRecord;
use super::repository::{NoiseRepository, RepositoryError};

/// A usable noise clip.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseSelection {
    pub record_id: String,
    pub name: String,
    /// Absolute path below the asset root.
    pub path: PathBuf,
    /// Raw volume string; range checks happen in the executor.
    pub volume: String,
}

pub struct NoiseSelector {
    repository: Arc<dyn NoiseRepository>,
    asset_dir: PathBuf,
    default_volume: String,
}

impl NoiseSelector {
    pub fn new(
        repository: Arc<dyn NoiseRepository>,
        asset_dir: impl Into<PathBuf>,
        default_volume: f64,
    ) -> Self {
        Self {
            repository,
            asset_dir: asset_dir.into(),
            default_volume: default_volume.to_string(),
        }
    }

    pub fn from_config(repository: Arc<dyn NoiseRepository>, config: &NoiseConfig) -> Self {
        Self::new(repository, config.resolved_asset_dir(), config.default_volume)
    }

    /// Choose a clip for `tag`.
    ///
    /// `None`/blank tag means no noise was requested.  `Ok(None)` is also
    /// returned when no candidate survives the file checks.
    pub async fn select(&self, tag: Option<&str>) -> Result<Option<NoiseSelection>, RepositoryError> {
        let Some(tag) = tag.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let records = self.repository.find_by_tag(&tag).await?;
        let mut candidates: Vec<NoiseSelection> = Vec::with_capacity(records.len());

        for record in records {
            if let Some(selection) = self.check_candidate(record).await {
                candidates.push(selection);
            }
        }

        if candidates.is_empty() {
            log::debug!("noise: no usable clip for tag {tag:?}");
            return Ok(None);
        }

        let picked = candidates.choose(&mut rand::thread_rng()).cloned();
        if let Some(p) = &picked {
            log::debug!(
                "noise: picked {:?} for tag {tag:?} from {} candidates",
                p.name,
                candidates.len()
            );
        }
        Ok(picked)
    }

    async fn check_candidate(&self, record: NoiseRecord) -> Option<NoiseSelection> {
        if !is_safe_file_name(&record.file_name) {
            log::warn!(
                "noise: skipping record {} with unsafe file name {:?}",
                record.id,
                record.file_name
            );
            return None;
        }

        let path = self.asset_dir.join(&record.file_name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(NoiseSelection {
                volume: record
                    .volume
                    .clone()
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| self.default_volume.clone()),
                record_id: record.id,
                name: record.name,
                path,
            }),
            Ok(_) => {
                log::warn!("noise: {} is not a regular file, skipping", path.display());
                None
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "noise: file {} for record {} is missing, deleting record",
                    path.display(),
                    record.id
                );
                if let Err(e) = self.repository.delete_by_id(&record.id).await {
                    log::warn!("noise: could not delete stale record {}: {e}", record.id);
                }
                None
            }
            Err(e) => {
                log::warn!("noise: cannot stat {}: {e}", path.display());
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
