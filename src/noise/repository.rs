//! Noise catalog storage.
//!
//! [`NoiseRepository`] is the seam the selector and maintenance code use.
//! Two stores implement it:
//!
//! * [`InMemoryNoiseRepository`] — process-local, used by tests and tooling.
//! * [`JsonNoiseRepository`] — same semantics, persisted to a JSON file after
//!   every mutation.
//!
//! `delete_by_id` is idempotent: deleting an id that is already gone returns
//! `Ok(false)`, never an error, so concurrent self-heal passes cannot trip
//! over each other.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use super::record::NoiseRecord;

// ---------------------------------------------------------------------------
// RepositoryError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A record with the same name already exists.
    #[error("noise named {0:?} already exists")]
    Duplicate(String),

    /// Reading or writing the backing file failed.
    #[error("catalog I/O failed: {0}")]
    Io(String),

    /// The backing file is not a valid catalog.
    #[error("catalog file is corrupt: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for RepositoryError {
    fn from(e: std::io::Error) -> Self {
        RepositoryError::Io(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// NoiseRepository trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait NoiseRepository: Send + Sync {
    /// Records whose tag list contains `tag` exactly, in catalog order.
    async fn find_by_tag(&self, tag: &str) -> Result<Vec<NoiseRecord>, RepositoryError>;

    /// Every record, in catalog order.
    async fn list(&self) -> Result<Vec<NoiseRecord>, RepositoryError>;

    /// Add a record; names are unique.
    async fn insert(&self, record: NoiseRecord) -> Result<(), RepositoryError>;

    /// Remove a record.  Returns whether something was removed.
    async fn delete_by_id(&self, id: &str) -> Result<bool, RepositoryError>;

    /// Replace a record's tags.  Returns whether the record exists.
    async fn set_tags(&self, id: &str, tags: Vec<String>) -> Result<bool, RepositoryError>;
}

// ---------------------------------------------------------------------------
// Catalog (shared by both stores)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct Catalog {
    records: Vec<NoiseRecord>,
}

impl Catalog {
    fn find_by_tag(&self, tag: &str) -> Vec<NoiseRecord> {
        self.records
            .iter()
            .filter(|r| r.has_tag(tag))
            .cloned()
            .collect()
    }

    fn insert(&mut self, record: NoiseRecord) -> Result<(), RepositoryError> {
        if self.records.iter().any(|r| r.name == record.name) {
            return Err(RepositoryError::Duplicate(record.name));
        }
        self.records.push(record);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }

    fn set_tags(&mut self, id: &str, tags: Vec<String>) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.tags = tags;
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// InMemoryNoiseRepository
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryNoiseRepository {
    catalog: Mutex<Catalog>,
}

impl InMemoryNoiseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<NoiseRecord>) -> Self {
        Self {
            catalog: Mutex::new(Catalog { records }),
        }
    }
}

#[async_trait]
impl NoiseRepository for InMemoryNoiseRepository {
    async fn find_by_tag(&self, tag: &str) -> Result<Vec<NoiseRecord>, RepositoryError> {
        Ok(self.catalog.lock().await.find_by_tag(tag))
    }

    async fn list(&self) -> Result<Vec<NoiseRecord>, RepositoryError> {
        Ok(self.catalog.lock().await.records.clone())
    }

    async fn insert(&self, record: NoiseRecord) -> Result<(), RepositoryError> {
        self.catalog.lock().await.insert(record)
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.catalog.lock().await.delete(id))
    }

    async fn set_tags(&self, id: &str, tags: Vec<String>) -> Result<bool, RepositoryError> {
        Ok(self.catalog.lock().await.set_tags(id, tags))
    }
}

// ---------------------------------------------------------------------------
// JsonNoiseRepository
// ---------------------------------------------------------------------------

/// Catalog persisted as a JSON array of [`NoiseRecord`]s.
///
/// Mutations are applied to a copy of the catalog, written out (temp file
/// + rename) while the lock is held, and only then become visible.  A
/// failed write leaves both the file and the in-memory catalog unchanged.
#[derive(Debug)]
pub struct JsonNoiseRepository {
    path: PathBuf,
    catalog: Mutex<Catalog>,
}

impl JsonNoiseRepository {
    /// Open the catalog at `path`; a missing file is an empty catalog.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(data) if data.trim().is_empty() => Vec::new(),
            Ok(data) => serde_json::from_str(&data)
                .map_err(|e| RepositoryError::Corrupt(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        log::debug!("noise catalog: loaded {} records from {}", records.len(), path.display());

        Ok(Self {
            path,
            catalog: Mutex::new(Catalog { records }),
        })
    }

    async fn persist(&self, catalog: &Catalog) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&catalog.records)
            .map_err(|e| RepositoryError::Io(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl NoiseRepository for JsonNoiseRepository {
    async fn find_by_tag(&self, tag: &str) -> Result<Vec<NoiseRecord>, RepositoryError> {
        Ok(self.catalog.lock().await.find_by_tag(tag))
    }

    async fn list(&self) -> Result<Vec<NoiseRecord>, RepositoryError> {
        Ok(self.catalog.lock().await.records.clone())
    }

    async fn insert(&self, record: NoiseRecord) -> Result<(), RepositoryError> {
        let mut catalog = self.catalog.lock().await;
        let mut next = catalog.clone();
        next.insert(record)?;
        self.persist(&next).await?;
        *catalog = next;
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, RepositoryError> {
        let mut catalog = self.catalog.lock().await;
        let mut next = catalog.clone();
        if !next.delete(id) {
            return Ok(false);
        }
        self.persist(&next).await?;
        *catalog = next;
        Ok(true)
    }

    async fn set_tags(&self, id: &str, tags: Vec<String>) -> Result<bool, RepositoryError> {
        let mut catalog = self.catalog.lock().await;
        let mut next = catalog.clone();
        if !next.set_tags(id, tags) {
            return Ok(false);
        }
        self.persist(&next).await?;
        *catalog = next;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(name: &str, tags: &[&str]) -> NoiseRecord {
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        NoiseRecord::new(name, format!("noise_{name}.ogg"), &tags, None)
    }

    #[tokio::test]
    async fn find_by_tag_is_exact_match() {
        let repo = InMemoryNoiseRepository::with_records(vec![
            record("a", &["rain"]),
            record("b", &["rainforest"]),
            record("c", &["rain", "night"]),
        ]);
        let names: Vec<String> = repo
            .find_by_tag("rain")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let r = record("a", &["rain"]);
        let id = r.id.clone();
        let repo = InMemoryNoiseRepository::with_records(vec![r]);

        assert!(repo.delete_by_id(&id).await.unwrap());
        assert!(!repo.delete_by_id(&id).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let repo = InMemoryNoiseRepository::new();
        repo.insert(record("rain", &[])).await.unwrap();
        let err = repo.insert(record("rain", &[])).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));
    }

    #[tokio::test]
    async fn json_store_persists_mutations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog").join("noises.json");

        let keep = record("keep", &["rain"]);
        let drop_me = record("drop", &["rain"]);
        let drop_id = drop_me.id.clone();
        let keep_id = keep.id.clone();
        {
            let repo = JsonNoiseRepository::open(&path).await.unwrap();
            repo.insert(keep).await.unwrap();
            repo.insert(drop_me).await.unwrap();
            repo.delete_by_id(&drop_id).await.unwrap();
            repo.set_tags(&keep_id, vec!["storm".into()]).await.unwrap();
        }

        let reopened = JsonNoiseRepository::open(&path).await.unwrap();
        let all = reopened.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "keep");
        assert_eq!(all[0].tags, ["storm"]);
    }

    #[tokio::test]
    async fn json_store_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let repo = JsonNoiseRepository::open(dir.path().join("absent.json"))
            .await
            .unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn json_store_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noises.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = JsonNoiseRepository::open(&path).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Corrupt(_)));
    }

    #[tokio::test]
    async fn failed_write_leaves_catalog_unchanged() {
        let dir = tempdir().unwrap();
        let parent = dir.path().join("catalog");
        let path = parent.join("noises.json");
        let repo = JsonNoiseRepository::open(&path).await.unwrap();

        // A regular file where the catalog directory should be.
        std::fs::write(&parent, b"").unwrap();
        let err = repo.insert(record("rain", &["rain"])).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Io(_)));
        assert!(repo.list().await.unwrap().is_empty());

        std::fs::remove_file(&parent).unwrap();
        repo.insert(record("rain", &["rain"])).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_and_retag_keep_the_record() {
        let dir = tempdir().unwrap();
        let parent = dir.path().join("catalog");
        let path = parent.join("noises.json");
        let repo = JsonNoiseRepository::open(&path).await.unwrap();
        let r = record("rain", &["rain"]);
        let id = r.id.clone();
        repo.insert(r).await.unwrap();

        std::fs::remove_dir_all(&parent).unwrap();
        std::fs::write(&parent, b"").unwrap();

        assert!(repo.delete_by_id(&id).await.is_err());
        assert!(repo.set_tags(&id, vec!["storm".into()]).await.is_err());

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].tags, ["rain"]);
    }
}
