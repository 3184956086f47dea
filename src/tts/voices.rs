//! Voice catalog — stored synthesis parameters per voice id.
//!
//! [`VoiceRepository`] maps a `voiceId` to its [`VoiceProfile`].  Voices
//! without a record are synthesized with [`VoiceProfile::with_id`]
//! defaults; the orchestrator makes that call.
//!
//! Both `voiceId` and `voiceName` are unique within a catalog.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use super::synthesizer::VoiceProfile;

#[derive(Debug, Error)]
pub enum VoiceCatalogError {
    /// Another voice already uses this id or name.
    #[error("voice {0:?} already exists")]
    Duplicate(String),

    #[error("voice catalog I/O failed: {0}")]
    Io(String),

    #[error("voice catalog file is corrupt: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for VoiceCatalogError {
    fn from(e: std::io::Error) -> Self {
        VoiceCatalogError::Io(e.to_string())
    }
}

#[async_trait]
pub trait VoiceRepository: Send + Sync {
    /// The stored profile for `voice_id`, if any.
    async fn find_voice(&self, voice_id: &str) -> Result<Option<VoiceProfile>, VoiceCatalogError>;

    async fn list(&self) -> Result<Vec<VoiceProfile>, VoiceCatalogError>;

    /// Add a voice; id and name must both be unused.
    async fn insert(&self, voice: VoiceProfile) -> Result<(), VoiceCatalogError>;

    /// Replace the stored parameters of an existing voice.  Returns whether
    /// the voice exists.
    async fn update(&self, voice: VoiceProfile) -> Result<bool, VoiceCatalogError>;

    /// Returns whether something was removed.
    async fn delete(&self, voice_id: &str) -> Result<bool, VoiceCatalogError>;
}

#[derive(Debug, Clone, Default)]
struct Voices {
    records: Vec<VoiceProfile>,
}

impl Voices {
    fn find(&self, voice_id: &str) -> Option<VoiceProfile> {
        self.records.iter().find(|v| v.voice_id == voice_id).cloned()
    }

    fn insert(&mut self, voice: VoiceProfile) -> Result<(), VoiceCatalogError> {
        if let Some(taken) = self
            .records
            .iter()
            .find(|v| v.voice_id == voice.voice_id || v.voice_name == voice.voice_name)
        {
            let clash = if taken.voice_id == voice.voice_id {
                voice.voice_id
            } else {
                voice.voice_name
            };
            return Err(VoiceCatalogError::Duplicate(clash));
        }
        self.records.push(voice);
        Ok(())
    }

    fn update(&mut self, voice: VoiceProfile) -> Result<bool, VoiceCatalogError> {
        if self
            .records
            .iter()
            .any(|v| v.voice_id != voice.voice_id && v.voice_name == voice.voice_name)
        {
            return Err(VoiceCatalogError::Duplicate(voice.voice_name));
        }
        match self.records.iter_mut().find(|v| v.voice_id == voice.voice_id) {
            Some(slot) => {
                *slot = voice;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&mut self, voice_id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|v| v.voice_id != voice_id);
        self.records.len() != before
    }
}

// ---------------------------------------------------------------------------
// InMemoryVoiceRepository
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryVoiceRepository {
    voices: Mutex<Voices>,
}

impl InMemoryVoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voices(records: Vec<VoiceProfile>) -> Self {
        Self {
            voices: Mutex::new(Voices { records }),
        }
    }
}

#[async_trait]
impl VoiceRepository for InMemoryVoiceRepository {
    async fn find_voice(&self, voice_id: &str) -> Result<Option<VoiceProfile>, VoiceCatalogError> {
        Ok(self.voices.lock().await.find(voice_id))
    }

    async fn list(&self) -> Result<Vec<VoiceProfile>, VoiceCatalogError> {
        Ok(self.voices.lock().await.records.clone())
    }

    async fn insert(&self, voice: VoiceProfile) -> Result<(), VoiceCatalogError> {
        self.voices.lock().await.insert(voice)
    }

    async fn update(&self, voice: VoiceProfile) -> Result<bool, VoiceCatalogError> {
        self.voices.lock().await.update(voice)
    }

    async fn delete(&self, voice_id: &str) -> Result<bool, VoiceCatalogError> {
        Ok(self.voices.lock().await.delete(voice_id))
    }
}

// ---------------------------------------------------------------------------
// JsonVoiceRepository
// ---------------------------------------------------------------------------

/// Voice catalog persisted as a JSON array of [`VoiceProfile`]s.
///
/// Changes are made on a copy and only kept once the file write succeeded.
#[derive(Debug)]
pub struct JsonVoiceRepository {
    path: PathBuf,
    voices: Mutex<Voices>,
}

impl JsonVoiceRepository {
    /// Open the catalog at `path`; a missing file is an empty catalog.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, VoiceCatalogError> {
        let path = path.into();
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(data) if data.trim().is_empty() => Vec::new(),
            Ok(data) => serde_json::from_str(&data)
                .map_err(|e| VoiceCatalogError::Corrupt(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        log::debug!("voice catalog: loaded {} voices from {}", records.len(), path.display());

        Ok(Self {
            path,
            voices: Mutex::new(Voices { records }),
        })
    }

    async fn persist(&self, voices: &Voices) -> Result<(), VoiceCatalogError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&voices.records)
            .map_err(|e| VoiceCatalogError::Io(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl VoiceRepository for JsonVoiceRepository {
    async fn find_voice(&self, voice_id: &str) -> Result<Option<VoiceProfile>, VoiceCatalogError> {
        Ok(self.voices.lock().await.find(voice_id))
    }

    async fn list(&self) -> Result<Vec<VoiceProfile>, VoiceCatalogError> {
        Ok(self.voices.lock().await.records.clone())
    }

    async fn insert(&self, voice: VoiceProfile) -> Result<(), VoiceCatalogError> {
        let mut voices = self.voices.lock().await;
        let mut next = voices.clone();
        next.insert(voice)?;
        self.persist(&next).await?;
        *voices = next;
        Ok(())
    }

    async fn update(&self, voice: VoiceProfile) -> Result<bool, VoiceCatalogError> {
        let mut voices = self.voices.lock().await;
        let mut next = voices.clone();
        if !next.update(voice)? {
            return Ok(false);
        }
        self.persist(&next).await?;
        *voices = next;
        Ok(true)
    }

    async fn delete(&self, voice_id: &str) -> Result<bool, VoiceCatalogError> {
        let mut voices = self.voices.lock().await;
        let mut next = voices.clone();
        if !next.delete(voice_id) {
            return Ok(false);
        }
        self.persist(&next).await?;
        *voices = next;
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

    fn voice(id: &str, name: &str, stability: f32) -> VoiceProfile {
        VoiceProfile {
            voice_id: id.into(),
            voice_name: name.into(),
            stability,
            ..VoiceProfile::default()
        }
    }

    #[tokio::test]
    async fn find_by_voice_id() {
        let repo = InMemoryVoiceRepository::with_voices(vec![
            voice("v1", "Rachel", 0.3),
            voice("v2", "Adam", 0.7),
        ]);
        let found = repo.find_voice("v2").await.unwrap().unwrap();
        assert_eq!(found.voice_name, "Adam");
        assert_eq!(found.stability, 0.7);
        assert!(repo.find_voice("v3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn id_and_name_are_unique() {
        let repo = InMemoryVoiceRepository::new();
        repo.insert(voice("v1", "Rachel", 0.5)).await.unwrap();

        let err = repo.insert(voice("v1", "Other", 0.5)).await.unwrap_err();
        assert!(matches!(err, VoiceCatalogError::Duplicate(id) if id == "v1"));
        let err = repo.insert(voice("v2", "Rachel", 0.5)).await.unwrap_err();
        assert!(matches!(err, VoiceCatalogError::Duplicate(name) if name == "Rachel"));
    }

    #[tokio::test]
    async fn update_replaces_parameters() {
        let repo = InMemoryVoiceRepository::with_voices(vec![voice("v1", "Rachel", 0.5)]);
        assert!(repo.update(voice("v1", "Rachel", 0.2)).await.unwrap());
        assert!(!repo.update(voice("nope", "Nobody", 0.2)).await.unwrap());
        assert_eq!(repo.find_voice("v1").await.unwrap().unwrap().stability, 0.2);
    }

    #[tokio::test]
    async fn json_store_round_trips_and_fills_missing_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("voices.json");
        std::fs::write(
            &path,
            r#"[{"voiceId":"v1","voiceName":"Rachel","stability":0.25,"useSpeakerBoost":false}]"#,
        )
        .unwrap();

        let repo = JsonVoiceRepository::open(&path).await.unwrap();
        let v1 = repo.find_voice("v1").await.unwrap().unwrap();
        assert_eq!(v1.stability, 0.25);
        assert_eq!(v1.similarity_boost, 0.9);
        assert!(!v1.use_speaker_boost);

        repo.insert(voice("v2", "Adam", 0.6)).await.unwrap();
        assert!(repo.delete("v1").await.unwrap());

        let reopened = JsonVoiceRepository::open(&path).await.unwrap();
        let all = reopened.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].voice_id, "v2");
    }

    #[tokio::test]
    async fn failed_write_keeps_memory_in_sync() {
        let dir = tempdir().unwrap();
        let parent = dir.path().join("catalog");
        let repo = JsonVoiceRepository::open(parent.join("voices.json")).await.unwrap();

        std::fs::write(&parent, b"").unwrap();
        assert!(repo.insert(voice("v1", "Rachel", 0.5)).await.is_err());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("voices.json");
        std::fs::write(&path, "[{").unwrap();
        assert!(matches!(
            JsonVoiceRepository::open(&path).await.unwrap_err(),
            VoiceCatalogError::Corrupt(_)
        ));
    }
}
