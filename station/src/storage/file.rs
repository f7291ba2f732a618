//! Event storage on the local filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use finishline_engine::{EventData, EventKey};
use tokio::fs;
use tracing::debug;

use super::LocalStorage;
use crate::error::StationError;

/// Event storage backed by the local filesystem.
///
/// Each event is one JSON document at `{dir}/{storage_key}.json`. Writes go
/// to a temporary file first and are renamed into place, so a crash never
/// leaves a half-written event behind.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn event_path(&self, key: &EventKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.storage_key()))
    }
}

#[async_trait]
impl LocalStorage for JsonFileStorage {
    async fn load_event(&self, key: &EventKey) -> Result<Option<EventData>, StationError> {
        let path = self.event_path(key);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StationError::Storage(format!(
                    "read {} failed: {e}",
                    path.display()
                )))
            }
        };

        let data = serde_json::from_slice(&bytes)?;
        debug!("Loaded event {} ({} bytes)", key, bytes.len());
        Ok(Some(data))
    }

    async fn save_event(&self, key: &EventKey, data: &EventData) -> Result<(), StationError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StationError::Storage(format!("create data dir failed: {e}")))?;

        let path = self.event_path(key);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(data)?;

        fs::write(&tmp, &json)
            .await
            .map_err(|e| StationError::Storage(format!("write {} failed: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StationError::Storage(format!("rename into {} failed: {e}", path.display())))?;

        debug!("Saved event {} ({} bytes)", key, json.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_event_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());

        let loaded = storage.load_event(&EventKey::race(1, 2)).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn saves_under_storage_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested"));
        let key = EventKey::race(7, 3);
        let data = EventData {
            chute_bibs: vec![4, 5],
            ..EventData::default()
        };

        storage.save_event(&key, &data).await.unwrap();

        let path = dir.path().join("nested").join("race-7-event-3.json");
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(storage.load_event(&key).await.unwrap(), Some(data));
    }

    #[tokio::test]
    async fn corrupt_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        let key = EventKey::local(42);
        std::fs::write(dir.path().join("local-42.json"), b"{not json").unwrap();

        let err = storage.load_event(&key).await.unwrap_err();
        assert!(matches!(err, StationError::Json(_)));
    }
}
