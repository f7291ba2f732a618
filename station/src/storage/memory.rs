use super::LocalStorage;
use crate::error::StationError;
use async_trait::async_trait;
use finishline_engine::{EventData, EventKey};
use std::collections::HashMap;
use std::sync::Mutex;

/// Event storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    events: Mutex<HashMap<EventKey, EventData>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> Result<std::sync::MutexGuard<'_, HashMap<EventKey, EventData>>, StationError> {
        self.events
            .lock()
            .map_err(|e| StationError::Storage(format!("storage lock poisoned: {e}")))
    }
}

#[async_trait]
impl LocalStorage for MemoryStorage {
    async fn load_event(&self, key: &EventKey) -> Result<Option<EventData>, StationError> {
        Ok(self.events()?.get(key).cloned())
    }

    async fn save_event(&self, key: &EventKey, data: &EventData) -> Result<(), StationError> {
        self.events()?.insert(key.clone(), data.clone());
        Ok(())
    }
}
