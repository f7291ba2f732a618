//! Durable local storage of per-event raw data.
//!
//! Only [`EventData`] is ever persisted: the three raw arrays, the start time
//! and the two completion flags. Record sets are rebuilt from it.

mod file;
mod memory;

pub use file::JsonFileStorage;
pub use memory::MemoryStorage;

use crate::error::StationError;
use async_trait::async_trait;
use finishline_engine::{EventData, EventKey};

#[async_trait]
pub trait LocalStorage: Send + Sync {
    /// Load an event's data. `None` when nothing was saved for `key`.
    async fn load_event(&self, key: &EventKey) -> Result<Option<EventData>, StationError>;

    async fn save_event(&self, key: &EventKey, data: &EventData) -> Result<(), StationError>;
}
