//! Contract of the remote race-results store.
//!
//! The HTTP client that implements this for the real service lives outside
//! this crate. Bibs travel as ordered integers on upload and come back as
//! strings; times travel as clock strings.

mod memory;

pub use memory::{InMemoryRemote, RemoteCall};

use crate::error::RemoteError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One bib in the remote finish order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibEntry {
    pub bib_num: String,
}

/// One finish time in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub time: String,
}

/// A registered participant, used for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub bib_num: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

/// Remote read and write calls for one race event.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get_bibs(&self, race_id: u64, event_id: u64) -> Result<Vec<BibEntry>, RemoteError>;

    async fn get_finish_times(
        &self,
        race_id: u64,
        event_id: u64,
    ) -> Result<Vec<TimeEntry>, RemoteError>;

    async fn get_participants(
        &self,
        race_id: u64,
        event_id: u64,
    ) -> Result<Vec<Participant>, RemoteError>;

    /// Append bibs to the remote finish order.
    async fn post_bibs(&self, race_id: u64, event_id: u64, bibs: &[u32])
        -> Result<(), RemoteError>;

    /// Append finish times.
    async fn post_finish_times(
        &self,
        race_id: u64,
        event_id: u64,
        times: &[String],
    ) -> Result<(), RemoteError>;

    async fn delete_bibs(&self, race_id: u64, event_id: u64) -> Result<(), RemoteError>;

    async fn delete_finish_times(&self, race_id: u64, event_id: u64) -> Result<(), RemoteError>;
}

/// A remote store bound to one race event.
#[derive(Clone)]
pub struct RaceRemote {
    store: Arc<dyn RemoteStore>,
    race_id: u64,
    event_id: u64,
}

impl RaceRemote {
    pub fn new(store: Arc<dyn RemoteStore>, race_id: u64, event_id: u64) -> Self {
        Self {
            store,
            race_id,
            event_id,
        }
    }

    /// Remote bib order, as transmitted.
    pub async fn bibs(&self) -> Result<Vec<String>, RemoteError> {
        let entries = self.store.get_bibs(self.race_id, self.event_id).await?;
        Ok(entries.into_iter().map(|e| e.bib_num).collect())
    }

    /// Remote finish times as clock strings.
    pub async fn times(&self) -> Result<Vec<String>, RemoteError> {
        let entries = self.store.get_finish_times(self.race_id, self.event_id).await?;
        Ok(entries.into_iter().map(|e| e.time).collect())
    }

    pub async fn participants(&self) -> Result<Vec<Participant>, RemoteError> {
        self.store.get_participants(self.race_id, self.event_id).await
    }

    /// Delete the remote bib order and upload `bibs` in its place. Nothing is
    /// uploaded when `bibs` is empty.
    pub async fn replace_bibs(&self, bibs: &[u32]) -> Result<(), RemoteError> {
        self.store.delete_bibs(self.race_id, self.event_id).await?;
        if !bibs.is_empty() {
            self.store.post_bibs(self.race_id, self.event_id, bibs).await?;
        }
        Ok(())
    }

    /// Same as [`RaceRemote::replace_bibs`], for finish times.
    pub async fn replace_times(&self, times: &[String]) -> Result<(), RemoteError> {
        self.store
            .delete_finish_times(self.race_id, self.event_id)
            .await?;
        if !times.is_empty() {
            self.store
                .post_finish_times(self.race_id, self.event_id, times)
                .await?;
        }
        Ok(())
    }
}

impl fmt::Debug for RaceRemote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaceRemote")
            .field("race_id", &self.race_id)
            .field("event_id", &self.event_id)
            .finish()
    }
}
