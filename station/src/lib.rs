//! # Finishline Station
//!
//! The device side of finish reconciliation: loads an event's raw data from
//! local storage, fetches what the remote results store already holds, runs
//! the engine's merge, and drives resolution, validation and commit.
//!
//! All IO goes through four collaborators held by a [`Station`]: a
//! [`RemoteStore`], a [`LocalStorage`], an [`ErrorReporter`] and a
//! [`Confirmer`].

pub mod commit;
pub mod config;
pub mod entry;
pub mod error;
pub mod prompt;
pub mod remote;
pub mod report;
pub mod roster;
pub mod session;
pub mod storage;

pub use commit::{CommitOutcome, CommitPipeline};
pub use config::{Config, ConfigError};
pub use entry::{create_local_event, now_millis, EntrySession};
pub use error::{RemoteError, Result, StationError};
pub use prompt::{Confirmer, Prompt, ScriptedConfirmer};
pub use remote::{BibEntry, InMemoryRemote, Participant, RaceRemote, RemoteStore, TimeEntry};
pub use report::{CollectingReporter, ErrorReporter, TracingReporter, CONNECTIVITY_MESSAGE};
pub use roster::Roster;
pub use session::{LoadingFlag, ReconcileSession, SessionUpdate};
pub use storage::{JsonFileStorage, LocalStorage, MemoryStorage};

use finishline_engine::{EngineConfig, EventKey};
use std::sync::Arc;

/// The collaborators every session and entry screen works through.
#[derive(Clone)]
pub struct Station {
    remote: Option<Arc<dyn RemoteStore>>,
    storage: Arc<dyn LocalStorage>,
    reporter: Arc<dyn ErrorReporter>,
    confirmer: Arc<dyn Confirmer>,
    engine: EngineConfig,
}

impl Station {
    /// An offline station. Add a remote with [`Station::with_remote`].
    pub fn new(
        storage: Arc<dyn LocalStorage>,
        reporter: Arc<dyn ErrorReporter>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            remote: None,
            storage,
            reporter,
            confirmer,
            engine: EngineConfig::default(),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_engine_config(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// The remote for `key`: `None` for a local event. A race event on a
    /// station without a remote is unreachable.
    pub fn remote_for(&self, key: &EventKey) -> Result<Option<RaceRemote>> {
        match key {
            EventKey::Local { .. } => Ok(None),
            EventKey::Race { race_id, event_id } => match &self.remote {
                Some(remote) => Ok(Some(RaceRemote::new(remote.clone(), *race_id, *event_id))),
                None => Err(RemoteError::Unreachable.into()),
            },
        }
    }

    pub fn storage(&self) -> &dyn LocalStorage {
        self.storage.as_ref()
    }

    pub fn reporter(&self) -> &dyn ErrorReporter {
        self.reporter.as_ref()
    }

    pub fn confirmer(&self) -> &dyn Confirmer {
        self.confirmer.as_ref()
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }
}

impl std::fmt::Debug for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Station")
            .field("online", &self.remote.is_some())
            .field("engine", &self.engine)
            .finish()
    }
}
