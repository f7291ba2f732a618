//! Commit of a validated record set.
//!
//! Online, the remote bib order and finish times are replaced by the
//! projection and the local raw arrays are dropped, since the remote copy is
//! now authoritative. Offline, the projection overwrites the local raw
//! arrays. An empty projection clears everything and resets the completion
//! flags.
//!
//! The remote store has no transactions. Before anything is deleted the
//! pipeline captures the current remote bibs and times; if an upload fails
//! after its delete went through, the capture is put back.

use crate::error::{Result, StationError};
use crate::remote::RaceRemote;
use crate::Station;
use finishline_engine::{Bib, EventData, EventKey, Projection};
use tracing::{error, info, warn};

const COMMIT_CONTEXT: &str = "saving results";
const ROLLBACK_CONTEXT: &str = "restoring cloud results";

/// What a successful commit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The remote store now holds the record set
    Uploaded { bibs: usize, times: usize },
    /// The record set was empty; remote and local data were cleared
    Cleared,
    /// Offline event saved on this device
    SavedLocally { places: usize },
}

/// Remote state captured before a commit touches it.
#[derive(Debug, Clone, Default)]
struct RemoteSnapshot {
    bibs: Vec<u32>,
    times: Vec<String>,
}

impl RemoteSnapshot {
    async fn capture(race: &RaceRemote) -> Result<Self> {
        let raw_bibs = race.bibs().await?;
        let bibs: Vec<u32> = raw_bibs
            .iter()
            .filter_map(|raw| Bib::parse(raw).number())
            .collect();
        if bibs.len() != raw_bibs.len() {
            warn!(
                "{} remote bibs are not bib numbers and cannot be restored",
                raw_bibs.len() - bibs.len()
            );
        }
        let times = race.times().await?;
        Ok(Self { bibs, times })
    }
}

/// Pushes one event's projection to wherever it belongs.
pub struct CommitPipeline<'a> {
    station: &'a Station,
    key: &'a EventKey,
}

impl<'a> CommitPipeline<'a> {
    pub fn new(station: &'a Station, key: &'a EventKey) -> Self {
        Self { station, key }
    }

    /// Commit `projection` for `event`.
    ///
    /// Returns the event data to keep from now on; `event` itself is not
    /// touched, so a failed commit can simply be retried. Failures are
    /// reported before they are returned.
    pub async fn run(
        &self,
        projection: &Projection,
        event: &EventData,
    ) -> Result<(CommitOutcome, EventData)> {
        let race = self.reported(COMMIT_CONTEXT, self.station.remote_for(self.key))?;
        match race {
            Some(race) => self.push(&race, projection, event).await,
            None => self.save_locally(projection, event).await,
        }
    }

    async fn push(
        &self,
        race: &RaceRemote,
        projection: &Projection,
        event: &EventData,
    ) -> Result<(CommitOutcome, EventData)> {
        let snapshot = self.reported(COMMIT_CONTEXT, RemoteSnapshot::capture(race).await)?;
        info!(
            "Committing {} places for {} (replacing {} remote bibs)",
            projection.bib_nums.len(),
            self.key,
            snapshot.bibs.len()
        );

        let times = projection.clock_times();
        if let Err(err) = upload(race, &projection.bib_nums, &times).await {
            self.roll_back(race, &snapshot).await;
            self.station.reporter().report(COMMIT_CONTEXT, &err, true);
            return Err(err);
        }

        let mut next = event.clone();
        next.clear_progress();
        next.set_done(!projection.is_empty());
        self.reported(
            COMMIT_CONTEXT,
            self.station.storage().save_event(self.key, &next).await,
        )?;

        let outcome = if projection.is_empty() {
            CommitOutcome::Cleared
        } else {
            CommitOutcome::Uploaded {
                bibs: projection.bib_nums.len(),
                times: times.len(),
            }
        };
        info!("Commit for {} finished: {:?}", self.key, outcome);
        Ok((outcome, next))
    }

    async fn save_locally(
        &self,
        projection: &Projection,
        event: &EventData,
    ) -> Result<(CommitOutcome, EventData)> {
        let mut next = event.clone();
        if projection.is_empty() {
            next.clear_progress();
        } else {
            projection.apply_to(&mut next);
        }
        next.set_done(!projection.is_empty());

        self.reported(
            COMMIT_CONTEXT,
            self.station.storage().save_event(self.key, &next).await,
        )?;

        let outcome = if projection.is_empty() {
            CommitOutcome::Cleared
        } else {
            CommitOutcome::SavedLocally {
                places: projection.bib_nums.len(),
            }
        };
        info!("Saved {} locally: {:?}", self.key, outcome);
        Ok((outcome, next))
    }

    async fn roll_back(&self, race: &RaceRemote, snapshot: &RemoteSnapshot) {
        warn!("Commit for {} failed, restoring cloud results", self.key);
        if let Err(err) = upload(race, &snapshot.bibs, &snapshot.times).await {
            error!("Rollback for {} failed: {}", self.key, err);
            self.station.reporter().report(ROLLBACK_CONTEXT, &err, true);
        }
    }

    fn reported<T>(&self, context: &str, result: Result<T>) -> Result<T> {
        result.map_err(|err| {
            self.station.reporter().report(context, &err, true);
            err
        })
    }
}

async fn upload(race: &RaceRemote, bibs: &[u32], times: &[String]) -> Result<()> {
    race.replace_bibs(bibs).await.map_err(StationError::from)?;
    race.replace_times(times).await.map_err(StationError::from)?;
    Ok(())
}
