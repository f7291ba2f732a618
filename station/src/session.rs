//! The reconciliation screen's session.
//!
//! A session is opened per visit to the results screen. It rebuilds the
//! record set from local and remote sources, lets the operator resolve,
//! swap and edit, and commits. Nothing in the record set is persisted until
//! a commit succeeds; dropping the session discards it.

use crate::commit::{CommitOutcome, CommitPipeline};
use crate::error::{Result, StationError};
use crate::prompt::Prompt;
use crate::remote::RaceRemote;
use crate::roster::Roster;
use crate::Station;
use finishline_engine::{
    check_entries, BatchDirection, BibChoice, ConflictAlert, ConflictMonitor, Error, EventData,
    EventKey, FinishTime, MergeInput, ModeGate, ObserverId, Projection, Reconciler, Record,
    RecordStore, ResolveOutcome, Resolver, Screen, SwapSelection, TapOutcome,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const LOAD_CONTEXT: &str = "loading results";
const SAVE_CONTEXT: &str = "saving progress";
const COMMIT_CONTEXT: &str = "saving results";

/// Result of a resolution made through the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    pub resolution: ResolveOutcome,
    /// Set when the resolution closed the last conflict and the record set
    /// was committed as a result
    pub commit: Option<CommitOutcome>,
}

/// Set while a session is committing. Clones share the same flag, so a
/// screen can hold one and disable its commit controls while it is set.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn raise(&self) -> LoadingGuard {
        self.0.store(true, Ordering::Release);
        LoadingGuard(self.clone())
    }
}

/// Clears the flag on drop, including when the commit future is dropped
/// half-way.
struct LoadingGuard(LoadingFlag);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        (self.0).0.store(false, Ordering::Release);
    }
}

pub struct ReconcileSession {
    station: Station,
    key: EventKey,
    event: EventData,
    store: RecordStore,
    gate: ModeGate,
    roster: Roster,
    has_remote_data: bool,
    monitor: ConflictMonitor,
    alert: Option<ConflictAlert>,
    selection: SwapSelection,
    loading: LoadingFlag,
}

impl ReconcileSession {
    /// Open the results screen for `key`.
    ///
    /// Fails when the gate does not allow results yet. A failed remote fetch
    /// does not fail the open: it is reported and the session falls back to
    /// the data on this device.
    pub async fn open(station: &Station, key: EventKey) -> Result<Self> {
        let event = station
            .storage()
            .load_event(&key)
            .await?
            .unwrap_or_default();
        let mut gate = ModeGate::from_event(&event, key.is_online());
        gate.check(Screen::Results)?;

        let mut roster = Roster::default();
        let input = match station.remote_for(&key) {
            Ok(None) => MergeInput::offline(&event),
            Ok(Some(race)) => match fetch(&race).await {
                Ok((bibs, times)) => {
                    gate.observe_remote_times(!times.is_empty());
                    roster = load_roster(station, &race).await;
                    MergeInput::online(&event, bibs, times)
                }
                Err(err) => {
                    station.reporter().report(LOAD_CONTEXT, &err, true);
                    MergeInput::offline(&event)
                }
            },
            Err(err) => {
                station.reporter().report(LOAD_CONTEXT, &err, true);
                MergeInput::offline(&event)
            }
        };

        let merged = Reconciler::new(input).reconcile();
        info!(
            "Opened {}: {} places, {} absorbed, {} conflicts",
            key,
            merged.store.len(),
            merged.absorbed,
            merged.conflicts
        );

        let mut session = Self {
            station: station.clone(),
            key,
            event,
            store: merged.store,
            gate,
            roster,
            has_remote_data: merged.has_remote_data,
            monitor: ConflictMonitor::new(),
            alert: None,
            selection: SwapSelection::new(),
            loading: LoadingFlag::default(),
        };
        session.observe_conflicts();
        Ok(session)
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Keep one bib at a conflicting place. Closing the last conflict
    /// commits the record set.
    pub async fn resolve(&mut self, index: usize, choice: BibChoice) -> Result<SessionUpdate> {
        let outcome = Resolver::new(&mut self.store, &mut self.event).resolve(index, choice)?;
        self.after_resolution(outcome).await
    }

    /// Settle every conflict in one direction. Only offered when a remote
    /// bib was checked against a local one.
    pub async fn resolve_all(&mut self, direction: BatchDirection) -> Result<SessionUpdate> {
        if !self.has_remote_data {
            return Err(Error::BatchUnavailable.into());
        }
        let outcome = Resolver::new(&mut self.store, &mut self.event).resolve_all(direction);
        self.after_resolution(outcome).await
    }

    /// Ask which direction to resolve everything in. `None` when the
    /// operator chose to go one at a time or dismissed the prompt.
    pub async fn choose_batch(&mut self) -> Result<Option<SessionUpdate>> {
        if !self.has_remote_data {
            return Err(Error::BatchUnavailable.into());
        }
        let prompt = Prompt::batch_resolution(self.store.conflict_count());
        let direction = match self.station.confirmer().confirm(&prompt).await {
            Some(0) => BatchDirection::UseCloud,
            Some(1) => BatchDirection::UseLocal,
            _ => return Ok(None),
        };
        self.resolve_all(direction).await.map(Some)
    }

    /// Ask which bib belongs at the conflicting place `index`.
    pub async fn choose_conflict(&mut self, index: usize) -> Result<Option<SessionUpdate>> {
        let record = self.record(index)?;
        if !record.has_conflict() {
            return Ok(None);
        }
        let prompt = Prompt::conflict_choice(index + 1, &record.bib_num, &record.checker_bib);
        let choice = match self.station.confirmer().confirm(&prompt).await {
            Some(0) => BibChoice::BibNum,
            Some(1) => BibChoice::CheckerBib,
            _ => return Ok(None),
        };
        self.resolve(index, choice).await.map(Some)
    }

    async fn after_resolution(&mut self, outcome: ResolveOutcome) -> Result<SessionUpdate> {
        if outcome.needs_persist() {
            self.save_event().await?;
        }
        self.observe_conflicts();

        let commit = if outcome.submit {
            info!("Last conflict on {} resolved, committing", self.key);
            Some(self.commit().await?)
        } else {
            None
        };
        Ok(SessionUpdate {
            resolution: outcome,
            commit,
        })
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Tap a place in swap mode.
    pub fn tap(&mut self, index: usize) -> Result<TapOutcome> {
        let outcome = self.selection.tap(&mut self.store, index)?;
        debug!("Swap tap on place {}: {:?}", index + 1, outcome);
        self.observe_conflicts();
        Ok(outcome)
    }

    pub fn edit_bib(&mut self, index: usize, text: &str) -> Result<()> {
        self.store.edit_bib(index, text)?;
        self.observe_conflicts();
        Ok(())
    }

    pub fn edit_time(&mut self, index: usize, text: &str) -> Result<FinishTime> {
        Ok(self.store.edit_time(index, text)?)
    }

    pub fn add_record(&mut self) -> usize {
        self.selection.clear();
        self.store.add_record()
    }

    pub fn remove_record(&mut self, index: usize) -> Result<Record> {
        self.selection.clear();
        let removed = self.store.remove_record(index)?;
        self.observe_conflicts();
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Commit
    // ------------------------------------------------------------------

    /// Validate and commit the record set.
    ///
    /// Validation sorts the record set by finish time. On failure the record
    /// set is otherwise left as it was so the commit can be retried.
    pub async fn commit(&mut self) -> Result<CommitOutcome> {
        let _guard = self.loading.raise();

        let open = self.store.conflict_count();
        if open > 0 {
            return Err(Error::OpenConflicts(open).into());
        }
        if let Err(err) = check_entries(&mut self.store, self.station.engine_config()) {
            let err = StationError::from(err);
            self.station.reporter().report(COMMIT_CONTEXT, &err, true);
            return Err(err);
        }

        let projection = Projection::from_records(self.store.records());
        self.push(&projection).await
    }

    /// Remove every result for the event after two confirmations. `None`
    /// when either confirmation was declined.
    pub async fn delete_all(&mut self) -> Result<Option<CommitOutcome>> {
        let confirmer = self.station.confirmer();
        if confirmer.confirm(&Prompt::delete_all()).await != Some(0) {
            return Ok(None);
        }
        if confirmer.confirm(&Prompt::confirm_delete_all()).await != Some(0) {
            return Ok(None);
        }

        let _guard = self.loading.raise();
        let outcome = self.push(&Projection::from_records(&[])).await?;

        self.selection.clear();
        self.store.clear();
        self.has_remote_data = false;
        self.observe_conflicts();
        Ok(Some(outcome))
    }

    async fn push(&mut self, projection: &Projection) -> Result<CommitOutcome> {
        let (outcome, next) = CommitPipeline::new(&self.station, &self.key)
            .run(projection, &self.event)
            .await?;
        self.event = next;
        match outcome {
            CommitOutcome::Cleared => self.gate.reset_all(),
            _ => self.gate.mark_reconciled(),
        }
        Ok(outcome)
    }

    async fn save_event(&self) -> Result<()> {
        let saved = self.station.storage().save_event(&self.key, &self.event).await;
        if let Err(err) = &saved {
            self.station.reporter().report(SAVE_CONTEXT, err, true);
        }
        saved
    }

    fn observe_conflicts(&mut self) {
        if let Some(alert) = self.monitor.observe(self.store.conflict_count()) {
            warn!(
                "{} new conflicts on {} ({} open)",
                alert.added, self.key, alert.open
            );
            self.alert = Some(alert);
        }
    }

    fn record(&self, index: usize) -> Result<&Record> {
        self.store.get(index).ok_or_else(|| {
            StationError::from(Error::PlaceOutOfRange {
                place: index + 1,
                len: self.store.len(),
            })
        })
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Called with the full record set after every change.
    pub fn subscribe(&mut self, observer: impl FnMut(&[Record]) + Send + 'static) -> ObserverId {
        self.store.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.store.unsubscribe(id)
    }

    /// The conflict alert raised since the last call, if any.
    pub fn take_alert(&mut self) -> Option<ConflictAlert> {
        self.alert.take()
    }

    pub fn key(&self) -> &EventKey {
        &self.key
    }

    pub fn event(&self) -> &EventData {
        &self.event
    }

    pub fn records(&self) -> &[Record] {
        self.store.records()
    }

    pub fn conflicts(&self) -> Vec<usize> {
        self.store.conflicts()
    }

    pub fn gate(&self) -> &ModeGate {
        &self.gate
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Whether batch resolution is offered.
    pub fn has_remote_data(&self) -> bool {
        self.has_remote_data
    }

    pub fn selected(&self) -> Option<usize> {
        self.selection.selected()
    }

    /// True while a commit is running.
    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    /// A handle on the loading flag that outlives borrows of the session.
    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }
}

async fn fetch(race: &RaceRemote) -> Result<(Vec<String>, Vec<String>)> {
    let bibs = race.bibs().await?;
    let times = race.times().await?;
    Ok((bibs, times))
}

async fn load_roster(station: &Station, race: &RaceRemote) -> Roster {
    match race.participants().await {
        Ok(participants) => Roster::new(participants),
        Err(err) => {
            station
                .reporter()
                .report("loading participants", &StationError::from(err), false);
            Roster::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_flag_follows_guard() {
        let flag = LoadingFlag::default();
        let watcher = flag.clone();

        let guard = flag.raise();
        assert!(watcher.is_set());

        drop(guard);
        assert!(!watcher.is_set());
    }
}
