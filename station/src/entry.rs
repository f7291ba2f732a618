//! Finish-line and chute data entry.
//!
//! An entry session captures raw data for one mode on this device. Progress
//! is saved locally as it is captured; [`EntrySession::finish`] is the mode's
//! own save step and the only way a mode becomes done.

use crate::error::{Result, StationError};
use crate::Station;
use finishline_engine::{
    format_clock_time, EventData, EventKey, Mode, ModeGate, ModeState, Timestamp,
};
use tracing::info;

const OPEN_CONTEXT: &str = "checking cloud results";
const SAVE_CONTEXT: &str = "saving entries";

/// Current wall-clock time in milliseconds since the epoch.
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Create and save an empty offline event, keyed by the current time.
pub async fn create_local_event(station: &Station) -> Result<EventKey> {
    let key = EventKey::local(now_millis());
    station.storage().save_event(&key, &EventData::new()).await?;
    info!("Created local event {}", key);
    Ok(key)
}

pub struct EntrySession {
    station: Station,
    key: EventKey,
    mode: Mode,
    event: EventData,
    gate: ModeGate,
}

impl EntrySession {
    /// Enter `mode` for `key` if the gate allows it.
    ///
    /// For a race event the remote finish times are checked first; when
    /// that check fails it is reported and entry proceeds on local state.
    pub async fn open(station: &Station, key: EventKey, mode: Mode) -> Result<Self> {
        let event = station
            .storage()
            .load_event(&key)
            .await?
            .unwrap_or_default();
        let mut gate = ModeGate::from_event(&event, key.is_online());

        match station.remote_for(&key) {
            Ok(Some(race)) => match race.times().await {
                Ok(times) => gate.observe_remote_times(!times.is_empty()),
                Err(err) => station.reporter().report(OPEN_CONTEXT, &StationError::from(err), false),
            },
            Ok(None) => {}
            Err(err) => station.reporter().report(OPEN_CONTEXT, &err, false),
        }

        let state = gate.begin(mode)?;
        info!("Entering {:?} for {} ({:?})", mode, key, state);

        Ok(Self {
            station: station.clone(),
            key,
            mode,
            event,
            gate,
        })
    }

    /// Start the race clock now. Returns the start time kept.
    pub fn start(&mut self) -> Timestamp {
        self.event.start(now_millis())
    }

    /// Stamp a finish now. Returns its place index.
    pub fn record_finish(&mut self) -> Result<usize> {
        Ok(self.event.record_finish(now_millis())?)
    }

    pub fn set_finish_bib(&mut self, index: usize, bib: u32) {
        self.event.set_finish_bib(index, bib);
    }

    /// Record the next bib scanned in the chute.
    pub fn record_chute_bib(&mut self, bib: u32) -> usize {
        self.event.record_chute_bib(bib)
    }

    /// Save progress on this device.
    pub async fn save(&self) -> Result<()> {
        let saved = self
            .station
            .storage()
            .save_event(&self.key, &self.event)
            .await;
        if let Err(err) = &saved {
            self.station.reporter().report(SAVE_CONTEXT, err, true);
        }
        saved
    }

    /// Complete the mode.
    ///
    /// For a race event, finish-line entry uploads its bibs and times so
    /// that other devices reconcile against them.
    pub async fn finish(mut self) -> Result<EventData> {
        if self.mode == Mode::FinishLine {
            if let Err(err) = self.upload().await {
                self.station.reporter().report(SAVE_CONTEXT, &err, true);
                return Err(err);
            }
        }

        match self.mode {
            Mode::FinishLine => self.event.finish_line_done = true,
            Mode::Chute => self.event.chute_done = true,
        }
        self.gate.complete(self.mode);
        self.save().await?;
        info!("{:?} entry done for {}", self.mode, self.key);
        Ok(self.event)
    }

    async fn upload(&self) -> Result<()> {
        let Some(race) = self.station.remote_for(&self.key)? else {
            return Ok(());
        };
        let times: Vec<String> = self
            .event
            .finish_times
            .iter()
            .map(|ms| format_clock_time(*ms))
            .collect();
        race.replace_bibs(&self.event.finish_line_bibs).await?;
        race.replace_times(&times).await?;
        info!("Uploaded {} finish times for {}", times.len(), self.key);
        Ok(())
    }

    pub fn key(&self) -> &EventKey {
        &self.key
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> ModeState {
        self.gate.state(self.mode)
    }

    pub fn event(&self) -> &EventData {
        &self.event
    }
}
