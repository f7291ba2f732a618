//! Mode gating across devices.
//!
//! Several devices may work on one event with no central lock. The gate
//! decides which entry screen may be opened next from the local completion
//! state and what has been observed in the remote store. It is a best-effort,
//! eventually consistent guard: concurrent writes can still slip through and
//! surface later as conflicts during reconciliation.
//!
//! # States
//!
//! Finish-line and chute entry each move `NotStarted -> InProgress -> Done`.
//! `Done` is reached only through the mode's own save (or a commit from
//! results) and left only through a delete-all. The event as a whole becomes
//! reconciled after a successful commit from the results screen.

use crate::EventData;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A data-entry mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    FinishLine,
    Chute,
}

/// A screen guarded by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    FinishLine,
    Chute,
    Results,
}

impl From<Mode> for Screen {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::FinishLine => Screen::FinishLine,
            Mode::Chute => Screen::Chute,
        }
    }
}

/// Progress of one mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModeState {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

/// Why a screen cannot be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateBlock {
    #[error("finish line entry is already complete")]
    FinishLineDone,
    #[error("chute entry is already complete")]
    ChuteDone,
    #[error("chute entry is in progress")]
    ChuteInProgress,
    #[error("finish line entry is in progress")]
    FinishLineInProgress,
    #[error("finish times have already been uploaded for this event")]
    RemoteHasTimes,
    #[error("finish line entry must be completed first")]
    FinishLineNotDone,
    #[error("there is unsaved entry data on this device")]
    UnsavedProgress,
}

/// Per-event gate over the entry screens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeGate {
    online: bool,
    finish_line: ModeState,
    chute: ModeState,
    remote_has_times: bool,
    reconciled: bool,
}

impl ModeGate {
    /// A fresh gate with nothing started.
    pub fn new(online: bool) -> Self {
        Self {
            online,
            ..Self::default()
        }
    }

    /// Derive the gate from an event's persisted flags and raw arrays.
    pub fn from_event(event: &EventData, online: bool) -> Self {
        let state = |done: bool, progress: bool| {
            if done {
                ModeState::Done
            } else if progress {
                ModeState::InProgress
            } else {
                ModeState::NotStarted
            }
        };
        Self {
            online,
            finish_line: state(event.finish_line_done, event.has_finish_line_progress()),
            chute: state(event.chute_done, event.has_chute_progress()),
            remote_has_times: false,
            reconciled: event.finish_line_done && event.chute_done,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn state(&self, mode: Mode) -> ModeState {
        match mode {
            Mode::FinishLine => self.finish_line,
            Mode::Chute => self.chute,
        }
    }

    pub fn is_reconciled(&self) -> bool {
        self.reconciled
    }

    /// Record whether the remote store currently holds finish times.
    pub fn observe_remote_times(&mut self, has_times: bool) {
        self.remote_has_times = has_times;
    }

    /// Check whether `screen` may be entered now.
    pub fn check(&self, screen: Screen) -> Result<(), GateBlock> {
        match screen {
            Screen::FinishLine => {
                if self.finish_line == ModeState::Done {
                    Err(GateBlock::FinishLineDone)
                } else if self.chute == ModeState::Done {
                    Err(GateBlock::ChuteDone)
                } else if self.chute == ModeState::InProgress {
                    Err(GateBlock::ChuteInProgress)
                } else if self.online && self.remote_has_times {
                    Err(GateBlock::RemoteHasTimes)
                } else {
                    Ok(())
                }
            }
            Screen::Chute => {
                if self.chute == ModeState::Done {
                    Err(GateBlock::ChuteDone)
                } else if self.finish_line == ModeState::InProgress {
                    Err(GateBlock::FinishLineInProgress)
                } else if !self.online && self.finish_line != ModeState::Done {
                    Err(GateBlock::FinishLineNotDone)
                } else {
                    Ok(())
                }
            }
            Screen::Results => {
                if self.finish_line == ModeState::InProgress
                    || self.chute == ModeState::InProgress
                {
                    Err(GateBlock::UnsavedProgress)
                } else if !self.online && self.finish_line != ModeState::Done {
                    Err(GateBlock::FinishLineNotDone)
                } else {
                    Ok(())
                }
            }
        }
    }

    pub fn can_enter(&self, screen: Screen) -> bool {
        self.check(screen).is_ok()
    }

    /// Enter a mode's screen, moving it to `InProgress` if it had not started.
    pub fn begin(&mut self, mode: Mode) -> Result<ModeState, GateBlock> {
        self.check(mode.into())?;
        let state = self.state_mut(mode);
        if *state == ModeState::NotStarted {
            *state = ModeState::InProgress;
        }
        Ok(*state)
    }

    /// The mode's own save step completed.
    pub fn complete(&mut self, mode: Mode) {
        *self.state_mut(mode) = ModeState::Done;
    }

    /// A commit from the results screen succeeded.
    pub fn mark_reconciled(&mut self) {
        self.finish_line = ModeState::Done;
        self.chute = ModeState::Done;
        self.reconciled = true;
    }

    /// Everything was deleted from the results screen.
    pub fn reset_all(&mut self) {
        self.finish_line = ModeState::NotStarted;
        self.chute = ModeState::NotStarted;
        self.reconciled = false;
    }

    fn state_mut(&mut self, mode: Mode) -> &mut ModeState {
        match mode {
            Mode::FinishLine => &mut self.finish_line,
            Mode::Chute => &mut self.chute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_online_event() {
        let gate = ModeGate::new(true);
        assert!(gate.can_enter(Screen::FinishLine));
        assert!(gate.can_enter(Screen::Chute));
        assert!(gate.can_enter(Screen::Results));
    }

    #[test]
    fn offline_chute_waits_for_finish_line() {
        let mut gate = ModeGate::new(false);
        assert_eq!(gate.check(Screen::Chute), Err(GateBlock::FinishLineNotDone));
        assert_eq!(gate.check(Screen::Results), Err(GateBlock::FinishLineNotDone));

        gate.begin(Mode::FinishLine).unwrap();
        assert_eq!(gate.check(Screen::Chute), Err(GateBlock::FinishLineInProgress));

        gate.complete(Mode::FinishLine);
        assert_eq!(gate.check(Screen::Chute), Ok(()));
        assert_eq!(gate.check(Screen::FinishLine), Err(GateBlock::FinishLineDone));
    }

    #[test]
    fn chute_in_progress_blocks_finish_line() {
        let mut gate = ModeGate::new(true);
        assert_eq!(gate.begin(Mode::Chute), Ok(ModeState::InProgress));
        assert_eq!(gate.check(Screen::FinishLine), Err(GateBlock::ChuteInProgress));
        assert_eq!(gate.check(Screen::Results), Err(GateBlock::UnsavedProgress));

        gate.complete(Mode::Chute);
        assert_eq!(gate.check(Screen::FinishLine), Err(GateBlock::ChuteDone));
        assert_eq!(gate.check(Screen::Chute), Err(GateBlock::ChuteDone));
    }

    #[test]
    fn remote_times_block_finish_line_online_only() {
        let mut online = ModeGate::new(true);
        online.observe_remote_times(true);
        assert_eq!(online.check(Screen::FinishLine), Err(GateBlock::RemoteHasTimes));

        let mut offline = ModeGate::new(false);
        offline.observe_remote_times(true);
        assert_eq!(offline.check(Screen::FinishLine), Ok(()));
    }

    #[test]
    fn begin_is_idempotent_while_in_progress() {
        let mut gate = ModeGate::new(true);
        gate.begin(Mode::FinishLine).unwrap();
        assert_eq!(gate.begin(Mode::FinishLine), Ok(ModeState::InProgress));
    }

    #[test]
    fn derived_from_event_data() {
        let mut event = EventData::new();
        event.start(0);
        let gate = ModeGate::from_event(&event, false);
        assert_eq!(gate.state(Mode::FinishLine), ModeState::InProgress);
        assert_eq!(gate.state(Mode::Chute), ModeState::NotStarted);

        event.set_done(true);
        let gate = ModeGate::from_event(&event, false);
        assert_eq!(gate.state(Mode::FinishLine), ModeState::Done);
        assert_eq!(gate.state(Mode::Chute), ModeState::Done);
        assert!(gate.is_reconciled());
    }

    #[test]
    fn resolved_bibs_do_not_block_results() {
        let mut event = EventData {
            chute_bibs: vec![201, 202],
            chute_done: true,
            ..EventData::default()
        };
        event.persist_resolution(0, 101);

        let gate = ModeGate::from_event(&event, true);
        assert_eq!(gate.state(Mode::FinishLine), ModeState::NotStarted);
        assert_eq!(gate.check(Screen::Results), Ok(()));
    }

    #[test]
    fn reconcile_then_delete_all() {
        let mut gate = ModeGate::new(true);
        gate.mark_reconciled();
        assert!(gate.is_reconciled());
        assert!(!gate.can_enter(Screen::FinishLine));
        assert!(gate.can_enter(Screen::Results));

        gate.reset_all();
        assert!(!gate.is_reconciled());
        assert_eq!(gate.state(Mode::Chute), ModeState::NotStarted);
        assert!(gate.can_enter(Screen::FinishLine));
    }
}
