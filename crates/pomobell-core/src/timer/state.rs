use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// Countdown state.
///
/// A running countdown is described entirely by its absolute timestamps;
/// the remaining time is derived from `ends_at_ms` whenever it is read.
/// An idle countdown carries its remaining time directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle {
        phase: Phase,
        remaining_ms: u64,
    },
    Running {
        phase: Phase,
        started_at_ms: u64,
        ends_at_ms: u64,
    },
}

impl TimerState {
    pub fn phase(&self) -> Phase {
        match *self {
            TimerState::Idle { phase, .. } | TimerState::Running { phase, .. } => phase,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Running { .. })
    }

    pub fn started_at(&self) -> Option<u64> {
        match *self {
            TimerState::Running { started_at_ms, .. } => Some(started_at_ms),
            TimerState::Idle { .. } => None,
        }
    }

    pub fn ends_at(&self) -> Option<u64> {
        match *self {
            TimerState::Running { ends_at_ms, .. } => Some(ends_at_ms),
            TimerState::Idle { .. } => None,
        }
    }

    /// Remaining time as of `now_ms`, never negative.
    pub fn remaining_at(&self, now_ms: u64) -> u64 {
        match *self {
            TimerState::Idle { remaining_ms, .. } => remaining_ms,
            TimerState::Running { ends_at_ms, .. } => ends_at_ms.saturating_sub(now_ms),
        }
    }

    /// Flatten into the on-disk record.
    pub fn to_persisted(&self, now_ms: u64) -> PersistedState {
        PersistedState {
            phase: self.phase(),
            is_running: self.is_running(),
            started_at: self.started_at(),
            ends_at: self.ends_at(),
            remaining: self.remaining_at(now_ms),
        }
    }

    /// Rebuild from the on-disk record.
    ///
    /// Returns `None` when the running flag and the timestamps disagree, or
    /// when the countdown would end before it started.
    pub fn from_persisted(record: &PersistedState) -> Option<Self> {
        match (record.is_running, record.started_at, record.ends_at) {
            (true, Some(started_at_ms), Some(ends_at_ms)) if ends_at_ms >= started_at_ms => {
                Some(TimerState::Running {
                    phase: record.phase,
                    started_at_ms,
                    ends_at_ms,
                })
            }
            (false, None, None) => Some(TimerState::Idle {
                phase: record.phase,
                remaining_ms: record.remaining,
            }),
            _ => None,
        }
    }
}

/// Serializable snapshot, stored as JSON in the key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub phase: Phase,
    pub is_running: bool,
    /// Epoch milliseconds.
    pub started_at: Option<u64>,
    /// Epoch milliseconds.
    pub ends_at: Option<u64>,
    /// Milliseconds; derived when running.
    pub remaining: u64,
}
