use serde::{Deserialize, Serialize};

use crate::timer::{TimerState, MS_PER_MINUTE};

/// The most recent chime: which countdown it belonged to and at which
/// elapsed minute it rang. Persisted so short-lived processes share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChimeMark {
    pub started_at: u64,
    pub minute: u64,
}

/// Decides when the periodic chime is due.
///
/// A chime is due at every whole elapsed minute since the countdown started
/// that is a non-zero multiple of the interval. Each (countdown, minute) pair
/// chimes at most once no matter how often it is polled.
#[derive(Debug, Clone)]
pub struct ChimeTracker {
    interval_min: u64,
    last: Option<ChimeMark>,
}

impl ChimeTracker {
    pub fn new(interval_min: u64) -> Self {
        Self {
            interval_min,
            last: None,
        }
    }

    /// Continue from a mark left by an earlier process.
    pub fn resume(mut self, last: Option<ChimeMark>) -> Self {
        self.last = last;
        self
    }

    pub fn last(&self) -> Option<ChimeMark> {
        self.last
    }

    /// Returns the elapsed minute count when a chime is due now.
    pub fn check(&mut self, state: &TimerState, now_ms: u64) -> Option<u64> {
        let started_at = state.started_at()?;
        if self.interval_min == 0 {
            return None;
        }
        let elapsed_min = now_ms.saturating_sub(started_at) / MS_PER_MINUTE;
        if elapsed_min == 0 || elapsed_min % self.interval_min != 0 {
            return None;
        }
        let mark = ChimeMark {
            started_at,
            minute: elapsed_min,
        };
        if self.last == Some(mark) {
            return None;
        }
        self.last = Some(mark);
        Some(elapsed_min)
    }
}
