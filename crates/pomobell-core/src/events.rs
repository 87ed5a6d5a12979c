use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change the driver makes produces an Event.
/// The CLI prints them; hooks are fired alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PhaseStarted {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    PhaseEnded {
        phase: Phase,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    DurationChanged {
        phase: Phase,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    /// Periodic chime while a countdown is running.
    Chime {
        elapsed_min: u64,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        chime_enabled: bool,
        notify_enabled: bool,
        volume: f32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        running: bool,
        remaining_ms: u64,
        /// `MM:SS`, seconds rounded up.
        formatted: String,
        started_at_ms: Option<u64>,
        ends_at_ms: Option<u64>,
        auto_advance: bool,
        at: DateTime<Utc>,
    },
}
