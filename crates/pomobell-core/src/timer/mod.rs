mod engine;
mod format;
mod phase;
mod state;

pub use engine::{Boundary, TimerEngine};
pub use format::format_remaining;
pub use phase::{minutes_to_ms, Phase, TimerConfig, MAX_MINUTES, MS_PER_MINUTE};
pub use state::{PersistedState, TimerState};
