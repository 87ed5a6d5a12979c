//! Timer engine implementation.
//!
//! The engine is a pure wall-clock state machine. It holds no timers and
//! performs no I/O: every operation takes the current state and the current
//! time and hands back the next state. The caller decides how often to call
//! `tick()`.
//!
//! ## State Transitions
//!
//! ```text
//! Idle(phase) --start--> Running(phase) --pause--> Idle(phase)
//! Running(phase) --tick at zero--> Running(next) | Idle(next)
//! any --reset--> Idle(Work)      any --switch_phase(p)--> Running(p)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let engine = TimerEngine::new(TimerConfig::default());
//! let mut state = engine.start(&engine.fresh(), now_ms);
//! // In a loop:
//! let (next, boundary) = engine.tick(&state, now_ms);
//! state = next;
//! ```

use tracing::info;

use super::phase::{minutes_to_ms, Phase, TimerConfig};
use super::state::TimerState;

/// What happened when a running countdown reached zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub ended: Phase,
    /// Set when auto-advance started the next phase running.
    pub started: Option<Phase>,
}

/// Core timer engine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    config: TimerConfig,
}

impl TimerEngine {
    pub fn new(config: TimerConfig) -> Self {
        Self { config }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn duration_for(&self, phase: Phase) -> u64 {
        self.config.duration_for(phase)
    }

    /// A fresh session: Work, full duration, not running.
    pub fn fresh(&self) -> TimerState {
        self.idle_at_full(Phase::Work)
    }

    /// Remaining time clamped into `[0, duration_for(phase)]`.
    pub fn remaining(&self, state: &TimerState, now_ms: u64) -> u64 {
        state
            .remaining_at(now_ms)
            .min(self.duration_for(state.phase()))
    }

    /// Bring a state restored from an earlier process in line with the
    /// current durations.
    ///
    /// Countdowns longer than the phase now allows are shortened; the start
    /// timestamp is kept.
    pub fn conform(&self, state: &TimerState) -> TimerState {
        let limit = self.duration_for(state.phase());
        match *state {
            TimerState::Idle {
                phase,
                remaining_ms,
            } => TimerState::Idle {
                phase,
                remaining_ms: remaining_ms.min(limit),
            },
            TimerState::Running {
                phase,
                started_at_ms,
                ends_at_ms,
            } => TimerState::Running {
                phase,
                started_at_ms,
                ends_at_ms: ends_at_ms.min(started_at_ms.saturating_add(limit)),
            },
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start counting down. Already-running states are returned unchanged.
    ///
    /// A countdown that sits at zero without having rolled over restarts
    /// the current phase at its full duration.
    pub fn start(&self, state: &TimerState, now_ms: u64) -> TimerState {
        match *state {
            TimerState::Running { .. } => *state,
            TimerState::Idle {
                phase,
                remaining_ms,
            } => {
                let remaining = if remaining_ms > 0 {
                    remaining_ms.min(self.duration_for(phase))
                } else {
                    self.duration_for(phase)
                };
                TimerState::Running {
                    phase,
                    started_at_ms: now_ms,
                    ends_at_ms: now_ms.saturating_add(remaining),
                }
            }
        }
    }

    /// Freeze the countdown. Idle states are returned unchanged.
    pub fn pause(&self, state: &TimerState, now_ms: u64) -> TimerState {
        match *state {
            TimerState::Idle { .. } => *state,
            TimerState::Running { phase, .. } => TimerState::Idle {
                phase,
                remaining_ms: self.remaining(state, now_ms),
            },
        }
    }

    /// Back to an idle Work phase at full duration, whatever the phase was.
    pub fn reset(&self) -> TimerState {
        self.fresh()
    }

    /// Start `target` running at full duration.
    pub fn switch_phase(&self, target: Phase, now_ms: u64) -> TimerState {
        self.running_at_full(target, now_ms)
    }

    /// Reconcile a running countdown with the clock.
    ///
    /// Returns the boundary when the countdown has reached zero. At most one
    /// boundary is crossed per call: a phase that ran out while nobody was
    /// polling starts its successor at `now_ms`, not at the old `ends_at`.
    pub fn tick(&self, state: &TimerState, now_ms: u64) -> (TimerState, Option<Boundary>) {
        let TimerState::Running { phase, .. } = *state else {
            return (*state, None);
        };
        if self.remaining(state, now_ms) > 0 {
            return (*state, None);
        }

        let next = phase.opposite();
        info!(ended = %phase, next = %next, auto_advance = self.config.auto_advance(), "phase boundary");
        if self.config.auto_advance() {
            (
                self.running_at_full(next, now_ms),
                Some(Boundary {
                    ended: phase,
                    started: Some(next),
                }),
            )
        } else {
            (
                self.idle_at_full(next),
                Some(Boundary {
                    ended: phase,
                    started: None,
                }),
            )
        }
    }

    /// Change the duration of `phase`.
    ///
    /// Only takes effect when `phase` is current and idle. In every other
    /// case nothing changes, including the configured duration: the value
    /// is dropped rather than remembered for later.
    pub fn set_duration(&mut self, state: &TimerState, phase: Phase, minutes: f64) -> TimerState {
        match *state {
            TimerState::Idle { phase: current, .. } if current == phase => {
                let ms = minutes_to_ms(minutes);
                self.config.set_duration_ms(phase, ms);
                TimerState::Idle {
                    phase,
                    remaining_ms: ms,
                }
            }
            _ => *state,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn idle_at_full(&self, phase: Phase) -> TimerState {
        TimerState::Idle {
            phase,
            remaining_ms: self.duration_for(phase),
        }
    }

    fn running_at_full(&self, phase: Phase, now_ms: u64) -> TimerState {
        TimerState::Running {
            phase,
            started_at_ms: now_ms,
            ends_at_ms: now_ms.saturating_add(self.duration_for(phase)),
        }
    }
}
