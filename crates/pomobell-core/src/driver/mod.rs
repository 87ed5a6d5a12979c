//! Bridges real time to the timer engine.
//!
//! The [`Driver`] owns the current [`TimerState`] together with the user's
//! [`Settings`]. Every operation runs the engine, persists whatever changed
//! and then fires the hooks, in that order. The driver never looks at the
//! clock itself; callers pass `now_ms` in.

mod chime;
pub mod poll;

pub use chime::{ChimeMark, ChimeTracker};
pub use poll::{run_poll_loop, PollSummary, PollTicker};

use tracing::{debug, info, warn};

use crate::alerts::Permission;
use crate::clock::to_datetime;
use crate::events::Event;
use crate::storage::{
    clamp_volume, load_json, save_json, KeyValueStore, Settings, CHIME_KEY, SETTINGS_KEY,
    STATE_KEY,
};
use crate::timer::{format_remaining, Phase, PersistedState, TimerConfig, TimerEngine, TimerState};

/// Side-effect hook points. Every method defaults to doing nothing.
pub trait TimerHooks {
    /// A countdown began: user start from idle, phase switch, or auto-advance.
    fn phase_started(&mut self, _phase: Phase, _settings: &Settings) {}
    /// A running countdown reached zero.
    fn phase_ended(&mut self, _phase: Phase, _settings: &Settings) {}
    /// Periodic chime is due.
    fn chime(&mut self, _elapsed_min: u64, _settings: &Settings) {}
    fn request_notifications(&mut self) -> Permission {
        Permission::Denied
    }
}

impl TimerHooks for () {}

/// Operations accepted by [`Driver::apply`] and the poll loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Start,
    Pause,
    /// Start when idle, pause when running.
    Toggle,
    Reset,
    Switch(Phase),
    SetDuration(Phase, f64),
    SetChime(bool),
    ToggleChime,
    SetNotify(bool),
    SetVolume(f32),
    /// Stops the poll loop. A no-op for the driver itself.
    Shutdown,
}

/// State holder for one timer.
pub struct Driver<S, H> {
    engine: TimerEngine,
    state: TimerState,
    settings: Settings,
    store: S,
    hooks: H,
    chime: ChimeTracker,
}

impl<S: KeyValueStore, H: TimerHooks> Driver<S, H> {
    /// Load the persisted countdown and settings, reconciled against `now_ms`.
    ///
    /// A missing, unreadable or inconsistent snapshot yields a fresh Work
    /// countdown. A stored notification toggle is re-checked against the
    /// host and switched off if permission is no longer granted.
    pub fn restore(
        config: TimerConfig,
        chime_interval_min: u64,
        store: S,
        mut hooks: H,
        now_ms: u64,
    ) -> Self {
        let engine = TimerEngine::new(config);
        let state = match load_json::<PersistedState>(&store, STATE_KEY) {
            Some(record) => match TimerState::from_persisted(&record) {
                Some(state) => engine.conform(&state),
                None => {
                    warn!(?record, "stored countdown is inconsistent, starting fresh");
                    engine.fresh()
                }
            },
            None => engine.fresh(),
        };

        let mut settings = load_json::<Settings>(&store, SETTINGS_KEY)
            .unwrap_or_default()
            .sanitized();
        let mut settings_dirty = false;
        if settings.notify_enabled && hooks.request_notifications() != Permission::Granted {
            info!("notification permission lost, disabling notifications");
            settings.notify_enabled = false;
            settings_dirty = true;
        }

        info!(
            phase = %state.phase(),
            running = state.is_running(),
            remaining_ms = engine.remaining(&state, now_ms),
            "timer restored"
        );

        let last_chime = load_json::<ChimeMark>(&store, CHIME_KEY);
        let chime = ChimeTracker::new(chime_interval_min).resume(last_chime);
        let driver = Self {
            engine,
            state,
            settings,
            store,
            hooks,
            chime,
        };
        driver.persist_state(now_ms);
        if settings_dirty {
            driver.persist_settings();
        }
        driver
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.engine.remaining(&self.state, now_ms)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now_ms: u64) -> Event {
        let remaining_ms = self.remaining_ms(now_ms);
        Event::StateSnapshot {
            phase: self.state.phase(),
            running: self.state.is_running(),
            remaining_ms,
            formatted: format_remaining(remaining_ms),
            started_at_ms: self.state.started_at(),
            ends_at_ms: self.state.ends_at(),
            auto_advance: self.engine.config().auto_advance(),
            at: to_datetime(now_ms),
        }
    }

    // ── Timer commands ───────────────────────────────────────────────

    pub fn start(&mut self, now_ms: u64) -> Vec<Event> {
        let was_running = self.state.is_running();
        let next = self.engine.start(&self.state, now_ms);
        self.commit(next, now_ms);
        if was_running {
            return Vec::new();
        }
        vec![self.announce_start(now_ms)]
    }

    pub fn pause(&mut self, now_ms: u64) -> Vec<Event> {
        if !self.state.is_running() {
            return Vec::new();
        }
        let next = self.engine.pause(&self.state, now_ms);
        self.commit(next, now_ms);
        vec![Event::TimerPaused {
            phase: next.phase(),
            remaining_ms: next.remaining_at(now_ms),
            at: to_datetime(now_ms),
        }]
    }

    pub fn toggle(&mut self, now_ms: u64) -> Vec<Event> {
        if self.state.is_running() {
            self.pause(now_ms)
        } else {
            self.start(now_ms)
        }
    }

    pub fn reset(&mut self, now_ms: u64) -> Vec<Event> {
        let next = self.engine.reset();
        self.commit(next, now_ms);
        vec![Event::TimerReset {
            at: to_datetime(now_ms),
        }]
    }

    pub fn switch_phase(&mut self, target: Phase, now_ms: u64) -> Vec<Event> {
        let next = self.engine.switch_phase(target, now_ms);
        self.commit(next, now_ms);
        vec![self.announce_start(now_ms)]
    }

    /// Change a phase duration. Dropped unless `phase` is current and idle.
    pub fn set_duration(&mut self, phase: Phase, minutes: f64, now_ms: u64) -> Vec<Event> {
        let applies = !self.state.is_running() && self.state.phase() == phase;
        let next = self.engine.set_duration(&self.state, phase, minutes);
        if !applies {
            debug!(%phase, minutes, "duration change ignored");
            return Vec::new();
        }
        self.commit(next, now_ms);
        vec![Event::DurationChanged {
            phase,
            duration_ms: self.engine.duration_for(phase),
            at: to_datetime(now_ms),
        }]
    }

    /// Reconcile with the clock. Call periodically while running.
    ///
    /// A crossed boundary yields exactly one `PhaseEnded` followed, when
    /// auto-advancing, by exactly one `PhaseStarted`.
    pub fn poll(&mut self, now_ms: u64) -> Vec<Event> {
        let (next, boundary) = self.engine.tick(&self.state, now_ms);
        self.commit(next, now_ms);

        let mut events = Vec::new();
        if let Some(boundary) = boundary {
            self.hooks.phase_ended(boundary.ended, &self.settings);
            events.push(Event::PhaseEnded {
                phase: boundary.ended,
                at: to_datetime(now_ms),
            });
            if boundary.started.is_some() {
                events.push(self.announce_start(now_ms));
            }
        }

        if self.settings.chime_enabled {
            if let Some(elapsed_min) = self.chime.check(&self.state, now_ms) {
                debug!(elapsed_min, "chime");
                if let Some(mark) = self.chime.last() {
                    save_json(&self.store, CHIME_KEY, &mark);
                }
                self.hooks.chime(elapsed_min, &self.settings);
                events.push(Event::Chime {
                    elapsed_min,
                    at: to_datetime(now_ms),
                });
            }
        }
        events
    }

    // ── Settings commands ────────────────────────────────────────────

    pub fn set_chime(&mut self, enabled: bool, now_ms: u64) -> Vec<Event> {
        self.settings.chime_enabled = enabled;
        self.settings_changed(now_ms)
    }

    pub fn toggle_chime(&mut self, now_ms: u64) -> Vec<Event> {
        self.set_chime(!self.settings.chime_enabled, now_ms)
    }

    /// Enabling asks the host for permission; anything short of `Granted`
    /// leaves notifications off.
    pub fn set_notify(&mut self, enabled: bool, now_ms: u64) -> Vec<Event> {
        self.settings.notify_enabled =
            enabled && self.hooks.request_notifications() == Permission::Granted;
        if enabled && !self.settings.notify_enabled {
            info!("notification permission not granted");
        }
        self.settings_changed(now_ms)
    }

    pub fn set_volume(&mut self, volume: f32, now_ms: u64) -> Vec<Event> {
        self.settings.volume = clamp_volume(volume);
        self.settings_changed(now_ms)
    }

    /// Dispatch a [`Command`].
    pub fn apply(&mut self, command: Command, now_ms: u64) -> Vec<Event> {
        match command {
            Command::Start => self.start(now_ms),
            Command::Pause => self.pause(now_ms),
            Command::Toggle => self.toggle(now_ms),
            Command::Reset => self.reset(now_ms),
            Command::Switch(phase) => self.switch_phase(phase, now_ms),
            Command::SetDuration(phase, minutes) => self.set_duration(phase, minutes, now_ms),
            Command::SetChime(enabled) => self.set_chime(enabled, now_ms),
            Command::ToggleChime => self.toggle_chime(now_ms),
            Command::SetNotify(enabled) => self.set_notify(enabled, now_ms),
            Command::SetVolume(volume) => self.set_volume(volume, now_ms),
            Command::Shutdown => Vec::new(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Replace the state wholesale and persist it if it changed.
    fn commit(&mut self, next: TimerState, now_ms: u64) {
        if next == self.state {
            return;
        }
        debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
        self.persist_state(now_ms);
    }

    fn announce_start(&mut self, now_ms: u64) -> Event {
        let phase = self.state.phase();
        self.hooks.phase_started(phase, &self.settings);
        Event::PhaseStarted {
            phase,
            remaining_ms: self.remaining_ms(now_ms),
            at: to_datetime(now_ms),
        }
    }

    fn settings_changed(&mut self, now_ms: u64) -> Vec<Event> {
        self.persist_settings();
        vec![Event::SettingsChanged {
            chime_enabled: self.settings.chime_enabled,
            notify_enabled: self.settings.notify_enabled,
            volume: self.settings.volume,
            at: to_datetime(now_ms),
        }]
    }

    fn persist_state(&self, now_ms: u64) {
        save_json(&self.store, STATE_KEY, &self.state.to_persisted(now_ms));
    }

    fn persist_settings(&self) {
        save_json(&self.store, SETTINGS_KEY, &self.settings);
    }
}
