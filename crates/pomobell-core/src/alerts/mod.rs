//! Side effects attached to the driver's hook points.

mod audio;
mod notify;

pub use audio::{BellPlayer, ChimePlayer, SilentPlayer, SystemPlayer, Tone};
#[cfg(feature = "audio")]
pub use audio::TonePlayer;
pub use notify::{DesktopNotifier, Notifier, NullNotifier, Permission};

use crate::driver::TimerHooks;
use crate::storage::Settings;
use crate::timer::Phase;

pub fn start_message(phase: Phase) -> (&'static str, &'static str) {
    match phase {
        Phase::Work => ("Work session started", "Timer is running."),
        Phase::Break => ("Break started", "Timer is running."),
    }
}

pub fn end_message(phase: Phase) -> (&'static str, &'static str) {
    match phase {
        Phase::Work => ("Work complete", "Session finished."),
        Phase::Break => ("Break complete", "Session finished."),
    }
}

/// Chime and notification side effects, gated by the user's settings.
#[derive(Debug, Clone)]
pub struct AlertHooks<P, N> {
    player: P,
    notifier: N,
    chime_tone: Tone,
}

impl<P: ChimePlayer, N: Notifier> AlertHooks<P, N> {
    pub fn new(player: P, notifier: N, chime_tone: Tone) -> Self {
        Self {
            player,
            notifier,
            chime_tone,
        }
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}

impl<P: ChimePlayer, N: Notifier> TimerHooks for AlertHooks<P, N> {
    fn phase_started(&mut self, phase: Phase, settings: &Settings) {
        if settings.notify_enabled {
            let (title, body) = start_message(phase);
            self.notifier.send(title, body);
        }
    }

    fn phase_ended(&mut self, phase: Phase, settings: &Settings) {
        if settings.notify_enabled {
            let (title, body) = end_message(phase);
            self.notifier.send(title, body);
        }
    }

    fn chime(&mut self, _elapsed_min: u64, settings: &Settings) {
        self.player.set_volume(settings.volume);
        self.player.play(self.chime_tone);
    }

    fn request_notifications(&mut self) -> Permission {
        self.notifier.request_permission()
    }
}
