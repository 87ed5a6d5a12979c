pub mod config;
pub mod settings;
pub mod timer;
pub mod watch;

use pomobell_core::alerts::{DesktopNotifier, SystemPlayer};
use pomobell_core::{
    AlertHooks, Clock, Config, Database, Driver, Event, KeyValueStore, MemoryStore, SystemClock,
    Tone,
};
use serde::Serialize;

pub type CliHooks = AlertHooks<SystemPlayer, DesktopNotifier>;
pub type CliDriver = Driver<Box<dyn KeyValueStore>, CliHooks>;

/// Everything a command needs: configuration, the restored driver and the
/// clock it was restored against.
pub struct Session {
    pub config: Config,
    pub driver: CliDriver,
    pub clock: SystemClock,
}

/// Load configuration and restore the timer.
///
/// Never fails: an unreadable config falls back to defaults and an
/// unavailable database to a memory-only store.
pub fn open_session() -> Session {
    let config = Config::load_or_default();
    let store: Box<dyn KeyValueStore> = match Database::open() {
        Ok(db) => Box::new(db),
        Err(e) => {
            tracing::warn!(error = %e, "database unavailable, state will not persist");
            Box::new(MemoryStore::new())
        }
    };
    let tone = Tone {
        duration_ms: config.chime.duration_ms,
        frequency_hz: config.chime.frequency_hz,
    };
    let hooks = AlertHooks::new(SystemPlayer::default(), DesktopNotifier::default(), tone);
    let clock = SystemClock;
    let driver = Driver::restore(
        config.timer_config(),
        config.chime.interval_minutes,
        store,
        hooks,
        clock.now_ms(),
    );
    Session {
        config,
        driver,
        clock,
    }
}

#[derive(Serialize)]
struct Report<'a> {
    events: &'a [Event],
    state: Event,
}

/// Print the events of a command followed by the resulting state.
pub fn print_report(
    driver: &CliDriver,
    events: &[Event],
    now_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = Report {
        events,
        state: driver.snapshot(now_ms),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
