//! End-to-end timer sessions driven by a manual clock.

use pomobell_core::storage::{load_json, STATE_KEY, SETTINGS_KEY};
use pomobell_core::timer::{PersistedState, MS_PER_MINUTE};
use pomobell_core::{
    Clock, Database, Driver, Event, KeyValueStore, ManualClock, MemoryStore, Permission, Phase,
    Settings, TimerConfig, TimerHooks, TimerState,
};

const MIN: u64 = MS_PER_MINUTE;
const EPOCH: u64 = 1_700_000_000_000;
const POLL_MS: u64 = 250;

#[derive(Default)]
struct Log {
    calls: Vec<String>,
    grant: bool,
}

impl TimerHooks for Log {
    fn phase_started(&mut self, phase: Phase, _settings: &Settings) {
        self.calls.push(format!("started:{phase}"));
    }

    fn phase_ended(&mut self, phase: Phase, _settings: &Settings) {
        self.calls.push(format!("ended:{phase}"));
    }

    fn chime(&mut self, elapsed_min: u64, _settings: &Settings) {
        self.calls.push(format!("chime:{elapsed_min}"));
    }

    fn request_notifications(&mut self) -> Permission {
        if self.grant {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }
}

fn config(auto_advance: bool) -> TimerConfig {
    TimerConfig::from_minutes(25.0, 5.0, auto_advance)
}

fn memory_driver(auto_advance: bool, clock: &ManualClock) -> Driver<MemoryStore, Log> {
    Driver::restore(config(auto_advance), 5, MemoryStore::new(), Log::default(), clock.now_ms())
}

/// Poll every 250 ms up to and including `until`.
fn poll_until<S: KeyValueStore, H: TimerHooks>(
    driver: &mut Driver<S, H>,
    clock: &ManualClock,
    until: u64,
) -> Vec<Event> {
    let mut events = Vec::new();
    while clock.now_ms() < until {
        clock.advance(POLL_MS.min(until - clock.now_ms()));
        events.extend(driver.poll(clock.now_ms()));
    }
    events
}

#[test]
fn work_session_rolls_into_break() {
    let clock = ManualClock::at(EPOCH);
    let mut d = memory_driver(true, &clock);
    d.start(clock.now_ms());

    let events = poll_until(&mut d, &clock, EPOCH + 25 * MIN);

    assert_eq!(
        d.hooks().calls,
        vec![
            "started:work",
            "chime:5",
            "chime:10",
            "chime:15",
            "chime:20",
            "ended:work",
            "started:break",
        ]
    );
    let ended = events
        .iter()
        .filter(|e| matches!(e, Event::PhaseEnded { .. }))
        .count();
    assert_eq!(ended, 1);
    assert_eq!(d.state().phase(), Phase::Break);
    assert_eq!(d.state().started_at(), Some(EPOCH + 25 * MIN));
    assert_eq!(d.remaining_ms(clock.now_ms()), 5 * MIN);
}

#[test]
fn without_auto_advance_the_break_waits() {
    let clock = ManualClock::at(EPOCH);
    let mut d = memory_driver(false, &clock);
    d.start(clock.now_ms());
    poll_until(&mut d, &clock, EPOCH + 26 * MIN);

    assert_eq!(
        d.state(),
        TimerState::Idle {
            phase: Phase::Break,
            remaining_ms: 5 * MIN,
        }
    );
    assert_eq!(d.hooks().calls.last().map(String::as_str), Some("ended:work"));

    d.start(clock.now_ms());
    assert_eq!(d.hooks().calls.last().map(String::as_str), Some("started:break"));
}

#[test]
fn disabled_chime_stays_silent() {
    let clock = ManualClock::at(EPOCH);
    let mut d = memory_driver(true, &clock);
    d.set_chime(false, clock.now_ms());
    d.start(clock.now_ms());
    poll_until(&mut d, &clock, EPOCH + 11 * MIN);

    assert_eq!(d.hooks().calls, vec!["started:work"]);
}

#[test]
fn each_countdown_chimes_afresh() {
    let clock = ManualClock::at(EPOCH);
    let mut d = memory_driver(true, &clock);
    d.start(clock.now_ms());
    poll_until(&mut d, &clock, EPOCH + 6 * MIN);
    d.switch_phase(Phase::Work, clock.now_ms());
    poll_until(&mut d, &clock, EPOCH + 12 * MIN);

    let chimes: Vec<_> = d
        .hooks()
        .calls
        .iter()
        .filter(|c| c.starts_with("chime"))
        .collect();
    assert_eq!(chimes, vec!["chime:5", "chime:5"]);
}

#[test]
fn duration_change_only_lands_on_idle_current_phase() {
    let clock = ManualClock::at(EPOCH);
    let mut d = memory_driver(true, &clock);
    d.start(clock.now_ms());
    clock.advance(MIN);

    let before = d.state();
    assert!(d.set_duration(Phase::Work, 10.0, clock.now_ms()).is_empty());
    assert!(d.set_duration(Phase::Break, 10.0, clock.now_ms()).is_empty());
    assert_eq!(d.state(), before);

    d.pause(clock.now_ms());
    let events = d.set_duration(Phase::Work, 10.0, clock.now_ms());
    assert!(matches!(
        events.as_slice(),
        [Event::DurationChanged { phase: Phase::Work, duration_ms, .. }] if *duration_ms == 10 * MIN
    ));
    assert_eq!(d.remaining_ms(clock.now_ms()), 10 * MIN);
    // Break keeps its configured length.
    assert_eq!(d.engine().duration_for(Phase::Break), 5 * MIN);
}

#[test]
fn duration_for_other_phase_is_dropped_not_queued() {
    let clock = ManualClock::at(EPOCH);
    let mut d = memory_driver(false, &clock);
    d.start(clock.now_ms());
    poll_until(&mut d, &clock, EPOCH + 25 * MIN);
    assert_eq!(d.state().phase(), Phase::Break);
    assert!(!d.state().is_running());

    assert!(d.set_duration(Phase::Work, 10.0, clock.now_ms()).is_empty());
    d.reset(clock.now_ms());
    assert_eq!(d.remaining_ms(clock.now_ms()), 25 * MIN);
}

#[test]
fn reset_during_break_returns_to_idle_work() {
    let clock = ManualClock::at(EPOCH);
    let mut d = memory_driver(true, &clock);
    d.switch_phase(Phase::Break, clock.now_ms());
    poll_until(&mut d, &clock, EPOCH + 2 * MIN);

    let events = d.reset(clock.now_ms());
    assert!(matches!(events.as_slice(), [Event::TimerReset { .. }]));
    assert_eq!(
        d.state(),
        TimerState::Idle {
            phase: Phase::Work,
            remaining_ms: 25 * MIN,
        }
    );
    assert_eq!(d.hooks().calls, vec!["started:break"]);
}

#[test]
fn countdown_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pomobell.db");
    let clock = ManualClock::at(EPOCH);

    {
        let mut d = Driver::restore(
            config(true),
            5,
            Database::open_at(&path).unwrap(),
            (),
            clock.now_ms(),
        );
        d.start(clock.now_ms());
    }

    clock.advance(10 * MIN);
    {
        let d = Driver::restore(
            config(true),
            5,
            Database::open_at(&path).unwrap(),
            (),
            clock.now_ms(),
        );
        assert!(d.state().is_running());
        assert_eq!(d.remaining_ms(clock.now_ms()), 15 * MIN);
    }

    // Nobody polled while the work phase ran out.
    clock.advance(30 * MIN);
    let mut d = Driver::restore(
        config(true),
        5,
        Database::open_at(&path).unwrap(),
        (),
        clock.now_ms(),
    );
    let events = d.poll(clock.now_ms());
    assert!(matches!(
        events.as_slice(),
        [
            Event::PhaseEnded { phase: Phase::Work, .. },
            Event::PhaseStarted { phase: Phase::Break, .. },
        ]
    ));
    assert_eq!(d.state().started_at(), Some(clock.now_ms()));
    assert_eq!(d.remaining_ms(clock.now_ms()), 5 * MIN);

    let stored: PersistedState = load_json(d.store(), STATE_KEY).unwrap();
    assert_eq!(stored.phase, Phase::Break);
    assert!(stored.is_running);
}

#[test]
fn chime_rings_once_across_short_lived_processes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pomobell.db");
    let open = |now: u64| {
        Driver::restore(config(true), 5, Database::open_at(&path).unwrap(), Log::default(), now)
    };

    let mut d = open(EPOCH);
    d.start(EPOCH);
    drop(d);

    let mut chimes = 0;
    for k in 0..3 {
        let now = EPOCH + 5 * MIN + 1_000 + k * 10_000;
        let mut d = open(now);
        d.poll(now);
        chimes += d.hooks().calls.iter().filter(|c| *c == "chime:5").count();
    }
    assert_eq!(chimes, 1);

    let now = EPOCH + 10 * MIN;
    let mut d = open(now);
    d.poll(now);
    assert_eq!(d.hooks().calls, vec!["chime:10"]);
}

#[test]
fn inconsistent_record_starts_fresh() {
    let clock = ManualClock::at(EPOCH);
    for raw in [
        r#"{"phase":"work","isRunning":true,"startedAt":null,"endsAt":null,"remaining":5}"#,
        r#"{"phase":"break","isRunning":false,"startedAt":1,"endsAt":2,"remaining":5}"#,
        r#"{"phase":"nap","isRunning":false,"startedAt":null,"endsAt":null,"remaining":5}"#,
        "not json",
    ] {
        let store = MemoryStore::new();
        store.set(STATE_KEY, raw).unwrap();
        let d = Driver::restore(config(true), 5, store, (), clock.now_ms());
        assert_eq!(
            d.state(),
            TimerState::Idle {
                phase: Phase::Work,
                remaining_ms: 25 * MIN,
            },
            "record {raw}"
        );
    }
}

#[test]
fn restored_countdown_is_clamped_to_current_durations() {
    let clock = ManualClock::at(EPOCH);
    let store = MemoryStore::new();
    store
        .set(
            STATE_KEY,
            r#"{"phase":"break","isRunning":false,"startedAt":null,"endsAt":null,"remaining":2400000}"#,
        )
        .unwrap();
    let d = Driver::restore(config(true), 5, store, (), clock.now_ms());
    assert_eq!(
        d.state(),
        TimerState::Idle {
            phase: Phase::Break,
            remaining_ms: 5 * MIN,
        }
    );
}

#[test]
fn settings_persist_and_notify_needs_permission() {
    let clock = ManualClock::at(EPOCH);
    let store = MemoryStore::new();
    let granting = Log {
        grant: true,
        ..Log::default()
    };
    let mut d = Driver::restore(config(true), 5, store, granting, clock.now_ms());
    d.set_volume(0.8, clock.now_ms());
    d.set_notify(true, clock.now_ms());
    assert!(d.settings().notify_enabled);

    let saved: Settings = load_json(d.store(), SETTINGS_KEY).unwrap();
    assert!(saved.notify_enabled);
    assert!((saved.volume - 0.8).abs() < f32::EPSILON);

    // Permission was revoked between runs.
    let store = MemoryStore::new();
    store
        .set(SETTINGS_KEY, &serde_json::to_string(&saved).unwrap())
        .unwrap();
    let d = Driver::restore(config(true), 5, store, Log::default(), clock.now_ms());
    assert!(!d.settings().notify_enabled);
    assert!((d.settings().volume - 0.8).abs() < f32::EPSILON);
    let saved: Settings = load_json(d.store(), SETTINGS_KEY).unwrap();
    assert!(!saved.notify_enabled);
}
