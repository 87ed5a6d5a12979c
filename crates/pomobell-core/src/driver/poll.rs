//! The periodic poll loop.
//!
//! One task serializes both user commands and poll ticks, so operations
//! apply strictly in arrival order. The ticker only exists while a
//! countdown runs; an idle timer waits on the command channel alone.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use super::{Command, Driver, TimerHooks};
use crate::clock::Clock;
use crate::events::Event;
use crate::storage::KeyValueStore;
use crate::timer::TimerState;

/// Hard cap on the poll interval.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Interval ticker bound to one countdown, identified by its end time.
///
/// Dropping the ticker stops polling for that countdown.
pub struct PollTicker {
    ends_at_ms: u64,
    interval: Interval,
}

impl PollTicker {
    fn acquire(ends_at_ms: u64, every: Duration) -> Self {
        debug!(ends_at_ms, every_ms = every.as_millis() as u64, "poll ticker acquired");
        let mut interval = interval_at(Instant::now() + every, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            ends_at_ms,
            interval,
        }
    }

    pub fn ends_at_ms(&self) -> u64 {
        self.ends_at_ms
    }
}

impl Drop for PollTicker {
    fn drop(&mut self) {
        debug!(ends_at_ms = self.ends_at_ms, "poll ticker released");
    }
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub polls: u64,
    pub commands: u64,
    pub tickers_acquired: u64,
    pub tickers_released: u64,
}

/// Owns the optional ticker and keeps it in step with the timer state.
struct TickerSlot {
    every: Duration,
    ticker: Option<PollTicker>,
    acquired: u64,
    released: u64,
}

impl TickerSlot {
    fn new(every: Duration) -> Self {
        Self {
            every,
            ticker: None,
            acquired: 0,
            released: 0,
        }
    }

    /// Running states need a ticker for their `ends_at`; a changed
    /// `ends_at` replaces it; idle states have none.
    fn sync(&mut self, state: &TimerState) {
        let wanted = state.ends_at();
        if self.ticker.as_ref().map(PollTicker::ends_at_ms) == wanted {
            return;
        }
        self.release();
        if let Some(ends_at_ms) = wanted {
            self.ticker = Some(PollTicker::acquire(ends_at_ms, self.every));
            self.acquired += 1;
        }
    }

    fn release(&mut self) {
        if self.ticker.take().is_some() {
            self.released += 1;
        }
    }

    async fn tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

/// Drive `driver` until the command channel closes or `Command::Shutdown`
/// arrives.
///
/// `observe` sees the driver and the events of every processed command and
/// every poll tick, including ticks that produced no events.
pub async fn run_poll_loop<S, H, C, F>(
    driver: &mut Driver<S, H>,
    clock: &C,
    mut commands: mpsc::Receiver<Command>,
    every: Duration,
    mut observe: F,
) -> PollSummary
where
    S: KeyValueStore,
    H: TimerHooks,
    C: Clock,
    F: FnMut(&Driver<S, H>, &[Event], u64),
{
    let every = every.clamp(Duration::from_millis(1), MAX_POLL_INTERVAL);
    let mut slot = TickerSlot::new(every);
    let mut summary = PollSummary::default();

    slot.sync(&driver.state());
    loop {
        let events = tokio::select! {
            command = commands.recv() => match command {
                None | Some(Command::Shutdown) => break,
                Some(command) => {
                    summary.commands += 1;
                    // A boundary that passed since the last tick lands first.
                    let now = clock.now_ms();
                    let mut events = driver.poll(now);
                    events.extend(driver.apply(command, now));
                    events
                }
            },
            () = slot.tick() => {
                summary.polls += 1;
                driver.poll(clock.now_ms())
            }
        };
        observe(driver, &events, clock.now_ms());
        slot.sync(&driver.state());
    }
    slot.release();

    summary.tickers_acquired = slot.acquired;
    summary.tickers_released = slot.released;
    debug!(?summary, "poll loop stopped");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::Permission;
    use crate::storage::{MemoryStore, Settings};
    use crate::timer::{Phase, TimerConfig, MS_PER_MINUTE};

    const MIN: u64 = MS_PER_MINUTE;
    const EPOCH: u64 = 1_700_000_000_000;

    /// Wall clock that follows tokio's (paused) test clock.
    struct TokioClock {
        origin: Instant,
    }

    impl Clock for TokioClock {
        fn now_ms(&self) -> u64 {
            EPOCH + self.origin.elapsed().as_millis() as u64
        }
    }

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl TimerHooks for Recorder {
        fn phase_started(&mut self, phase: Phase, _settings: &Settings) {
            self.0.push(format!("started:{phase}"));
        }

        fn phase_ended(&mut self, phase: Phase, _settings: &Settings) {
            self.0.push(format!("ended:{phase}"));
        }

        fn chime(&mut self, elapsed_min: u64, _settings: &Settings) {
            self.0.push(format!("chime:{elapsed_min}"));
        }

        fn request_notifications(&mut self) -> Permission {
            Permission::Denied
        }
    }

    fn driver(work: f64, brk: f64, auto_advance: bool) -> Driver<MemoryStore, Recorder> {
        Driver::restore(
            TimerConfig::from_minutes(work, brk, auto_advance),
            5,
            MemoryStore::new(),
            Recorder::default(),
            EPOCH,
        )
    }

    fn shutdown_after(tx: mpsc::Sender<Command>, after: Duration) {
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(Command::Shutdown).await;
        });
    }

    #[tokio::test(start_paused = true)]
    async fn runs_to_boundary_then_stops_polling() {
        let clock = TokioClock {
            origin: Instant::now(),
        };
        let mut d = driver(6.0, 1.0, false);
        let (tx, rx) = mpsc::channel(8);
        tx.send(Command::Start).await.unwrap();
        shutdown_after(tx, Duration::from_secs(20 * 60));

        let summary = run_poll_loop(&mut d, &clock, rx, Duration::from_millis(250), |_, _, _| {}).await;

        assert_eq!(d.hooks().0, vec!["started:work", "chime:5", "ended:work"]);
        assert_eq!(d.state().phase(), Phase::Break);
        assert!(!d.state().is_running());
        assert_eq!(summary.tickers_acquired, 1);
        assert_eq!(summary.tickers_released, 1);
        // No idle polling once the boundary left the timer idle.
        assert!(summary.polls <= 6 * 60 * 4 + 1, "polled {} times", summary.polls);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_advance_reacquires_ticker() {
        let clock = TokioClock {
            origin: Instant::now(),
        };
        let mut d = driver(2.0, 1.0, true);
        let (tx, rx) = mpsc::channel(8);
        tx.send(Command::Start).await.unwrap();
        shutdown_after(tx, Duration::from_millis(3 * MIN + 500));

        let summary = run_poll_loop(&mut d, &clock, rx, Duration::from_millis(250), |_, _, _| {}).await;

        assert_eq!(
            d.hooks().0,
            vec!["started:work", "ended:work", "started:break", "ended:break", "started:work"]
        );
        assert!(d.state().is_running());
        assert_eq!(summary.tickers_acquired, 3);
        assert_eq!(summary.tickers_released, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_and_pause_release_ticker() {
        let clock = TokioClock {
            origin: Instant::now(),
        };
        let mut d = driver(25.0, 5.0, true);
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            tx.send(Command::Start).await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
            tx.send(Command::Pause).await.unwrap();
            tokio::time::sleep(Duration::from_secs(600)).await;
            tx.send(Command::Start).await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
            tx.send(Command::Reset).await.unwrap();
            // Dropping the sender ends the loop.
        });

        let mut remaining_seen = Vec::new();
        let summary = run_poll_loop(&mut d, &clock, rx, Duration::from_millis(250), |d, events, now| {
            if !events.is_empty() {
                remaining_seen.push(d.remaining_ms(now));
            }
        })
        .await;

        assert_eq!(summary.commands, 4);
        assert_eq!(summary.tickers_acquired, 2);
        assert_eq!(summary.tickers_released, 2);
        assert_eq!(remaining_seen, vec![25 * MIN, 24 * MIN, 24 * MIN, 25 * MIN]);
        // Ten idle minutes produced no polls.
        assert!(summary.polls <= 2 * 60 * 4 + 2, "polled {} times", summary.polls);
    }

    #[tokio::test(start_paused = true)]
    async fn command_between_ticks_sees_boundary_first() {
        let clock = TokioClock {
            origin: Instant::now(),
        };
        let mut d = driver(1.0, 1.0, false);
        let (tx, rx) = mpsc::channel(8);
        tx.send(Command::Start).await.unwrap();
        tokio::spawn(async move {
            // Ticks land at multiples of 700 ms: 59.5 s, then 60.2 s.
            tokio::time::sleep(Duration::from_millis(60_100)).await;
            tx.send(Command::Pause).await.unwrap();
        });

        run_poll_loop(&mut d, &clock, rx, Duration::from_millis(700), |_, _, _| {}).await;

        assert_eq!(d.hooks().0, vec!["started:work", "ended:work"]);
        assert_eq!(
            d.state(),
            TimerState::Idle {
                phase: Phase::Break,
                remaining_ms: MIN,
            }
        );
    }
}
