//! Foreground countdown with keyboard shortcuts.
//!
//! Keys are read line by line from stdin: Enter/space/`s` start or pause,
//! `r` resets, `w`/`b` switch phase, `c` toggles the chime, `q` quits.

use std::io::Write;
use std::time::Duration;

use pomobell_core::driver::poll::MAX_POLL_INTERVAL;
use pomobell_core::{
    format_remaining, run_poll_loop, Clock, Command, Driver, Event, KeyValueStore, Phase,
    TimerHooks, ValidationError,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::open_session;

const HELP: &str = "keys: [enter] start/pause  r reset  w work  b break  c chime  q quit";

/// Map one line of keyboard input to a command.
pub fn key_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "space" | "p" => Some(Command::Toggle),
        "r" => Some(Command::Reset),
        "w" => Some(Command::Switch(Phase::Work)),
        "b" => Some(Command::Switch(Phase::Break)),
        "c" => Some(Command::ToggleChime),
        "q" | "quit" | "exit" => Some(Command::Shutdown),
        _ => None,
    }
}

pub fn run(interval_ms: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(ms) = interval_ms {
        if ms == 0 || Duration::from_millis(ms) > MAX_POLL_INTERVAL {
            return Err(ValidationError::OutOfRange {
                field: "interval_ms".into(),
                message: format!("{ms} is not between 1 and 1000"),
            }
            .into());
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(watch(interval_ms));
    // The stdin reader sits in a blocking read that would otherwise hold up
    // runtime shutdown.
    runtime.shutdown_background();
    result
}

async fn watch(interval_ms: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session();
    let every = interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| session.config.poll_interval());

    let (tx, rx) = mpsc::channel(16);
    let keys = tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let Some(command) = key_command(&line) else {
                continue;
            };
            if keys.send(command).await.is_err() || command == Command::Shutdown {
                break;
            }
        }
    });
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(Command::Shutdown).await;
        }
    });

    eprintln!("{HELP}");
    let now = session.clock.now_ms();
    let events = session.driver.poll(now);
    render(&session.driver, &events, now);

    let summary = run_poll_loop(&mut session.driver, &session.clock, rx, every, |d, events, now| {
        render(d, events, now)
    })
    .await;
    println!();
    tracing::debug!(?summary, "watch finished");
    Ok(())
}

fn render<S: KeyValueStore, H: TimerHooks>(driver: &Driver<S, H>, events: &[Event], now_ms: u64) {
    let mut out = std::io::stdout().lock();
    for event in events {
        if let Some(line) = describe(event) {
            let _ = writeln!(out, "\r{line:<40}");
        }
    }
    let state = driver.state();
    let marker = if state.is_running() { "running" } else { "paused" };
    let chime = if driver.settings().chime_enabled { "chime on" } else { "chime off" };
    let _ = write!(
        out,
        "\r{:<5} {}  {marker}  {chime}   ",
        state.phase().label(),
        format_remaining(driver.remaining_ms(now_ms)),
    );
    let _ = out.flush();
}

fn describe(event: &Event) -> Option<String> {
    match event {
        Event::PhaseStarted { phase, .. } => Some(format!("{} started", phase.label())),
        Event::PhaseEnded { phase, .. } => Some(format!("{} complete", phase.label())),
        Event::TimerPaused { .. } => Some("paused".into()),
        Event::TimerReset { .. } => Some("reset".into()),
        Event::DurationChanged {
            phase, duration_ms, ..
        } => Some(format!("{} set to {}", phase.label(), format_remaining(*duration_ms))),
        Event::Chime { elapsed_min, .. } => Some(format!("{elapsed_min} minutes in")),
        Event::SettingsChanged { chime_enabled, .. } => Some(format!(
            "chime {}",
            if *chime_enabled { "on" } else { "off" }
        )),
        Event::StateSnapshot { .. } => None,
    }
}
