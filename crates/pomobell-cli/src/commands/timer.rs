use clap::Subcommand;
use pomobell_core::timer::MS_PER_MINUTE;
use pomobell_core::{Clock, Command, Config, ConfigError, Event, Phase};

use super::{open_session, print_report};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Start when paused, pause when running
    Toggle,
    /// Back to an idle work phase at full duration
    Reset,
    /// Start the given phase immediately at full duration
    Switch {
        /// "work" or "break"
        phase: Phase,
    },
    /// Change a phase duration (only applies to the current, paused phase)
    SetDuration {
        /// "work" or "break"
        phase: Phase,
        /// Minutes, rounded to the nearest whole minute (1 to 1440)
        #[arg(allow_negative_numbers = true)]
        minutes: f64,
    },
    /// Print current timer state as JSON
    Status,
    /// Run the countdown in the foreground with keyboard shortcuts
    Watch {
        /// Poll interval in milliseconds (at most 1000)
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let command = match action {
        TimerAction::Start => Some(Command::Start),
        TimerAction::Pause => Some(Command::Pause),
        TimerAction::Toggle => Some(Command::Toggle),
        TimerAction::Reset => Some(Command::Reset),
        TimerAction::Switch { phase } => Some(Command::Switch(phase)),
        TimerAction::SetDuration { phase, minutes } => Some(Command::SetDuration(phase, minutes)),
        TimerAction::Status => None,
        TimerAction::Watch { interval_ms } => return super::watch::run(interval_ms),
    };

    let mut session = open_session();
    let now = session.clock.now_ms();
    // Catch up on a boundary that passed while no process was polling.
    let mut events = session.driver.poll(now);
    if let Some(command) = command {
        events.extend(session.driver.apply(command, now));
    }
    remember_durations(&mut session.config, &events)?;

    print_report(&session.driver, &events, now)
}

/// Keep an applied duration change for later invocations.
fn remember_durations(config: &mut Config, events: &[Event]) -> Result<(), ConfigError> {
    let mut changed = false;
    for event in events {
        if let Event::DurationChanged {
            phase, duration_ms, ..
        } = event
        {
            let minutes = u32::try_from(duration_ms / MS_PER_MINUTE).unwrap_or(u32::MAX);
            match phase {
                Phase::Work => config.timer.work_minutes = minutes,
                Phase::Break => config.timer.break_minutes = minutes,
            }
            changed = true;
        }
    }
    if changed {
        config.save()?;
    }
    Ok(())
}
