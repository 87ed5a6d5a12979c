use clap::{Subcommand, ValueEnum};
use pomobell_core::{Clock, Command, ValidationError};

use super::{open_session, print_report};

#[derive(Clone, Copy, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(s: Switch) -> bool {
        matches!(s, Switch::On)
    }
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print chime and notification settings as JSON
    Show,
    /// Turn the 5-minute chime on or off
    Chime { state: Switch },
    /// Turn desktop notifications on or off (asks for permission)
    Notify { state: Switch },
    /// Chime volume between 0 and 1
    Volume { value: f32 },
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let command = match action {
        SettingsAction::Show => None,
        SettingsAction::Chime { state } => Some(Command::SetChime(state.into())),
        SettingsAction::Notify { state } => Some(Command::SetNotify(state.into())),
        SettingsAction::Volume { value } => {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::OutOfRange {
                    field: "volume".into(),
                    message: format!("{value} is not between 0 and 1"),
                }
                .into());
            }
            Some(Command::SetVolume(value))
        }
    };

    let mut session = open_session();
    let now = session.clock.now_ms();
    match command {
        Some(command) => {
            let events = session.driver.apply(command, now);
            print_report(&session.driver, &events, now)?;
        }
        None => {
            println!("{}", serde_json::to_string_pretty(session.driver.settings())?);
        }
    }
    Ok(())
}
