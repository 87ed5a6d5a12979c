use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MS_PER_MINUTE: u64 = 60_000;

/// Longest phase accepted, one day.
pub const MAX_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    /// The phase that follows this one.
    pub fn opposite(self) -> Self {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Break => "Break",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Work => "work",
            Phase::Break => "break",
        })
    }
}

impl FromStr for Phase {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" | "w" => Ok(Phase::Work),
            "break" | "b" => Ok(Phase::Break),
            other => Err(ValidationError::UnknownPhase(other.to_string())),
        }
    }
}

/// Convert a minute value from the user into whole milliseconds.
///
/// Rounds to the nearest minute and clamps into `1..=MAX_MINUTES`. NaN and
/// negative input land on the one-minute floor.
pub fn minutes_to_ms(minutes: f64) -> u64 {
    let whole = minutes.round().max(1.0).min(f64::from(MAX_MINUTES));
    whole as u64 * MS_PER_MINUTE
}

/// Durations and continuation policy for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    work_ms: u64,
    break_ms: u64,
    auto_advance: bool,
}

impl TimerConfig {
    pub fn from_minutes(work_minutes: f64, break_minutes: f64, auto_advance: bool) -> Self {
        Self {
            work_ms: minutes_to_ms(work_minutes),
            break_ms: minutes_to_ms(break_minutes),
            auto_advance,
        }
    }

    pub fn duration_for(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work_ms,
            Phase::Break => self.break_ms,
        }
    }

    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    pub(crate) fn set_duration_ms(&mut self, phase: Phase, ms: u64) {
        let ms = ms.clamp(MS_PER_MINUTE, u64::from(MAX_MINUTES) * MS_PER_MINUTE);
        match phase {
            Phase::Work => self.work_ms = ms,
            Phase::Break => self.break_ms = ms,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::from_minutes(25.0, 5.0, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_round_to_nearest() {
        assert_eq!(minutes_to_ms(24.6), 25 * MS_PER_MINUTE);
        assert_eq!(minutes_to_ms(24.4), 24 * MS_PER_MINUTE);
        assert_eq!(minutes_to_ms(2.5), 3 * MS_PER_MINUTE);
    }

    #[test]
    fn minutes_floor_at_one() {
        assert_eq!(minutes_to_ms(0.0), MS_PER_MINUTE);
        assert_eq!(minutes_to_ms(-12.0), MS_PER_MINUTE);
        assert_eq!(minutes_to_ms(0.4), MS_PER_MINUTE);
        assert_eq!(minutes_to_ms(f64::NAN), MS_PER_MINUTE);
    }

    #[test]
    fn huge_minutes_cap_at_one_day() {
        let cap = u64::from(MAX_MINUTES) * MS_PER_MINUTE;
        assert_eq!(minutes_to_ms(1e300), cap);
        assert_eq!(minutes_to_ms(f64::INFINITY), cap);
        assert_eq!(minutes_to_ms(1_440.4), cap);
        assert_eq!(minutes_to_ms(1_439.0), cap - MS_PER_MINUTE);
    }

    #[test]
    fn phase_parses_loosely() {
        assert_eq!("Work".parse::<Phase>().unwrap(), Phase::Work);
        assert_eq!(" break ".parse::<Phase>().unwrap(), Phase::Break);
        assert_eq!("b".parse::<Phase>().unwrap(), Phase::Break);
        assert!("lunch".parse::<Phase>().is_err());
    }

    #[test]
    fn opposite_alternates() {
        assert_eq!(Phase::Work.opposite(), Phase::Break);
        assert_eq!(Phase::Break.opposite().opposite(), Phase::Break);
    }

    #[test]
    fn default_config_is_classic_pomodoro() {
        let cfg = TimerConfig::default();
        assert_eq!(cfg.duration_for(Phase::Work), 25 * MS_PER_MINUTE);
        assert_eq!(cfg.duration_for(Phase::Break), 5 * MS_PER_MINUTE);
        assert!(cfg.auto_advance());
    }
}
