//! # pomobell Core Library
//!
//! Business logic for a single work/break countdown that survives process
//! restarts. The CLI binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a pure wall-clock state machine; every operation maps
//!   `(state, now)` to the next state
//! - **Driver**: owns the state, persists every transition, and fires the
//!   phase-start, phase-end and chime hooks
//! - **Poll loop**: single-task async loop that serializes user commands
//!   and poll ticks
//! - **Storage**: SQLite key-value store for the countdown snapshot and
//!   settings, TOML for configuration
//! - **Alerts**: chime and desktop notification emitters
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Driver`]: State holder and hook dispatcher
//! - [`Database`]: Snapshot persistence
//! - [`Config`]: Application configuration management

pub mod alerts;
pub mod clock;
pub mod driver;
pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use alerts::{AlertHooks, ChimePlayer, Notifier, Permission, Tone};
pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{run_poll_loop, Command, Driver, PollSummary, TimerHooks};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use storage::{Config, Database, KeyValueStore, MemoryStore, Settings};
pub use timer::{format_remaining, Phase, TimerConfig, TimerEngine, TimerState};
