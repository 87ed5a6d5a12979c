mod config;
pub mod database;
mod memory;
mod settings;

pub use config::{ChimeConfig, Config, PollConfig, TimerSection};
pub use database::Database;
pub use memory::MemoryStore;
pub use settings::Settings;
pub(crate) use settings::clamp_volume;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::{ConfigError, StorageError};

/// Key of the persisted countdown snapshot.
pub const STATE_KEY: &str = "pomodoro_state_v1";
/// Key of the persisted chime/notification settings.
pub const SETTINGS_KEY: &str = "pomodoro_settings_v1";
/// Key of the last chime mark.
pub const CHIME_KEY: &str = "pomodoro_chime_v1";

/// Minimal string key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Read and decode a JSON value.
///
/// Missing keys, store failures and undecodable payloads all come back as
/// `None`; the latter two are logged.
pub fn load_json<T: DeserializeOwned>(store: &(impl KeyValueStore + ?Sized), key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "failed to read from store");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "ignoring malformed stored value");
            None
        }
    }
}

/// Encode and write a JSON value. Failures are logged and swallowed.
pub fn save_json<T: Serialize>(store: &(impl KeyValueStore + ?Sized), key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key, error = %e, "failed to encode value for store");
            return;
        }
    };
    if let Err(e) = store.set(key, &raw) {
        warn!(key, error = %e, "failed to write to store");
    }
}

/// Returns the data directory, creating it if needed.
///
/// `POMOBELL_HOME` wins when set. Otherwise `~/.config/pomobell[-dev]/`,
/// with the `-dev` suffix selected by `POMOBELL_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMOBELL_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOBELL_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomobell-dev")
            } else {
                base_dir.join("pomobell")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(ConfigError::DataDir)?;
    Ok(dir)
}
