use serde::{Deserialize, Serialize};

/// User toggles for the side effects, persisted next to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_true")]
    pub chime_enabled: bool,
    #[serde(default)]
    pub notify_enabled: bool,
    /// Chime loudness, 0..1.
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f32 {
    0.5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chime_enabled: true,
            notify_enabled: false,
            volume: default_volume(),
        }
    }
}

impl Settings {
    /// Clamp fields loaded from storage into their valid ranges.
    pub fn sanitized(mut self) -> Self {
        self.volume = clamp_volume(self.volume);
        self
    }
}

pub(crate) fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return default_volume();
    }
    volume.clamp(0.0, 1.0)
}
