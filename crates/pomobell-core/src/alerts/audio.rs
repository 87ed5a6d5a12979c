//! Audio cue emitters.
//!
//! Playback is fire-and-forget: a player never blocks the caller and never
//! reports failure. A missing or busy audio device just means no sound.

use std::io::Write;

use crate::storage::clamp_volume;

/// Short tone description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub duration_ms: u64,
    pub frequency_hz: f32,
}

impl Default for Tone {
    fn default() -> Self {
        Self {
            duration_ms: 200,
            frequency_hz: 880.0,
        }
    }
}

pub trait ChimePlayer {
    /// Master volume, clamped into 0..1.
    fn set_volume(&mut self, volume: f32);
    fn play(&self, tone: Tone);
}

/// Plays nothing. Used when sound is unwanted, and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl ChimePlayer for SilentPlayer {
    fn set_volume(&mut self, _volume: f32) {}
    fn play(&self, _tone: Tone) {}
}

/// Rings the terminal bell. Tone parameters are ignored; a zero volume
/// silences it.
#[derive(Debug, Clone, Copy)]
pub struct BellPlayer {
    volume: f32,
}

impl Default for BellPlayer {
    fn default() -> Self {
        Self { volume: 0.5 }
    }
}

impl ChimePlayer for BellPlayer {
    fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
    }

    fn play(&self, _tone: Tone) {
        if self.volume <= 0.0 {
            return;
        }
        let mut err = std::io::stderr();
        if let Err(e) = err.write_all(b"\x07").and_then(|()| err.flush()) {
            tracing::debug!(error = %e, "terminal bell unavailable");
        }
    }
}

/// Sine tone through the default output device.
#[cfg(feature = "audio")]
#[derive(Debug, Clone, Copy)]
pub struct TonePlayer {
    volume: f32,
}

#[cfg(feature = "audio")]
impl Default for TonePlayer {
    fn default() -> Self {
        Self { volume: 0.5 }
    }
}

#[cfg(feature = "audio")]
impl ChimePlayer for TonePlayer {
    fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
    }

    fn play(&self, tone: Tone) {
        use std::time::Duration;

        use rodio::source::SineWave;
        use rodio::{OutputStream, Sink, Source};

        let volume = self.volume;
        if volume <= 0.0 {
            return;
        }
        // The output stream is not Send, so it is opened on the playback thread.
        std::thread::spawn(move || {
            let Ok((_stream, stream_handle)) = OutputStream::try_default() else {
                tracing::debug!("no audio output device");
                return;
            };
            let Ok(sink) = Sink::try_new(&stream_handle) else {
                return;
            };
            let source = SineWave::new(tone.frequency_hz)
                .take_duration(Duration::from_millis(tone.duration_ms))
                .fade_in(Duration::from_millis(5))
                .amplify(0.4);
            sink.set_volume(volume);
            sink.append(source);
            sink.sleep_until_end();
        });
    }
}

/// Best player available in this build.
#[cfg(feature = "audio")]
pub type SystemPlayer = TonePlayer;

/// Best player available in this build.
#[cfg(not(feature = "audio"))]
pub type SystemPlayer = BellPlayer;
