//! The media-element seam: everything the façade needs from an audio
//! backend, and the rodio implementation used outside of tests.

use anyhow::{Context, Result, anyhow};
use rodio::{Decoder, OutputStream, Sink, Source};
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

/// Minimal transport surface of a playback primitive. Object-safe so tests
/// can substitute a scripted double for the real audio device.
pub trait MediaBackend {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn set_speed(&mut self, multiplier: f32);
    fn set_volume(&mut self, volume: f32);
    fn try_seek(&mut self, position: Duration) -> Result<()>;
    /// Duration as reported by the decoder; `None` when the container does
    /// not declare one (common for streamed MP3).
    fn total_duration(&self) -> Option<Duration>;
    fn is_finished(&self) -> bool;
}

/// Default backend: a rodio sink fed from fully-prefetched bytes. Created
/// paused; the façade decides when playback starts.
pub struct RodioBackend {
    _stream: OutputStream,
    sink: Sink,
    duration: Option<Duration>,
}

impl RodioBackend {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let (_stream, handle) = OutputStream::try_default().context("Opening audio output")?;
        let sink = Sink::try_new(&handle).context("Creating audio sink")?;
        let decoder = Decoder::new(Cursor::new(bytes)).context("Decoding audio source")?;
        let duration = decoder.total_duration();
        debug!(?duration, "Decoded audio source");
        sink.append(decoder);
        sink.pause();
        Ok(Self {
            _stream,
            sink,
            duration,
        })
    }
}

impl MediaBackend for RodioBackend {
    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn set_speed(&mut self, multiplier: f32) {
        self.sink.set_speed(multiplier);
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn try_seek(&mut self, position: Duration) -> Result<()> {
        self.sink
            .try_seek(position)
            .map_err(|err| anyhow!("Seeking audio sink: {err}"))
    }

    fn total_duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}
