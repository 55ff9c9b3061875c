//! Core engine for a Quran recitation reader: keeps displayed verses in
//! lock-step with pre-recorded recitation audio.
//!
//! The interesting part lives in [`timing`] and [`sync`]: a normalized,
//! monotonic table of per-verse start timestamps and a sampling engine that
//! resolves the active verse group from the playback clock and notifies on
//! change. [`player`] wraps the audio backend behind a transport façade and
//! [`store`] is the keyed pub/sub container that decouples both from any
//! presentation layer.

pub mod cache;
pub mod config;
pub mod content;
pub mod format;
pub mod player;
pub mod progress;
pub mod store;
pub mod sync;
pub mod timing;

pub use config::{AppConfig, LogLevel, load_config};
pub use content::{Library, Surah, Verse, load_library};
pub use player::{
    MediaBackend, PlaybackFacade, PlaybackState, PlayerLifecycle, PointerKind, TransportEvent,
};
pub use store::{Store, Subscription};
pub use sync::{SyncEngine, Transport};
pub use timing::{Marker, TimingEntry, TimingIndex, VerseGroup};
