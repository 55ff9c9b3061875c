//! Sync engine: resolves which verse group is active for the current
//! playback position and notifies on change.
//!
//! Resolution is a pure floor search over the [`TimingIndex`]; the only
//! state carried between samples is the last-notified group key, used to
//! suppress redundant notifications so a sample per frame never turns into
//! a DOM-churn per frame. The sample loop is driven by the host one tick at
//! a time and only runs while the transport reports playback, so pausing
//! leaves no pending work behind.

use crate::content::Verse;
use crate::player::TransportEvent;
use crate::timing::{Marker, TimingIndex};
use std::sync::Arc;
use tracing::debug;

/// The engine's one-way view of the playback façade: read the clock, issue
/// seeks. The façade stays the single writer of transport state.
pub trait Transport {
    fn position(&self) -> f64;
    fn seek_to(&self, secs: f64);
}

type ChangeCallback = Box<dyn FnMut(&[usize])>;

pub struct SyncEngine {
    transport: Arc<dyn Transport>,
    index: TimingIndex,
    on_change: Option<ChangeCallback>,
    /// Sorted indices of the last-notified group; empty means "none".
    last_active: Vec<usize>,
    running: bool,
}

impl SyncEngine {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            index: TimingIndex::default(),
            on_change: None,
            last_active: Vec::new(),
            running: false,
        }
    }

    /// Bind a verse list and change callback, fully replacing any previous
    /// binding. The last-notified key resets to "none".
    pub fn bind<F>(&mut self, verses: &[Verse], on_change: F)
    where
        F: FnMut(&[usize]) + 'static,
    {
        self.index = TimingIndex::build(verses);
        self.on_change = Some(Box::new(on_change));
        self.last_active.clear();
        debug!(groups = self.index.len(), "Bound verse timing");
    }

    /// Stop the sample loop and drop the binding. Safe to call repeatedly.
    pub fn unbind(&mut self) {
        self.running = false;
        self.on_change = None;
        self.index = TimingIndex::default();
        self.last_active.clear();
    }

    /// Resolve the active group at the transport's current position and
    /// notify if it differs from the last-notified group.
    pub fn sample(&mut self) {
        self.sample_at(self.transport.position());
    }

    /// One host-driven frame of the sample loop; a no-op unless playback is
    /// running.
    pub fn tick(&mut self) {
        if self.running {
            self.sample();
        }
    }

    /// Transport transitions drive the run loop: playing starts per-tick
    /// sampling, pausing or ending stops it, and a seek samples once
    /// immediately so highlights track scrubbing even while paused.
    pub fn handle_transport(&mut self, event: &TransportEvent) {
        match event {
            TransportEvent::Play => self.running = true,
            TransportEvent::Pause | TransportEvent::Ended => self.running = false,
            TransportEvent::Seeked { position } => self.sample_at(*position),
            TransportEvent::LoadedMetadata { .. } | TransportEvent::SnapPulse { .. } => {}
        }
    }

    /// Seek the transport to the start of `verse_index`. Unknown verses are
    /// a silent no-op: seeking to a verse without timing data is undefined.
    pub fn seek_to_verse(&mut self, verse_index: usize) {
        match self.index.verse_start(verse_index) {
            Some(start) => self.transport.seek_to(start),
            None => debug!(verse = verse_index, "Seek to untimed verse ignored"),
        }
    }

    /// Resolved start of `verse_index`, or NaN for "unknown" so callers can
    /// tell "starts at zero" apart from "no data".
    pub fn get_verse_timestamp(&self, verse_index: usize) -> f64 {
        self.index.verse_start(verse_index).unwrap_or(f64::NAN)
    }

    /// Progress-bar markers for the bound timing, one per verse group.
    pub fn markers(&self, duration: f64) -> Vec<Marker> {
        self.index.markers(duration)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn sample_at(&mut self, current_time: f64) {
        let Some(on_change) = self.on_change.as_mut() else {
            return;
        };
        let active = self.index.resolve_active(current_time);
        if active != self.last_active.as_slice() {
            self.last_active = active.to_vec();
            let snapshot = self.last_active.clone();
            on_change(&snapshot);
        }
    }
}
