//! Playback façade: the single owner of transport state.
//!
//! Wraps a [`MediaBackend`] behind play/pause/seek/speed/volume controls,
//! keeps its own monotonic position clock (backends report position
//! coarsely, if at all), publishes state snapshots into the [`Store`] under
//! the `audio` key, and queues [`TransportEvent`]s for the sync engine to
//! drain once per host tick.
//!
//! Loading is asynchronous and token-guarded: each `load` bumps a token and
//! prefetches bytes on a worker thread; a result carrying a stale token is
//! discarded, so rapid surah switches can never resurrect an old recitation.

mod loader;
mod media;

pub use loader::{AudioSource, fetch_source_bytes};
pub use media::{MediaBackend, RodioBackend};

use crate::progress::time_from_percent;
use crate::store::Store;
use crate::timing::Marker;
use anyhow::Result;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The playback speeds the UI offers. Anything else is rejected.
pub const SPEED_OPTIONS: [f32; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

const STORE_KEY: &str = "audio";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

impl PointerKind {
    /// Snap radius in pixels for a track of the given width. Touch gets a
    /// wider radius than mouse since fingers are less precise than cursors.
    fn snap_threshold_px(self, track_width_px: f64) -> f64 {
        match self {
            PointerKind::Mouse => (track_width_px * 0.003).max(3.0),
            PointerKind::Touch => (track_width_px * 0.006).max(6.0),
        }
    }
}

/// Transport transitions, drained by the host via [`PlaybackFacade::take_events`]
/// and fed to the sync engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Play,
    Pause,
    Ended,
    Seeked { position: f64 },
    LoadedMetadata { duration: f64 },
    /// Emitted once each time a pointer scrub snaps onto a verse marker.
    SnapPulse { marker_index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerLifecycle {
    Idle,
    Loading,
    Playing,
    Paused,
}

/// Snapshot published under the `audio` store key after every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub playing: bool,
    pub loading: bool,
    pub current_time: f64,
    pub duration: f64,
    pub speed: f32,
    pub loaded_media_id: Option<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            playing: false,
            loading: false,
            current_time: 0.0,
            duration: 0.0,
            speed: 1.0,
            loaded_media_id: None,
        }
    }
}

/// Wall-clock position tracker, rebased on every seek, pause and speed
/// change so it never drifts across transitions.
struct PositionClock {
    origin: f64,
    started_at: Option<Instant>,
    speed: f64,
}

impl PositionClock {
    fn new() -> Self {
        Self {
            origin: 0.0,
            started_at: None,
            speed: 1.0,
        }
    }

    fn position(&self) -> f64 {
        match self.started_at {
            Some(at) => self.origin + at.elapsed().as_secs_f64() * self.speed,
            None => self.origin,
        }
    }

    fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        self.origin = self.position();
        self.started_at = None;
    }

    fn set_position(&mut self, secs: f64) {
        let running = self.started_at.is_some();
        self.origin = secs;
        self.started_at = running.then(Instant::now);
    }

    fn set_speed(&mut self, speed: f64) {
        let running = self.started_at.is_some();
        self.origin = self.position();
        self.started_at = running.then(Instant::now);
        self.speed = speed;
    }

    fn reset(&mut self) {
        self.origin = 0.0;
        self.started_at = None;
    }
}

/// Outcome of a background prefetch, routed back to the façade's thread.
pub(crate) struct LoadResult {
    pub(crate) token: u64,
    pub(crate) media_id: String,
    pub(crate) url: String,
    pub(crate) duration_hint: Option<f64>,
    pub(crate) bytes: Result<Vec<u8>>,
}

type BackendFactory = Box<dyn Fn(Vec<u8>) -> Result<Box<dyn MediaBackend>>>;

struct Inner {
    backend: Option<Box<dyn MediaBackend>>,
    lifecycle: PlayerLifecycle,
    state: PlaybackState,
    clock: PositionClock,
    load_token: u64,
    resume_when_ready: bool,
    volume: f32,
    last_volume: f32,
    muted: bool,
    markers: Vec<Marker>,
    last_snap: Option<usize>,
    events: Vec<TransportEvent>,
    load_rx: Receiver<LoadResult>,
}

enum TickUpdate {
    Full(PlaybackState),
    Time(f64),
    Nothing,
}

pub struct PlaybackFacade {
    inner: Mutex<Inner>,
    load_tx: Sender<LoadResult>,
    store: Store,
    cache_audio: bool,
    backend_factory: BackendFactory,
}

impl PlaybackFacade {
    pub fn new(store: Store, cache_audio: bool) -> Self {
        Self::with_backend_factory(
            store,
            cache_audio,
            Box::new(|bytes| {
                RodioBackend::from_bytes(bytes).map(|b| Box::new(b) as Box<dyn MediaBackend>)
            }),
        )
    }

    /// Construct with a custom backend factory. Hosts without an audio
    /// device (and tests) substitute their own transport here.
    pub fn with_backend_factory(
        store: Store,
        cache_audio: bool,
        backend_factory: BackendFactory,
    ) -> Self {
        let (load_tx, load_rx) = channel();
        Self {
            inner: Mutex::new(Inner {
                backend: None,
                lifecycle: PlayerLifecycle::Idle,
                state: PlaybackState::default(),
                clock: PositionClock::new(),
                load_token: 0,
                resume_when_ready: false,
                volume: 1.0,
                last_volume: 1.0,
                muted: false,
                markers: Vec::new(),
                last_snap: None,
                events: Vec::new(),
                load_rx,
            }),
            load_tx,
            store,
            cache_audio,
            backend_factory,
        }
    }

    /// Begin loading a new source, replacing whatever was loaded. Returns
    /// the load token; only the newest token's result will be applied.
    pub fn load(&self, media_id: &str, url: &str, duration_hint: Option<f64>) -> u64 {
        let token = self.begin_load(media_id, duration_hint);
        let source = AudioSource::classify(url);
        let use_cache = self.cache_audio;
        let tx = self.load_tx.clone();
        let media_id = media_id.to_string();
        let url = url.to_string();
        thread::spawn(move || {
            let bytes = fetch_source_bytes(&source, use_cache);
            let _ = tx.send(LoadResult {
                token,
                media_id,
                url,
                duration_hint,
                bytes,
            });
        });
        token
    }

    pub(crate) fn begin_load(&self, media_id: &str, duration_hint: Option<f64>) -> u64 {
        let (token, state) = {
            let mut inner = self.lock();
            inner.load_token = inner.load_token.wrapping_add(1);
            inner.backend = None;
            inner.lifecycle = PlayerLifecycle::Loading;
            inner.clock.reset();
            inner.markers.clear();
            inner.last_snap = None;
            inner.resume_when_ready = false;
            let speed = inner.state.speed;
            inner.state = PlaybackState {
                loading: true,
                speed,
                duration: duration_hint
                    .filter(|d| d.is_finite() && *d > 0.0)
                    .unwrap_or(0.0),
                loaded_media_id: Some(media_id.to_string()),
                ..PlaybackState::default()
            };
            info!(media_id, "Loading audio");
            (inner.load_token, inner.state.clone())
        };
        self.publish(&state);
        token
    }

    pub(crate) fn apply_loaded(&self, result: LoadResult) {
        let state = {
            let mut inner = self.lock();
            if result.token != inner.load_token {
                debug!(
                    media_id = %result.media_id,
                    token = result.token,
                    "Discarding stale load result"
                );
                return;
            }
            match result.bytes.and_then(|bytes| (self.backend_factory)(bytes)) {
                Ok(mut backend) => {
                    let volume = if inner.muted { 0.0 } else { inner.volume };
                    backend.set_volume(volume);
                    backend.set_speed(inner.state.speed);
                    let position = inner.clock.position();
                    if position > 0.0 {
                        if let Err(err) = backend.try_seek(Duration::from_secs_f64(position)) {
                            warn!(%err, "Restoring position after load failed");
                        }
                    }
                    let duration = backend
                        .total_duration()
                        .map(|d| d.as_secs_f64())
                        .or(result.duration_hint.filter(|d| d.is_finite() && *d > 0.0))
                        .unwrap_or(inner.state.duration);
                    inner.backend = Some(backend);
                    inner.state.duration = duration;
                    inner.state.loading = false;
                    inner.events.push(TransportEvent::LoadedMetadata { duration });
                    if inner.resume_when_ready {
                        start_playing(&mut inner);
                    } else {
                        inner.lifecycle = PlayerLifecycle::Paused;
                    }
                    info!(media_id = %result.media_id, duration, "Audio ready");
                }
                Err(err) => {
                    warn!(media_id = %result.media_id, url = %result.url, %err, "Audio load failed");
                    inner.lifecycle = PlayerLifecycle::Idle;
                    inner.state.loading = false;
                    inner.state.playing = false;
                }
            }
            inner.state.clone()
        };
        self.publish(&state);
    }

    pub fn play(&self) {
        let state = {
            let mut inner = self.lock();
            match inner.lifecycle {
                PlayerLifecycle::Idle => {
                    debug!("Play with nothing loaded ignored");
                    return;
                }
                PlayerLifecycle::Loading => {
                    inner.resume_when_ready = true;
                    return;
                }
                PlayerLifecycle::Playing => return,
                PlayerLifecycle::Paused => {
                    start_playing(&mut inner);
                    inner.state.clone()
                }
            }
        };
        self.publish(&state);
    }

    pub fn pause(&self) {
        let state = {
            let mut inner = self.lock();
            match inner.lifecycle {
                PlayerLifecycle::Loading => {
                    inner.resume_when_ready = false;
                    return;
                }
                PlayerLifecycle::Playing => {}
                _ => return,
            }
            if let Some(backend) = inner.backend.as_mut() {
                backend.pause();
            }
            inner.clock.stop();
            inner.state.current_time = inner.clock.position();
            inner.state.playing = false;
            inner.lifecycle = PlayerLifecycle::Paused;
            inner.events.push(TransportEvent::Pause);
            inner.state.clone()
        };
        self.publish(&state);
    }

    pub fn toggle(&self) {
        let playing = self.lock().lifecycle == PlayerLifecycle::Playing;
        if playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Seek to an absolute position, clamped into the loaded duration. The
    /// clock moves even if the backend seek fails so the highlight follows
    /// the user's intent; audio rejoins at the next load.
    pub fn seek_to(&self, secs: f64) {
        if !secs.is_finite() {
            return;
        }
        let state = {
            let mut inner = self.lock();
            if inner.lifecycle == PlayerLifecycle::Idle {
                return;
            }
            let duration = inner.state.duration;
            let target = if duration > 0.0 {
                secs.clamp(0.0, duration)
            } else {
                secs.max(0.0)
            };
            if let Some(backend) = inner.backend.as_mut() {
                if let Err(err) = backend.try_seek(Duration::from_secs_f64(target)) {
                    warn!(target, %err, "Backend seek failed; clock moved anyway");
                }
            }
            inner.clock.set_position(target);
            inner.state.current_time = target;
            inner.events.push(TransportEvent::Seeked { position: target });
            inner.state.clone()
        };
        self.publish(&state);
    }

    /// Seek relative to the current position.
    pub fn skip(&self, delta_secs: f64) {
        self.seek_to(self.position() + delta_secs);
    }

    /// Set the playback rate; values outside [`SPEED_OPTIONS`] are rejected.
    pub fn set_speed(&self, speed: f32) {
        if !SPEED_OPTIONS.contains(&speed) {
            warn!(speed, "Unsupported playback speed ignored");
            return;
        }
        let state = {
            let mut inner = self.lock();
            inner.clock.set_speed(f64::from(speed));
            if let Some(backend) = inner.backend.as_mut() {
                backend.set_speed(speed);
            }
            inner.state.speed = speed;
            inner.state.clone()
        };
        self.publish(&state);
    }

    pub fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        let (applied, muted) = {
            let mut inner = self.lock();
            inner.volume = volume;
            if volume > 0.0 {
                inner.last_volume = volume;
                inner.muted = false;
            }
            let applied = if inner.muted { 0.0 } else { volume };
            if let Some(backend) = inner.backend.as_mut() {
                backend.set_volume(applied);
            }
            (volume, inner.muted)
        };
        self.store
            .update_audio_state(json!({ "volume": applied, "muted": muted }));
    }

    pub fn toggle_mute(&self) {
        let (volume, muted) = {
            let mut inner = self.lock();
            inner.muted = !inner.muted;
            if !inner.muted && inner.volume == 0.0 {
                inner.volume = inner.last_volume;
            }
            let applied = if inner.muted { 0.0 } else { inner.volume };
            if let Some(backend) = inner.backend.as_mut() {
                backend.set_volume(applied);
            }
            (inner.volume, inner.muted)
        };
        self.store
            .update_audio_state(json!({ "volume": volume, "muted": muted }));
    }

    /// Install the verse markers used for snap seeking. The sync engine
    /// derives these from the bound timing once the duration is known.
    pub fn bind_markers(&self, markers: Vec<Marker>) {
        let mut inner = self.lock();
        inner.markers = markers;
        inner.last_snap = None;
    }

    /// Seek from a pointer position on the progress track. `ratio` is the
    /// pointer's fraction of the track width. When the pointer lands within
    /// the snap radius of a verse marker the seek lands exactly on that
    /// verse's start, and a [`TransportEvent::SnapPulse`] fires once per
    /// entry into the radius.
    pub fn seek_from_pointer_position(&self, ratio: f64, track_width_px: f64, kind: PointerKind) {
        if !ratio.is_finite() || !track_width_px.is_finite() || track_width_px <= 0.0 {
            return;
        }
        let target = {
            let mut inner = self.lock();
            let duration = inner.state.duration;
            if duration <= 0.0 {
                return;
            }
            let ratio = ratio.clamp(0.0, 1.0);
            let pointer_px = ratio * track_width_px;
            let threshold = kind.snap_threshold_px(track_width_px);
            let nearest = inner
                .markers
                .iter()
                .enumerate()
                .map(|(i, m)| (i, (m.position_percent / 100.0 * track_width_px - pointer_px).abs()))
                .min_by(|a, b| a.1.total_cmp(&b.1));
            match nearest {
                Some((i, distance)) if distance <= threshold => {
                    if inner.last_snap != Some(i) {
                        inner.last_snap = Some(i);
                        inner.events.push(TransportEvent::SnapPulse { marker_index: i });
                    }
                    time_from_percent(inner.markers[i].position_percent, duration)
                }
                _ => {
                    inner.last_snap = None;
                    time_from_percent(ratio * 100.0, duration)
                }
            }
        };
        self.seek_to(target);
    }

    /// Drop the loaded source and return to idle. In-flight loads for the
    /// old source become stale.
    pub fn unload(&self) {
        let state = {
            let mut inner = self.lock();
            inner.load_token = inner.load_token.wrapping_add(1);
            inner.backend = None;
            inner.lifecycle = PlayerLifecycle::Idle;
            inner.clock.reset();
            inner.markers.clear();
            inner.last_snap = None;
            inner.resume_when_ready = false;
            let speed = inner.state.speed;
            inner.state = PlaybackState {
                speed,
                ..PlaybackState::default()
            };
            inner.state.clone()
        };
        self.publish(&state);
    }

    /// One host-driven frame: apply finished loads, detect end of playback,
    /// refresh the published position.
    pub fn tick(&self) {
        loop {
            let result = self.lock().load_rx.try_recv();
            match result {
                Ok(load) => self.apply_loaded(load),
                Err(_) => break,
            }
        }
        let update = {
            let mut inner = self.lock();
            if inner.lifecycle != PlayerLifecycle::Playing {
                TickUpdate::Nothing
            } else if inner.backend.as_ref().is_some_and(|b| b.is_finished()) {
                let duration = inner.state.duration;
                inner.clock.stop();
                inner.clock.set_position(duration);
                inner.state.current_time = duration;
                inner.state.playing = false;
                inner.lifecycle = PlayerLifecycle::Paused;
                inner.events.push(TransportEvent::Ended);
                info!(duration, "Playback ended");
                TickUpdate::Full(inner.state.clone())
            } else {
                let mut position = inner.clock.position();
                if inner.state.duration > 0.0 {
                    position = position.min(inner.state.duration);
                }
                inner.state.current_time = position;
                TickUpdate::Time(position)
            }
        };
        match update {
            TickUpdate::Full(state) => self.publish(&state),
            TickUpdate::Time(position) => {
                self.store.set("audio.currentTime", json!(position));
            }
            TickUpdate::Nothing => {}
        }
    }

    /// Queued transport transitions since the last call, oldest first.
    pub fn take_events(&self) -> Vec<TransportEvent> {
        std::mem::take(&mut self.lock().events)
    }

    pub fn position(&self) -> f64 {
        self.lock().clock.position()
    }

    pub fn state(&self) -> PlaybackState {
        self.lock().state.clone()
    }

    pub fn lifecycle(&self) -> PlayerLifecycle {
        self.lock().lifecycle
    }

    fn publish(&self, state: &PlaybackState) {
        let value = serde_json::to_value(state).unwrap_or(Value::Null);
        self.store.set(STORE_KEY, value);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("player lock")
    }
}

fn start_playing(inner: &mut Inner) {
    if let Some(backend) = inner.backend.as_mut() {
        backend.play();
    }
    inner.lifecycle = PlayerLifecycle::Playing;
    inner.clock.start();
    inner.state.playing = true;
    inner.resume_when_ready = false;
    inner.events.push(TransportEvent::Play);
}

impl crate::sync::Transport for PlaybackFacade {
    fn position(&self) -> f64 {
        PlaybackFacade::position(self)
    }

    fn seek_to(&self, secs: f64) {
        PlaybackFacade::seek_to(self, secs);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        LoadResult, MediaBackend, PlaybackFacade, PlayerLifecycle, PointerKind, TransportEvent,
    };
    use crate::content::Verse;
    use crate::store::Store;
    use crate::timing::TimingIndex;
    use anyhow::Result;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Default)]
    struct ScriptedState {
        playing: bool,
        speed: f32,
        volume: f32,
        seeks: Vec<f64>,
        duration: Option<f64>,
        finished: bool,
    }

    struct ScriptedBackend(Rc<RefCell<ScriptedState>>);

    impl MediaBackend for ScriptedBackend {
        fn play(&mut self) {
            self.0.borrow_mut().playing = true;
        }

        fn pause(&mut self) {
            self.0.borrow_mut().playing = false;
        }

        fn is_paused(&self) -> bool {
            !self.0.borrow().playing
        }

        fn set_speed(&mut self, multiplier: f32) {
            self.0.borrow_mut().speed = multiplier;
        }

        fn set_volume(&mut self, volume: f32) {
            self.0.borrow_mut().volume = volume;
        }

        fn try_seek(&mut self, position: Duration) -> Result<()> {
            self.0.borrow_mut().seeks.push(position.as_secs_f64());
            Ok(())
        }

        fn total_duration(&self) -> Option<Duration> {
            self.0.borrow().duration.map(Duration::from_secs_f64)
        }

        fn is_finished(&self) -> bool {
            self.0.borrow().finished
        }
    }

    fn scripted_facade(
        duration: f64,
    ) -> (PlaybackFacade, Rc<RefCell<ScriptedState>>, Store) {
        let shared: Rc<RefCell<ScriptedState>> = Rc::default();
        shared.borrow_mut().duration = Some(duration);
        let for_factory = Rc::clone(&shared);
        let store = Store::new();
        let facade = PlaybackFacade::with_backend_factory(
            store.clone(),
            false,
            Box::new(move |_bytes| {
                for_factory.borrow_mut().finished = false;
                Ok(Box::new(ScriptedBackend(Rc::clone(&for_factory))))
            }),
        );
        (facade, shared, store)
    }

    fn load_ready(facade: &PlaybackFacade, media_id: &str) -> u64 {
        let token = facade.begin_load(media_id, None);
        facade.apply_loaded(LoadResult {
            token,
            media_id: media_id.to_string(),
            url: media_id.to_string(),
            duration_hint: None,
            bytes: Ok(Vec::new()),
        });
        token
    }

    #[test]
    fn play_before_load_is_ignored() {
        let (facade, _, _) = scripted_facade(120.0);
        facade.play();
        assert_eq!(facade.lifecycle(), PlayerLifecycle::Idle);
        assert!(facade.take_events().is_empty());
    }

    #[test]
    fn load_play_pause_lifecycle_and_events() {
        let (facade, backend, _) = scripted_facade(120.0);
        load_ready(&facade, "surah-2");
        assert_eq!(facade.lifecycle(), PlayerLifecycle::Paused);
        assert_eq!(facade.state().duration, 120.0);
        assert_eq!(
            facade.take_events(),
            [TransportEvent::LoadedMetadata { duration: 120.0 }]
        );

        facade.play();
        assert_eq!(facade.lifecycle(), PlayerLifecycle::Playing);
        assert!(backend.borrow().playing);

        facade.pause();
        assert_eq!(facade.lifecycle(), PlayerLifecycle::Paused);
        assert!(!backend.borrow().playing);
        assert_eq!(
            facade.take_events(),
            [TransportEvent::Play, TransportEvent::Pause]
        );
    }

    #[test]
    fn stale_load_result_is_discarded() {
        let (facade, _, _) = scripted_facade(90.0);
        let first = facade.begin_load("surah-2", None);
        let second = facade.begin_load("surah-3", None);

        facade.apply_loaded(LoadResult {
            token: second,
            media_id: "surah-3".to_string(),
            url: "surah-3".to_string(),
            duration_hint: None,
            bytes: Ok(Vec::new()),
        });
        // The slow first fetch arrives after the replacement is already live.
        facade.apply_loaded(LoadResult {
            token: first,
            media_id: "surah-2".to_string(),
            url: "surah-2".to_string(),
            duration_hint: None,
            bytes: Ok(Vec::new()),
        });

        assert_eq!(facade.lifecycle(), PlayerLifecycle::Paused);
        assert_eq!(facade.state().loaded_media_id.as_deref(), Some("surah-3"));
    }

    #[test]
    fn play_during_loading_resumes_when_ready() {
        let (facade, backend, _) = scripted_facade(60.0);
        let token = facade.begin_load("surah-2", None);
        facade.play();
        assert_eq!(facade.lifecycle(), PlayerLifecycle::Loading);

        facade.apply_loaded(LoadResult {
            token,
            media_id: "surah-2".to_string(),
            url: "surah-2".to_string(),
            duration_hint: None,
            bytes: Ok(Vec::new()),
        });
        assert_eq!(facade.lifecycle(), PlayerLifecycle::Playing);
        assert!(backend.borrow().playing);
        assert!(facade.take_events().contains(&TransportEvent::Play));
    }

    #[test]
    fn pause_during_loading_cancels_resume() {
        let (facade, backend, _) = scripted_facade(60.0);
        let token = facade.begin_load("surah-2", None);
        facade.play();
        facade.pause();

        facade.apply_loaded(LoadResult {
            token,
            media_id: "surah-2".to_string(),
            url: "surah-2".to_string(),
            duration_hint: None,
            bytes: Ok(Vec::new()),
        });
        assert_eq!(facade.lifecycle(), PlayerLifecycle::Paused);
        assert!(!backend.borrow().playing);
    }

    #[test]
    fn failed_load_returns_to_idle() {
        let (facade, _, _) = scripted_facade(60.0);
        let token = facade.begin_load("surah-2", None);
        facade.apply_loaded(LoadResult {
            token,
            media_id: "surah-2".to_string(),
            url: "surah-2".to_string(),
            duration_hint: None,
            bytes: Err(anyhow::anyhow!("connection refused")),
        });
        assert_eq!(facade.lifecycle(), PlayerLifecycle::Idle);
        assert!(!facade.state().loading);
    }

    #[test]
    fn seek_clamps_into_duration() {
        let (facade, backend, _) = scripted_facade(120.0);
        load_ready(&facade, "surah-2");
        facade.take_events();

        facade.seek_to(500.0);
        assert_eq!(facade.state().current_time, 120.0);
        facade.seek_to(-5.0);
        assert_eq!(facade.state().current_time, 0.0);
        facade.seek_to(f64::NAN);
        assert_eq!(
            facade.take_events(),
            [
                TransportEvent::Seeked { position: 120.0 },
                TransportEvent::Seeked { position: 0.0 },
            ]
        );
        assert_eq!(backend.borrow().seeks.as_slice(), [120.0, 0.0]);
    }

    #[test]
    fn skip_moves_relative_to_position() {
        let (facade, _, _) = scripted_facade(120.0);
        load_ready(&facade, "surah-2");

        facade.seek_to(30.0);
        facade.skip(10.0);
        assert_eq!(facade.state().current_time, 40.0);
        facade.skip(-100.0);
        assert_eq!(facade.state().current_time, 0.0);
    }

    #[test]
    fn unlisted_speed_is_rejected() {
        let (facade, backend, _) = scripted_facade(120.0);
        load_ready(&facade, "surah-2");

        facade.set_speed(1.33);
        assert_eq!(facade.state().speed, 1.0);

        facade.set_speed(1.5);
        assert_eq!(facade.state().speed, 1.5);
        assert_eq!(backend.borrow().speed, 1.5);
    }

    #[test]
    fn speed_survives_a_reload() {
        let (facade, backend, _) = scripted_facade(120.0);
        load_ready(&facade, "surah-2");
        facade.set_speed(1.25);
        load_ready(&facade, "surah-3");
        assert_eq!(facade.state().speed, 1.25);
        assert_eq!(backend.borrow().speed, 1.25);
    }

    #[test]
    fn volume_and_mute_reach_the_backend() {
        let (facade, backend, store) = scripted_facade(120.0);
        load_ready(&facade, "surah-2");

        facade.set_volume(0.8);
        assert_eq!(backend.borrow().volume, 0.8);

        facade.toggle_mute();
        assert_eq!(backend.borrow().volume, 0.0);
        assert_eq!(store.get("audio.muted"), Some(json!(true)));

        facade.toggle_mute();
        assert_eq!(backend.borrow().volume, 0.8);
        assert_eq!(store.get("audio.muted"), Some(json!(false)));
    }

    fn markers_for(facade: &PlaybackFacade, starts: &[f64], duration: f64) {
        let verses: Vec<Verse> = starts
            .iter()
            .enumerate()
            .map(|(i, s)| Verse {
                index: i,
                display_number: (i + 1) as u32,
                start_time: Some(*s),
                ..Verse::default()
            })
            .collect();
        facade.bind_markers(TimingIndex::build(&verses).markers(duration));
    }

    #[test]
    fn touch_snaps_where_mouse_does_not() {
        let (facade, _, _) = scripted_facade(120.0);
        load_ready(&facade, "surah-2");
        markers_for(&facade, &[10.0, 60.0], 120.0);
        facade.take_events();

        // Marker at 50% of a 1000px track sits at 500px; a pointer at 50.4%
        // is 4px away. Mouse radius is 3px, touch radius is 6px.
        facade.seek_from_pointer_position(0.504, 1000.0, PointerKind::Mouse);
        assert!((facade.state().current_time - 60.48).abs() < 1e-9);
        let events = facade.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], TransportEvent::Seeked { .. }));

        facade.seek_from_pointer_position(0.504, 1000.0, PointerKind::Touch);
        assert_eq!(facade.state().current_time, 60.0);
        assert_eq!(
            facade.take_events(),
            [
                TransportEvent::SnapPulse { marker_index: 1 },
                TransportEvent::Seeked { position: 60.0 },
            ]
        );
    }

    #[test]
    fn snap_pulse_fires_once_per_entry() {
        let (facade, _, _) = scripted_facade(120.0);
        load_ready(&facade, "surah-2");
        markers_for(&facade, &[10.0, 60.0], 120.0);
        facade.take_events();

        facade.seek_from_pointer_position(0.5, 1000.0, PointerKind::Touch);
        facade.seek_from_pointer_position(0.502, 1000.0, PointerKind::Touch);
        let pulses = facade
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, TransportEvent::SnapPulse { .. }))
            .count();
        assert_eq!(pulses, 1);

        // Leaving the radius re-arms the pulse.
        facade.seek_from_pointer_position(0.9, 1000.0, PointerKind::Touch);
        facade.seek_from_pointer_position(0.5, 1000.0, PointerKind::Touch);
        assert!(
            facade
                .take_events()
                .contains(&TransportEvent::SnapPulse { marker_index: 1 })
        );
    }

    #[test]
    fn ended_playback_is_detected_on_tick() {
        let (facade, backend, _) = scripted_facade(90.0);
        load_ready(&facade, "surah-2");
        facade.play();
        facade.take_events();

        backend.borrow_mut().finished = true;
        facade.tick();

        assert_eq!(facade.lifecycle(), PlayerLifecycle::Paused);
        assert_eq!(facade.state().current_time, 90.0);
        assert_eq!(facade.take_events(), [TransportEvent::Ended]);
    }

    #[test]
    fn tick_publishes_current_time() {
        let (facade, _, store) = scripted_facade(90.0);
        load_ready(&facade, "surah-2");
        facade.play();
        facade.tick();
        let published = store.get("audio.currentTime").expect("published time");
        assert!(published.as_f64().expect("number") >= 0.0);
    }

    #[test]
    fn published_state_uses_camel_case_keys() {
        let (facade, _, store) = scripted_facade(120.0);
        load_ready(&facade, "surah-2");
        let audio = store.get("audio").expect("state published");
        assert_eq!(audio["loadedMediaId"], json!("surah-2"));
        assert_eq!(audio["duration"], json!(120.0));
        assert_eq!(audio["playing"], json!(false));
        assert_eq!(audio["loading"], json!(false));
    }

    #[test]
    fn unload_resets_and_invalidates_pending_loads() {
        let (facade, _, _) = scripted_facade(120.0);
        let token = facade.begin_load("surah-2", None);
        facade.unload();

        facade.apply_loaded(LoadResult {
            token,
            media_id: "surah-2".to_string(),
            url: "surah-2".to_string(),
            duration_hint: None,
            bytes: Ok(Vec::new()),
        });
        assert_eq!(facade.lifecycle(), PlayerLifecycle::Idle);
        assert_eq!(facade.state().loaded_media_id, None);
        assert_eq!(facade.state().current_time, 0.0);
    }
}
