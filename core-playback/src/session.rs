//! # Session Controller
//!
//! The single process-wide audio session. UI code calls into the controller
//! only; it coordinates the position store, the track resolver and the
//! engine adapter, and publishes its state through a `watch` channel.
//!
//! ## States
//!
//! ```text
//!            play_track                first duration-bearing status
//!   Idle ───────────────> Loading ───────────────────────────────> Playing ⇄ Paused
//!    ▲                       │                                        │
//!    │        load error     │               natural completion       │
//!    └───────────────────────┴────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! State lives behind a `parking_lot::Mutex` that is never held across an
//! await. Each load gets a generation from the engine; status reports and
//! continuations of a superseded `play_track` compare their generation with
//! the current one and back off on mismatch.

use core_runtime::config::{CoreConfig, HostPlatform};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_runtime::logging::redact_url;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::catalog::{Catalog, TrackDescriptor};
use crate::config::SessionConfig;
use crate::engine::{EngineStatus, LoadOutcome, PlaybackEngine};
use crate::error::{PlaybackError, Result};
use crate::position_store::PositionStore;
use crate::rate::PlaybackRate;
use crate::resolver::TrackResolver;

/// Lifecycle phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No track, or the last track ran to its end.
    #[default]
    Idle,
    /// Track requested; waiting for the engine to report a duration.
    Loading,
    Playing,
    Paused,
}

/// UI-facing state of the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub current_uri: Option<String>,
    pub current_track_id: Option<String>,
    pub current_title: Option<String>,
    pub is_playing: bool,
    pub is_loading: bool,
    pub position_ms: u64,
    /// 0 while unknown.
    pub duration_ms: u64,
    pub playback_rate: PlaybackRate,
}

/// Arguments of [`SessionController::play_track`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayRequest {
    pub uri: String,
    pub title: Option<String>,
    /// Replaces the session queue when present.
    pub queue: Option<Vec<TrackDescriptor>>,
    pub track_id: Option<String>,
}

impl PlayRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_queue(mut self, queue: Vec<TrackDescriptor>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn with_track_id(mut self, track_id: impl Into<String>) -> Self {
        self.track_id = Some(track_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Next,
    Previous,
}

struct SessionState {
    /// Generation of the load backing `current_uri`.
    generation: u64,
    current_uri: Option<String>,
    current_track_id: Option<String>,
    current_title: Option<String>,
    queue: Vec<TrackDescriptor>,
    phase: SessionPhase,
    is_playing: bool,
    is_loading: bool,
    position_ms: u64,
    duration_ms: u64,
    rate: PlaybackRate,
    pending_restore_ms: Option<u64>,
    /// The engine holds a handle for `generation`.
    handle_ready: bool,
    /// Restore seek, rate and play have not been issued yet.
    awaiting_start: bool,
    /// Start playing once the track is ready; cleared by a pause during loading.
    play_when_ready: bool,
    /// Bumped on every natural completion; position writes carry the value they started with.
    completions: u64,
    last_completed_uri: Option<String>,
}

impl SessionState {
    fn new(queue: Vec<TrackDescriptor>, rate: PlaybackRate) -> Self {
        Self {
            generation: 0,
            current_uri: None,
            current_track_id: None,
            current_title: None,
            queue,
            phase: SessionPhase::Idle,
            is_playing: false,
            is_loading: false,
            position_ms: 0,
            duration_ms: 0,
            rate,
            pending_restore_ms: None,
            handle_ready: false,
            awaiting_start: false,
            play_when_ready: false,
            completions: 0,
            last_completed_uri: None,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            current_uri: self.current_uri.clone(),
            current_track_id: self.current_track_id.clone(),
            current_title: self.current_title.clone(),
            is_playing: self.is_playing,
            is_loading: self.is_loading,
            position_ms: self.position_ms,
            duration_ms: self.duration_ms,
            playback_rate: self.rate,
        }
    }

    fn reset_to_idle(&mut self) {
        self.current_uri = None;
        self.current_track_id = None;
        self.current_title = None;
        self.phase = SessionPhase::Idle;
        self.is_playing = false;
        self.is_loading = false;
        self.position_ms = 0;
        self.duration_ms = 0;
        self.pending_restore_ms = None;
        self.handle_ready = false;
        self.awaiting_start = false;
        self.play_when_ready = false;
    }

    /// Current track and position, when there is something worth saving.
    fn resumable_position(&self) -> Option<PositionWrite> {
        if self.position_ms == 0 || self.is_loading {
            return None;
        }
        self.current_uri
            .clone()
            .map(|uri| self.position_write(uri, self.position_ms))
    }

    fn position_write(&self, uri: String, position_ms: u64) -> PositionWrite {
        PositionWrite {
            uri,
            position_ms,
            epoch: self.completions,
        }
    }

    /// `uri` ran to its end after a write tagged with `epoch` was captured.
    fn completed_since(&self, uri: &str, epoch: u64) -> bool {
        self.completions != epoch && self.last_completed_uri.as_deref() == Some(uri)
    }
}

/// A position captured under the state lock, persisted later.
#[derive(Debug, PartialEq, Eq)]
struct PositionWrite {
    uri: String,
    position_ms: u64,
    epoch: u64,
}

enum PlayAction {
    Toggle { playing: bool },
    Ignore,
    Load,
}

enum StatusFollowUp {
    Nothing,
    Fail(String),
    Finish(String),
    Start,
}

/// Process-wide audio session.
pub struct SessionController {
    config: SessionConfig,
    platform: HostPlatform,
    positions: PositionStore,
    resolver: TrackResolver,
    engine: PlaybackEngine,
    events: EventBus,
    state: Mutex<SessionState>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    /// Orders position writes against completion clears.
    writes: tokio::sync::Mutex<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionController {
    /// Build the session and start its background tasks.
    ///
    /// Configures the native audio session, restores the persisted playback
    /// speed and uses the catalog's audio tracks as the initial queue.
    pub async fn start(
        core: &CoreConfig,
        config: SessionConfig,
        catalog: &Catalog,
        events: EventBus,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        if let Err(e) = core
            .audio_player
            .configure_session(config.audio_session_options())
            .await
        {
            warn!(error = %e, "Failed to configure audio session");
        }

        let positions = PositionStore::new(Arc::clone(&core.settings_store));
        let rate = positions.load_speed().await.unwrap_or_default();
        let resolver = TrackResolver::new(
            Arc::clone(&core.download_store),
            config.fallback_title.clone(),
            config.default_extension.clone(),
        );
        let (engine, status_rx) =
            PlaybackEngine::new(Arc::clone(&core.audio_player), config.load_options());

        let state = SessionState::new(catalog.audio_tracks(), rate);
        let (snapshot_tx, _) = watch::channel(state.snapshot());

        let session = Arc::new(Self {
            config,
            platform: core.platform,
            positions,
            resolver,
            engine,
            events,
            state: Mutex::new(state),
            snapshot_tx,
            writes: tokio::sync::Mutex::new(()),
            tasks: Mutex::new(Vec::new()),
        });

        let status_task = tokio::spawn(run_status_pump(Arc::downgrade(&session), status_rx));
        let save_task = tokio::spawn(run_position_saver(
            Arc::downgrade(&session),
            session.config.position_save_interval,
        ));
        session.tasks.lock().extend([status_task, save_task]);

        info!(rate = %rate, platform = ?session.platform, "Audio session started");
        Ok(session)
    }

    /// Current UI-facing state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().snapshot()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn queue(&self) -> Vec<TrackDescriptor> {
        self.state.lock().queue.clone()
    }

    pub fn playback_rate(&self) -> PlaybackRate {
        self.state.lock().rate
    }

    pub fn resolver(&self) -> &TrackResolver {
        &self.resolver
    }

    fn publish(&self) {
        let snapshot = self.state.lock().snapshot();
        self.snapshot_tx.send_replace(snapshot);
    }

    fn emit(&self, event: PlaybackEvent) {
        self.events.emit(CoreEvent::Playback(event)).ok();
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Play `request.uri`, or toggle play/pause when it is already the current track.
    ///
    /// Returns [`PlaybackError::Load`] when the engine cannot open the URI and
    /// this request is still the current one. A request superseded by a newer
    /// `play_track` returns `Ok(())`.
    pub async fn play_track(&self, request: PlayRequest) -> Result<()> {
        let PlayRequest {
            uri,
            title,
            queue,
            track_id,
        } = request;

        let action = {
            let mut state = self.state.lock();
            if state.current_uri.as_deref() == Some(uri.as_str()) {
                if let Some(queue) = queue.clone() {
                    state.queue = queue;
                }
                match state.phase {
                    SessionPhase::Loading => PlayAction::Ignore,
                    SessionPhase::Playing | SessionPhase::Paused => PlayAction::Toggle {
                        playing: state.is_playing,
                    },
                    SessionPhase::Idle if state.handle_ready => PlayAction::Toggle { playing: false },
                    SessionPhase::Idle => PlayAction::Load,
                }
            } else {
                PlayAction::Load
            }
        };

        match action {
            PlayAction::Ignore => {
                debug!(uri = %redact_url(&uri), "Track already loading");
                Ok(())
            }
            PlayAction::Toggle { playing: true } => self.pause(true).await,
            PlayAction::Toggle { playing: false } => self.resume().await,
            PlayAction::Load => self.load_track(uri, title, queue, track_id).await,
        }
    }

    async fn load_track(
        &self,
        uri: String,
        title: Option<String>,
        queue: Option<Vec<TrackDescriptor>>,
        track_id: Option<String>,
    ) -> Result<()> {
        let ticket = self.engine.begin_load();
        let generation = ticket.generation();

        let (previous, title, track_id) = {
            let mut state = self.state.lock();
            let previous = state.resumable_position();

            if let Some(queue) = queue {
                state.queue = queue;
            }
            let metadata = self
                .resolver
                .resolve_metadata(&state.queue, &uri, track_id.as_deref());
            let title = title.unwrap_or(metadata.title);

            state.reset_to_idle();
            state.generation = generation;
            state.current_uri = Some(uri.clone());
            state.current_track_id = metadata.track_id.clone();
            state.current_title = Some(title.clone());
            state.phase = SessionPhase::Loading;
            state.is_loading = true;
            state.is_playing = true;
            state.awaiting_start = true;
            state.play_when_ready = true;

            (previous, title, metadata.track_id)
        };
        self.publish();
        info!(uri = %redact_url(&uri), generation, track_id = ?track_id, "Loading track");
        self.emit(PlaybackEvent::Loading {
            uri: uri.clone(),
            title,
            track_id,
        });

        if let Some(previous) = previous {
            self.persist_position(previous).await;
        }

        let saved = self.positions.load(&uri).await;
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                return Ok(());
            }
            if state.pending_restore_ms.is_none() {
                state.pending_restore_ms = saved.filter(|ms| *ms > 0);
            }
        }

        match self.engine.load(ticket, &uri).await {
            Ok(LoadOutcome::Superseded) => {
                debug!(generation, "Load superseded by a newer request");
                Ok(())
            }
            Ok(LoadOutcome::Loaded) => {
                {
                    let mut state = self.state.lock();
                    if state.generation != generation {
                        return Ok(());
                    }
                    state.handle_ready = true;
                }
                self.try_start(generation).await
            }
            Err(e) => self.fail(generation, e).await,
        }
    }

    /// Issue the restore seek, the rate and play once the track has a duration.
    ///
    /// Runs at most once per generation.
    async fn try_start(&self, generation: u64) -> Result<()> {
        let (uri, title, restore, rate, play) = {
            let mut state = self.state.lock();
            if state.generation != generation
                || !state.handle_ready
                || !state.awaiting_start
                || state.duration_ms == 0
            {
                return Ok(());
            }
            state.awaiting_start = false;
            let duration_ms = state.duration_ms;
            let restore = state
                .pending_restore_ms
                .take()
                .filter(|ms| *ms < duration_ms);
            (
                state.current_uri.clone().unwrap_or_default(),
                state.current_title.clone().unwrap_or_default(),
                restore,
                state.rate,
                state.play_when_ready,
            )
        };

        if let Some(position_ms) = restore {
            if let Err(e) = self.engine.seek_to(position_ms as f64).await {
                warn!(error = %e, position_ms, "Failed to restore position");
            } else {
                {
                    let mut state = self.state.lock();
                    if state.generation == generation {
                        state.position_ms = position_ms;
                    }
                }
                debug!(position_ms, "Restored saved position");
                self.emit(PlaybackEvent::PositionRestored {
                    uri: uri.clone(),
                    position_ms,
                });
            }
        }

        if let Err(e) = self.engine.set_rate(rate).await {
            warn!(error = %e, rate = %rate, "Failed to apply playback rate");
        }

        if play {
            if let Err(e) = self.engine.play().await {
                return self.fail(generation, e).await;
            }
        }

        {
            let mut state = self.state.lock();
            if state.generation != generation {
                return Ok(());
            }
            state.is_loading = false;
            state.is_playing = play;
            state.phase = if play {
                SessionPhase::Playing
            } else {
                SessionPhase::Paused
            };
        }
        self.publish();
        if play {
            info!(uri = %redact_url(&uri), "Playback started");
            self.emit(PlaybackEvent::Started { uri, title });
        }
        Ok(())
    }

    /// Reset to idle after an engine failure on `generation`.
    ///
    /// Only the current generation is reset; a failure of a superseded load is
    /// swallowed.
    async fn fail(&self, generation: u64, cause: PlaybackError) -> Result<()> {
        let uri = {
            let mut state = self.state.lock();
            if state.generation != generation || state.current_uri.is_none() {
                debug!(generation, error = %cause, "Ignoring failure of superseded load");
                return Ok(());
            }
            let uri = state.current_uri.clone().unwrap_or_default();
            state.reset_to_idle();
            uri
        };
        self.publish();
        self.engine.release_generation(generation).await;

        let cause = match cause {
            PlaybackError::Load { cause, .. } => cause,
            other => other.to_string(),
        };
        error!(uri = %redact_url(&uri), cause = %cause, "Playback failed");

        if self.platform.is_web() && self.config.is_restricted_stream(&uri) {
            self.emit(PlaybackEvent::OpenExternally {
                url: uri.clone(),
                message: "This file host does not allow in-app streaming. Open it in the browser instead."
                    .to_string(),
            });
        } else {
            self.emit(PlaybackEvent::Error {
                uri: uri.clone(),
                message: cause.clone(),
            });
        }

        Err(PlaybackError::Load { uri, cause })
    }

    /// Pause the current track and optionally persist its position.
    ///
    /// During loading this cancels the pending auto-play instead.
    pub async fn pause(&self, save_position: bool) -> Result<()> {
        let (uri, position_ms, epoch, was_playing) = {
            let mut state = self.state.lock();
            let Some(uri) = state.current_uri.clone() else {
                return Ok(());
            };
            if state.phase == SessionPhase::Loading {
                state.play_when_ready = false;
                state.is_playing = false;
                drop(state);
                self.publish();
                return Ok(());
            }
            let was_playing = state.is_playing;
            if was_playing {
                state.is_playing = false;
                state.phase = SessionPhase::Paused;
            }
            (uri, state.position_ms, state.completions, was_playing)
        };

        let mut result = Ok(());
        if was_playing {
            self.publish();
            result = self.engine.pause().await;
            if let Err(e) = &result {
                warn!(error = %e, "Failed to pause");
            }
            self.emit(PlaybackEvent::Paused {
                uri: uri.clone(),
                position_ms,
            });
        }

        if save_position && position_ms > 0 {
            self.persist_position(PositionWrite {
                uri,
                position_ms,
                epoch,
            })
            .await;
        }
        result
    }

    /// Resume the loaded track.
    pub async fn resume(&self) -> Result<()> {
        let (uri, generation) = {
            let mut state = self.state.lock();
            let Some(uri) = state.current_uri.clone() else {
                return Ok(());
            };
            if state.phase == SessionPhase::Loading {
                state.play_when_ready = true;
                state.is_playing = true;
                drop(state);
                self.publish();
                return Ok(());
            }
            if !state.handle_ready || state.is_playing {
                return Ok(());
            }
            state.is_playing = true;
            state.phase = SessionPhase::Playing;
            (uri, state.generation)
        };
        self.publish();

        if let Err(e) = self.engine.play().await {
            return self.fail(generation, e).await;
        }
        self.emit(PlaybackEvent::Resumed { uri });
        Ok(())
    }

    /// Seek to `position_ms` and persist it.
    ///
    /// Non-finite or negative targets are ignored; targets past a known
    /// duration are clamped. Before the track has started, the target
    /// replaces the pending restore offset.
    pub async fn seek_to(&self, position_ms: f64) -> Result<()> {
        if !position_ms.is_finite() || position_ms < 0.0 {
            debug!(position_ms, "Ignoring invalid seek target");
            return Ok(());
        }

        let (write, deferred) = {
            let mut state = self.state.lock();
            let Some(uri) = state.current_uri.clone() else {
                return Ok(());
            };
            let mut target = position_ms.round() as u64;
            if state.duration_ms > 0 && target > state.duration_ms {
                debug!(target, duration_ms = state.duration_ms, "Clamping seek target");
                target = state.duration_ms;
            }
            state.position_ms = target;
            let deferred = state.awaiting_start;
            if deferred {
                state.pending_restore_ms = Some(target);
            }
            (state.position_write(uri, target), deferred)
        };
        let target = write.position_ms;
        self.publish();

        let result = if deferred {
            Ok(())
        } else {
            self.engine.seek_to(target as f64).await
        };
        if let Err(e) = &result {
            warn!(error = %e, target, "Seek failed");
        }

        self.persist_position(write).await;
        result
    }

    /// Move by `delta_secs`, clamped to `[0, duration]`.
    ///
    /// With an unknown duration only the lower bound applies.
    pub async fn skip(&self, delta_secs: f64) -> Result<()> {
        if !delta_secs.is_finite() {
            debug!(delta_secs, "Ignoring invalid skip");
            return Ok(());
        }
        let target = {
            let state = self.state.lock();
            let upper = if state.duration_ms > 0 {
                state.duration_ms as f64
            } else {
                f64::INFINITY
            };
            (state.position_ms as f64 + delta_secs * 1000.0).clamp(0.0, upper)
        };
        self.seek_to(target).await
    }

    /// Set the global speed. Applies to the live track and is persisted.
    pub async fn set_playback_speed(&self, rate: f32) -> Result<PlaybackRate> {
        let rate = PlaybackRate::new(rate)?;
        self.apply_speed(rate).await;
        Ok(rate)
    }

    /// Advance to the next allowed speed, wrapping from 2.0 to 1.0.
    pub async fn cycle_playback_speed(&self) -> PlaybackRate {
        let rate = self.playback_rate().next();
        self.apply_speed(rate).await;
        rate
    }

    async fn apply_speed(&self, rate: PlaybackRate) {
        let live = {
            let mut state = self.state.lock();
            state.rate = rate;
            state.handle_ready && !state.awaiting_start
        };
        self.publish();

        if live {
            if let Err(e) = self.engine.set_rate(rate).await {
                warn!(error = %e, rate = %rate, "Failed to apply playback rate");
            }
        }
        self.positions.save_speed(rate).await;
        debug!(rate = %rate, "Playback speed changed");
        self.emit(PlaybackEvent::SpeedChanged {
            rate: rate.as_f32(),
        });
    }

    /// Play the next audio track of the queue, wrapping to the first.
    pub async fn next_track(&self) -> Result<()> {
        self.step(Direction::Next).await
    }

    /// Play the previous audio track of the queue, wrapping to the last.
    pub async fn previous_track(&self) -> Result<()> {
        self.step(Direction::Previous).await
    }

    async fn step(&self, direction: Direction) -> Result<()> {
        let Some(target) = self.neighbour(direction) else {
            debug!("Queue has no audio tracks");
            return Ok(());
        };
        let uri = self.resolver.resolve_playback_uri(&target).await;
        self.play_track(
            PlayRequest::new(uri)
                .with_title(target.name.clone())
                .with_track_id(target.id.clone()),
        )
        .await
    }

    fn neighbour(&self, direction: Direction) -> Option<TrackDescriptor> {
        let state = self.state.lock();
        let audio: Vec<&TrackDescriptor> = state.queue.iter().filter(|d| d.is_audio()).collect();
        if audio.is_empty() {
            return None;
        }

        let by_id = state
            .current_track_id
            .as_deref()
            .and_then(|id| audio.iter().position(|d| d.id == id));
        let index = by_id.or_else(|| {
            state
                .current_uri
                .as_deref()
                .and_then(|uri| audio.iter().position(|d| self.resolver.matches_uri(d, uri)))
        });

        let len = audio.len();
        let target = match (direction, index) {
            (Direction::Next, Some(i)) => (i + 1) % len,
            (Direction::Next, None) => 0,
            (Direction::Previous, Some(i)) => (i + len - 1) % len,
            (Direction::Previous, None) => len - 1,
        };
        Some(audio[target].clone())
    }

    /// Persist the position, stop background tasks and release the engine.
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            task.abort();
        }

        let previous = {
            let mut state = self.state.lock();
            let previous = state.resumable_position();
            state.reset_to_idle();
            previous
        };
        if let Some(previous) = previous {
            self.persist_position(previous).await;
        }
        self.engine.release().await;
        self.publish();
        info!("Audio session shut down");
    }

    // ========================================================================
    // Engine feedback
    // ========================================================================

    async fn apply_status(&self, status: EngineStatus) {
        let EngineStatus {
            generation,
            snapshot,
        } = status;

        let follow_up = {
            let mut state = self.state.lock();
            if generation != state.generation || state.current_uri.is_none() {
                trace!(generation, current = state.generation, "Discarding stale status");
                return;
            }

            if let Some(message) = snapshot.error {
                StatusFollowUp::Fail(message)
            } else {
                // A finished track stays rewound until it is played again.
                if state.phase != SessionPhase::Idle {
                    state.position_ms = snapshot.position_ms;
                }
                if snapshot.duration_ms > 0 {
                    state.duration_ms = snapshot.duration_ms;
                }
                if !state.is_loading
                    && matches!(state.phase, SessionPhase::Playing | SessionPhase::Paused)
                {
                    state.is_playing = snapshot.playing;
                    state.phase = if snapshot.playing {
                        SessionPhase::Playing
                    } else {
                        SessionPhase::Paused
                    };
                }

                let reached_end = !snapshot.playing
                    && state.duration_ms > 0
                    && state.position_ms >= state.duration_ms;
                let finished = !state.is_loading
                    && state.phase != SessionPhase::Idle
                    && (snapshot.did_finish || reached_end);

                if finished {
                    let uri = state.current_uri.clone().unwrap_or_default();
                    state.is_playing = false;
                    state.position_ms = 0;
                    state.phase = SessionPhase::Idle;
                    state.completions += 1;
                    state.last_completed_uri = Some(uri.clone());
                    StatusFollowUp::Finish(uri)
                } else if state.awaiting_start && state.handle_ready && state.duration_ms > 0 {
                    StatusFollowUp::Start
                } else {
                    StatusFollowUp::Nothing
                }
            }
        };
        self.publish();

        match follow_up {
            StatusFollowUp::Nothing => {}
            StatusFollowUp::Start => {
                // Load errors are surfaced through events here; the caller is the status pump.
                self.try_start(generation).await.ok();
            }
            StatusFollowUp::Fail(message) => {
                self.fail(
                    generation,
                    PlaybackError::Engine(message),
                )
                .await
                .ok();
            }
            StatusFollowUp::Finish(uri) => {
                info!(uri = %redact_url(&uri), "Track completed");
                {
                    let _ordered = self.writes.lock().await;
                    self.positions.clear(&uri).await;
                }
                if let Err(e) = self.engine.seek_to(0.0).await {
                    warn!(error = %e, "Failed to rewind finished track");
                }
                self.emit(PlaybackEvent::Completed { uri });
            }
        }
    }

    async fn save_tick(&self) {
        let playing = {
            let state = self.state.lock();
            if state.is_playing {
                state.resumable_position()
            } else {
                None
            }
        };
        if let Some(write) = playing {
            trace!(position_ms = write.position_ms, "Periodic position save");
            self.persist_position(write).await;
        }
    }

    /// Persist a captured position unless its track has completed since.
    ///
    /// Shares one queue with the completion clear, so a slow write can never
    /// land after the clear of the same track.
    async fn persist_position(&self, write: PositionWrite) {
        let _ordered = self.writes.lock().await;
        let completed = self.state.lock().completed_since(&write.uri, write.epoch);
        if completed {
            debug!(position_ms = write.position_ms, "Dropping position of a completed track");
            return;
        }
        self.positions.save(&write.uri, write.position_ms).await;
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("snapshot", &self.snapshot())
            .field("engine", &self.engine)
            .finish()
    }
}

async fn run_status_pump(
    session: Weak<SessionController>,
    mut status_rx: mpsc::UnboundedReceiver<EngineStatus>,
) {
    while let Some(status) = status_rx.recv().await {
        let Some(session) = session.upgrade() else {
            break;
        };
        session.apply_status(status).await;
    }
}

async fn run_position_saver(session: Weak<SessionController>, period: std::time::Duration) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(session) = session.upgrade() else {
            break;
        };
        session.save_tick().await;
    }
}
