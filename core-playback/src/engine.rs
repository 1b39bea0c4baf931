//! # Playback Engine Adapter
//!
//! Owns at most one native player handle and normalizes the native status
//! callbacks into [`StatusSnapshot`]s.
//!
//! ## Generations
//!
//! Every load is tagged with a generation taken from [`PlaybackEngine::begin_load`].
//! Status reports are forwarded as [`EngineStatus`] carrying that generation,
//! so consumers can drop reports from a track they already switched away from.
//! A native load that completes after a newer load was requested is unloaded
//! immediately and reported as [`LoadOutcome::Superseded`].
//!
//! ```text
//!  begin_load() ──> LoadTicket{gen}
//!        │
//!        ▼
//!  load(ticket, uri) ── release previous handle
//!        │           ── native load (listener tagged with gen)
//!        ▼
//!  gen still latest? ── yes ─> Loaded
//!        └──────────── no ──> unload new handle, Superseded
//! ```

use bridge_traits::{LoadOptions, NativeAudioPlayer, NativeHandleId, PlayerStatus, PlayerStatusListener};
use core_runtime::logging::redact_url;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::error::{PlaybackError, Result};
use crate::rate::PlaybackRate;

/// Normalized status of the loaded track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub position_ms: u64,
    /// 0 while unknown.
    pub duration_ms: u64,
    pub playing: bool,
    pub buffering: bool,
    pub did_finish: bool,
    pub error: Option<String>,
}

impl From<&PlayerStatus> for StatusSnapshot {
    fn from(status: &PlayerStatus) -> Self {
        Self {
            position_ms: duration_to_ms(status.position),
            duration_ms: status.duration.map(duration_to_ms).unwrap_or(0),
            playing: status.is_playing,
            buffering: status.is_buffering,
            did_finish: status.did_just_finish,
            error: status.error.clone(),
        }
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A status report tagged with the generation of the load that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub generation: u64,
    pub snapshot: StatusSnapshot,
}

/// Reservation for one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of a load that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The handle is now the engine's current handle.
    Loaded,
    /// A newer load was requested meanwhile; the handle was released again.
    Superseded,
}

/// Listener registered with the native player for one load.
///
/// Goes silent once its handle is released; that is the unsubscribe.
struct GenerationListener {
    generation: u64,
    active: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<EngineStatus>,
}

impl PlayerStatusListener for GenerationListener {
    fn on_status(&self, status: PlayerStatus) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        let report = EngineStatus {
            generation: self.generation,
            snapshot: StatusSnapshot::from(&status),
        };
        if self.tx.send(report).is_err() {
            trace!(generation = self.generation, "Status receiver gone");
        }
    }
}

struct LoadedHandle {
    id: NativeHandleId,
    generation: u64,
    uri: String,
    active: Arc<AtomicBool>,
}

#[derive(Default)]
struct EngineState {
    latest_generation: u64,
    current: Option<LoadedHandle>,
}

pub struct PlaybackEngine {
    player: Arc<dyn NativeAudioPlayer>,
    options: LoadOptions,
    state: Mutex<EngineState>,
    status_tx: mpsc::UnboundedSender<EngineStatus>,
}

impl PlaybackEngine {
    /// Create the engine and the receiving end of its status stream.
    pub fn new(
        player: Arc<dyn NativeAudioPlayer>,
        options: LoadOptions,
    ) -> (Self, mpsc::UnboundedReceiver<EngineStatus>) {
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let engine = Self {
            player,
            options,
            state: Mutex::new(EngineState::default()),
            status_tx,
        };
        (engine, status_rx)
    }

    /// Reserve the next generation. Any load holding an older ticket is now stale.
    pub fn begin_load(&self) -> LoadTicket {
        let mut state = self.state.lock();
        state.latest_generation += 1;
        LoadTicket {
            generation: state.latest_generation,
        }
    }

    pub fn is_latest(&self, ticket: LoadTicket) -> bool {
        self.state.lock().latest_generation == ticket.generation
    }

    /// Load `uri`, replacing the current handle.
    ///
    /// The previous handle is released before the native load starts.
    pub async fn load(&self, ticket: LoadTicket, uri: &str) -> Result<LoadOutcome> {
        let previous = {
            let mut state = self.state.lock();
            if state.latest_generation != ticket.generation {
                return Ok(LoadOutcome::Superseded);
            }
            state.current.take()
        };
        if let Some(previous) = previous {
            self.unload_handle(previous).await;
        }

        let active = Arc::new(AtomicBool::new(true));
        let listener = Arc::new(GenerationListener {
            generation: ticket.generation,
            active: Arc::clone(&active),
            tx: self.status_tx.clone(),
        });

        debug!(uri = %redact_url(uri), generation = ticket.generation, "Loading native player");
        let id = match self.player.load(uri, self.options, listener).await {
            Ok(id) => id,
            Err(e) => {
                active.store(false, Ordering::Release);
                return Err(PlaybackError::Load {
                    uri: uri.to_string(),
                    cause: e.to_string(),
                });
            }
        };

        let stale = {
            let mut state = self.state.lock();
            if state.latest_generation == ticket.generation {
                state.current = Some(LoadedHandle {
                    id,
                    generation: ticket.generation,
                    uri: uri.to_string(),
                    active: Arc::clone(&active),
                });
                false
            } else {
                true
            }
        };

        if stale {
            debug!(generation = ticket.generation, "Load superseded, releasing late handle");
            self.unload_handle(LoadedHandle {
                id,
                generation: ticket.generation,
                uri: uri.to_string(),
                active,
            })
            .await;
            return Ok(LoadOutcome::Superseded);
        }

        Ok(LoadOutcome::Loaded)
    }

    fn current_handle(&self) -> Option<NativeHandleId> {
        self.state.lock().current.as_ref().map(|h| h.id)
    }

    /// Generation of the loaded handle, if any.
    pub fn loaded_generation(&self) -> Option<u64> {
        self.state.lock().current.as_ref().map(|h| h.generation)
    }

    pub fn loaded_uri(&self) -> Option<String> {
        self.state.lock().current.as_ref().map(|h| h.uri.clone())
    }

    pub async fn play(&self) -> Result<()> {
        let Some(handle) = self.current_handle() else {
            return Ok(());
        };
        self.player.play(handle).await.map_err(engine_error)
    }

    pub async fn pause(&self) -> Result<()> {
        let Some(handle) = self.current_handle() else {
            return Ok(());
        };
        self.player.pause(handle).await.map_err(engine_error)
    }

    /// Seek the loaded track. NaN, negative and infinite targets are ignored.
    pub async fn seek_to(&self, position_ms: f64) -> Result<()> {
        if !position_ms.is_finite() || position_ms < 0.0 {
            debug!(position_ms, "Ignoring invalid seek target");
            return Ok(());
        }
        let Some(handle) = self.current_handle() else {
            return Ok(());
        };
        let target = Duration::from_millis(position_ms.round() as u64);
        self.player.seek(handle, target).await.map_err(engine_error)
    }

    /// Change the speed of the loaded track, keeping pitch constant.
    pub async fn set_rate(&self, rate: PlaybackRate) -> Result<()> {
        let Some(handle) = self.current_handle() else {
            return Ok(());
        };
        self.player
            .set_rate(handle, rate.as_f32(), true)
            .await
            .map_err(engine_error)
    }

    /// Release the current handle and invalidate in-flight loads. Idempotent.
    pub async fn release(&self) {
        let current = {
            let mut state = self.state.lock();
            state.latest_generation += 1;
            state.current.take()
        };
        if let Some(handle) = current {
            self.unload_handle(handle).await;
        }
    }

    /// Release only if `generation` is still the latest request.
    ///
    /// Returns `false` when a newer load has taken over.
    pub async fn release_generation(&self, generation: u64) -> bool {
        let current = {
            let mut state = self.state.lock();
            if state.latest_generation != generation {
                return false;
            }
            state.latest_generation += 1;
            state.current.take()
        };
        if let Some(handle) = current {
            self.unload_handle(handle).await;
        }
        true
    }

    async fn unload_handle(&self, handle: LoadedHandle) {
        handle.active.store(false, Ordering::Release);
        if let Err(e) = self.player.unload(handle.id).await {
            warn!(
                error = %e,
                uri = %redact_url(&handle.uri),
                generation = handle.generation,
                "Failed to unload native player"
            );
        }
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PlaybackEngine")
            .field("latest_generation", &state.latest_generation)
            .field("loaded", &state.current.as_ref().map(|h| h.generation))
            .finish()
    }
}

fn engine_error(e: bridge_traits::BridgeError) -> PlaybackError {
    PlaybackError::Engine(e.to_string())
}
