//! Playback bridge traits and supporting audio types.
//!
//! These abstractions allow the core playback module to drive the host's
//! native audio player (AVPlayer, ExoPlayer, an HTML audio element) while
//! preserving a consistent, async-first API surface. The native player reports
//! progress through a [`PlayerStatusListener`] registered at load time rather
//! than through return values, mirroring how platform players behave.

use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Opaque identifier of a loaded native player instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandleId(Uuid);

impl NativeHandleId {
    /// Generate a new handle identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NativeHandleId {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw status report from a native player.
///
/// Fields follow what platform players expose; `duration` is `None` while the
/// stream length is still unknown (e.g. during initial buffering).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStatus {
    /// Whether the player has a decodable source loaded.
    pub is_loaded: bool,
    /// Current playback position.
    pub position: Duration,
    /// Total duration, when known.
    pub duration: Option<Duration>,
    /// Whether audio is currently being rendered.
    pub is_playing: bool,
    /// Whether the player is waiting for data.
    pub is_buffering: bool,
    /// Set on the single report emitted when the end of the stream is reached.
    pub did_just_finish: bool,
    /// Error message reported by the native layer, if any.
    pub error: Option<String>,
}

impl PlayerStatus {
    /// Status of a freshly loaded, paused source.
    pub fn loaded(duration: Option<Duration>) -> Self {
        Self {
            is_loaded: true,
            duration,
            ..Default::default()
        }
    }

    /// Status carrying a native error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Callback registered with the native player for one loaded source.
///
/// Implementations must be cheap and non-blocking; they are invoked from the
/// host's audio callback thread.
pub trait PlayerStatusListener: Send + Sync {
    fn on_status(&self, status: PlayerStatus);
}

/// Options applied when loading a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    /// How often the player should report status while loaded.
    pub progress_update_interval: Duration,
    /// Start playback as soon as the source is ready.
    pub should_play: bool,
    /// Keep pitch constant when the playback rate changes.
    pub correct_pitch: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            progress_update_interval: Duration::from_millis(200),
            should_play: false,
            correct_pitch: true,
        }
    }
}

/// Process-wide audio session behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSessionOptions {
    /// Continue playback while the app is backgrounded.
    pub stays_active_in_background: bool,
    /// Lower other apps' audio instead of stopping it.
    pub duck_others: bool,
}

impl Default for AudioSessionOptions {
    fn default() -> Self {
        Self {
            stays_active_in_background: true,
            duck_others: true,
        }
    }
}

/// Trait for the host's native audio player.
///
/// Each successful [`load`](NativeAudioPlayer::load) allocates native decoder
/// and audio-session resources that stay alive until
/// [`unload`](NativeAudioPlayer::unload) is called for the returned handle.
#[async_trait::async_trait]
pub trait NativeAudioPlayer: Send + Sync {
    /// Configure the process-wide audio session. Called once at startup.
    async fn configure_session(&self, _options: AudioSessionOptions) -> Result<()> {
        Ok(())
    }

    /// Open `uri` (local file path or HTTP(S) URL) and register `listener` for
    /// its status reports.
    async fn load(
        &self,
        uri: &str,
        options: LoadOptions,
        listener: Arc<dyn PlayerStatusListener>,
    ) -> Result<NativeHandleId>;

    /// Begin or resume playback.
    async fn play(&self, handle: NativeHandleId) -> Result<()>;

    /// Pause playback without releasing the handle.
    async fn pause(&self, handle: NativeHandleId) -> Result<()>;

    /// Seek to an absolute position.
    async fn seek(&self, handle: NativeHandleId, position: Duration) -> Result<()>;

    /// Change the playback rate.
    async fn set_rate(&self, handle: NativeHandleId, rate: f32, correct_pitch: bool)
        -> Result<()>;

    /// Stop playback and free all resources of `handle`.
    async fn unload(&self, handle: NativeHandleId) -> Result<()>;
}
