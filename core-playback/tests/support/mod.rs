//! Shared doubles for the session integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    BridgeError, DownloadStore, LoadOptions, NativeAudioPlayer, NativeHandleId, PlayerStatus,
    PlayerStatusListener, SettingsStore,
};
use core_playback::position_store::POSITION_KEY_PREFIX;
use core_playback::{Catalog, Category, SessionConfig, SessionController, SessionSnapshot, TrackDescriptor};
use core_runtime::config::{CoreConfig, HostPlatform};
use core_runtime::events::{CoreEvent, EventBus};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

pub const TRACK_LENGTH: Duration = Duration::from_secs(60);
const WAIT_LIMIT: Duration = Duration::from_secs(2);

// ============================================================================
// Native player
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(String),
    Play(String),
    Pause(String),
    Seek(String, u64),
    Rate(String, f32),
    Unload(String),
}

struct FakeHandle {
    uri: String,
    listener: Arc<dyn PlayerStatusListener>,
    position: Duration,
    playing: bool,
}

impl FakeHandle {
    fn status(&self) -> PlayerStatus {
        PlayerStatus {
            is_loaded: true,
            position: self.position,
            duration: Some(TRACK_LENGTH),
            is_playing: self.playing,
            ..Default::default()
        }
    }
}

/// Native player double that reports status synchronously on every command.
#[derive(Default)]
pub struct FakeAudioPlayer {
    handles: Mutex<HashMap<NativeHandleId, FakeHandle>>,
    calls: Mutex<Vec<Call>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeAudioPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Hold loads of `uri` until the returned gate is notified.
    pub fn gate(&self, uri: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(uri.to_string(), gate.clone());
        gate
    }

    pub fn fail_loads_of(&self, uri: &str) {
        self.failing.lock().insert(uri.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn load_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Load(_)))
            .count()
    }

    pub fn play_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Play(_)))
            .count()
    }

    pub fn seeks_of(&self, uri: &str) -> Vec<u64> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Seek(u, ms) if u == uri => Some(*ms),
                _ => None,
            })
            .collect()
    }

    pub fn rates(&self) -> Vec<f32> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Rate(_, rate) => Some(*rate),
                _ => None,
            })
            .collect()
    }

    /// URIs of handles that are loaded and not yet unloaded.
    pub fn live_uris(&self) -> Vec<String> {
        self.handles.lock().values().map(|h| h.uri.clone()).collect()
    }

    /// Report playback progress of the live handle of `uri`.
    pub fn progress(&self, uri: &str, position: Duration) {
        self.report(uri, |handle| {
            handle.position = position;
            handle.status()
        });
    }

    /// Report that the live handle of `uri` reached its end.
    pub fn finish(&self, uri: &str) {
        self.report(uri, |handle| {
            handle.position = TRACK_LENGTH;
            handle.playing = false;
            PlayerStatus {
                did_just_finish: true,
                ..handle.status()
            }
        });
    }

    /// Report a native error on the live handle of `uri`.
    pub fn break_stream(&self, uri: &str, message: &str) {
        self.report(uri, |_| PlayerStatus::failed(message));
    }

    fn report(&self, uri: &str, update: impl FnOnce(&mut FakeHandle) -> PlayerStatus) {
        let delivery = {
            let mut handles = self.handles.lock();
            handles
                .values_mut()
                .find(|h| h.uri == uri)
                .map(|h| (h.listener.clone(), update(h)))
        };
        if let Some((listener, status)) = delivery {
            listener.on_status(status);
        }
    }

    fn command(
        &self,
        handle: NativeHandleId,
        call: impl FnOnce(&str) -> Call,
        update: impl FnOnce(&mut FakeHandle),
    ) -> BridgeResult<()> {
        let delivery = {
            let mut handles = self.handles.lock();
            let Some(h) = handles.get_mut(&handle) else {
                return Err(BridgeError::PlayerError("unknown handle".into()));
            };
            self.calls.lock().push(call(&h.uri));
            update(h);
            (h.listener.clone(), h.status())
        };
        delivery.0.on_status(delivery.1);
        Ok(())
    }
}

#[async_trait]
impl NativeAudioPlayer for FakeAudioPlayer {
    async fn load(
        &self,
        uri: &str,
        _options: LoadOptions,
        listener: Arc<dyn PlayerStatusListener>,
    ) -> BridgeResult<NativeHandleId> {
        self.calls.lock().push(Call::Load(uri.to_string()));

        let gate = self.gates.lock().get(uri).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing.lock().contains(uri) {
            return Err(BridgeError::PlayerError("unable to open stream".into()));
        }

        let id = NativeHandleId::new();
        let handle = FakeHandle {
            uri: uri.to_string(),
            listener: listener.clone(),
            position: Duration::ZERO,
            playing: false,
        };
        let status = handle.status();
        self.handles.lock().insert(id, handle);
        listener.on_status(status);
        Ok(id)
    }

    async fn play(&self, handle: NativeHandleId) -> BridgeResult<()> {
        self.command(handle, |uri| Call::Play(uri.to_string()), |h| h.playing = true)
    }

    async fn pause(&self, handle: NativeHandleId) -> BridgeResult<()> {
        self.command(handle, |uri| Call::Pause(uri.to_string()), |h| h.playing = false)
    }

    async fn seek(&self, handle: NativeHandleId, position: Duration) -> BridgeResult<()> {
        self.command(
            handle,
            |uri| Call::Seek(uri.to_string(), position.as_millis() as u64),
            |h| h.position = position,
        )
    }

    async fn set_rate(
        &self,
        handle: NativeHandleId,
        rate: f32,
        _correct_pitch: bool,
    ) -> BridgeResult<()> {
        self.command(handle, |uri| Call::Rate(uri.to_string(), rate), |_| {})
    }

    async fn unload(&self, handle: NativeHandleId) -> BridgeResult<()> {
        if let Some(h) = self.handles.lock().remove(&handle) {
            self.calls.lock().push(Call::Unload(h.uri));
        }
        Ok(())
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
    position_gate: Mutex<Option<Arc<Notify>>>,
    position_write_held: AtomicBool,
}

impl MemorySettings {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    /// Block the next position write until the returned gate is notified.
    pub fn hold_next_position_write(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.position_gate.lock() = Some(gate.clone());
        gate
    }

    /// A held position write is waiting on its gate.
    pub fn position_write_held(&self) -> bool {
        self.position_write_held.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        if key.starts_with(POSITION_KEY_PREFIX) {
            let gate = self.position_gate.lock().take();
            if let Some(gate) = gate {
                self.position_write_held.store(true, Ordering::SeqCst);
                gate.notified().await;
                self.position_write_held.store(false, Ordering::SeqCst);
            }
        }
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.values.lock().keys().cloned().collect())
    }
}

#[derive(Default)]
pub struct FakeDownloads {
    files: Mutex<HashSet<String>>,
}

impl FakeDownloads {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_files(files: &[&str]) -> Arc<Self> {
        let downloads = Self::default();
        downloads
            .files
            .lock()
            .extend(files.iter().map(|f| f.to_string()));
        Arc::new(downloads)
    }
}

#[async_trait]
impl DownloadStore for FakeDownloads {
    async fn exists(&self, filename: &str) -> BridgeResult<bool> {
        Ok(self.files.lock().contains(filename))
    }

    fn local_uri(&self, filename: &str) -> Option<String> {
        Some(format!("file:///files/{}", filename))
    }

    async fn download(&self, _url: &str, filename: &str) -> BridgeResult<String> {
        self.files.lock().insert(filename.to_string());
        Ok(format!("file:///files/{}", filename))
    }

    async fn remove(&self, filename: &str) -> BridgeResult<()> {
        self.files.lock().remove(filename);
        Ok(())
    }
}

// ============================================================================
// Session harness
// ============================================================================

pub fn lesson(id: &str) -> TrackDescriptor {
    TrackDescriptor::audio(id, format!("Lesson {}", id), format!("https://cdn.example.com/{}", id))
}

pub fn catalog(tracks: Vec<TrackDescriptor>) -> Catalog {
    Catalog::new(vec![Category {
        id: "series".to_string(),
        title: "Series".to_string(),
        description: None,
        files: tracks,
    }])
}

pub struct Harness {
    pub session: Arc<SessionController>,
    pub player: Arc<FakeAudioPlayer>,
    pub settings: Arc<MemorySettings>,
    pub downloads: Arc<FakeDownloads>,
    pub events: EventBus,
}

pub struct HarnessBuilder {
    settings: Arc<MemorySettings>,
    player: Arc<FakeAudioPlayer>,
    downloads: Arc<FakeDownloads>,
    platform: HostPlatform,
    config: SessionConfig,
    catalog: Catalog,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            settings: MemorySettings::new(),
            player: FakeAudioPlayer::new(),
            downloads: FakeDownloads::new(),
            platform: HostPlatform::Native,
            config: SessionConfig::default(),
            catalog: Catalog::default(),
        }
    }

    pub fn settings(mut self, settings: Arc<MemorySettings>) -> Self {
        self.settings = settings;
        self
    }

    pub fn player(mut self, player: Arc<FakeAudioPlayer>) -> Self {
        self.player = player;
        self
    }

    pub fn downloads(mut self, downloads: Arc<FakeDownloads>) -> Self {
        self.downloads = downloads;
        self
    }

    pub fn platform(mut self, platform: HostPlatform) -> Self {
        self.platform = platform;
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub async fn start(self) -> Harness {
        let core = CoreConfig::builder()
            .settings_store(self.settings.clone())
            .download_store(self.downloads.clone())
            .audio_player(self.player.clone())
            .platform(self.platform)
            .build()
            .expect("complete core config");
        let events = EventBus::new(64);
        let session = SessionController::start(&core, self.config, &self.catalog, events.clone())
            .await
            .expect("session starts");

        Harness {
            session,
            player: self.player,
            settings: self.settings,
            downloads: self.downloads,
            events,
        }
    }
}

/// Wait until the session state satisfies `predicate`.
pub async fn wait_for(
    session: &SessionController,
    predicate: impl FnMut(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    let mut rx = session.subscribe();
    let snapshot = tokio::time::timeout(WAIT_LIMIT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for session state")
        .expect("session dropped")
        .clone();
    snapshot
}

/// Wait for the first event matching `predicate`.
pub async fn wait_for_event(
    rx: &mut broadcast::Receiver<CoreEvent>,
    mut predicate: impl FnMut(&CoreEvent) -> bool,
) -> CoreEvent {
    tokio::time::timeout(WAIT_LIMIT, async {
        loop {
            let event = rx.recv().await.expect("event bus open");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Yield until `condition` holds.
pub async fn until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT_LIMIT, async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}
