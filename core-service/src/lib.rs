//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (settings storage,
//! offline downloads, the native audio player) into the lesson-player core.
//! Desktop apps typically enable the `desktop-shims` feature (which depends
//! on `bridge-desktop`) and only supply the audio player; mobile hosts build a
//! [`CoreConfig`] from their own bridges and call [`PlayerService::bootstrap`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use core_playback::{Catalog, OfflineLibrary, SessionConfig, SessionController};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use tracing::info;

#[cfg(feature = "desktop-shims")]
pub use desktop::{bootstrap_desktop, DesktopPaths};

/// Primary façade exposed to host applications.
///
/// Constructed once at startup. Clones share the same session.
#[derive(Clone)]
pub struct PlayerService {
    events: EventBus,
    session: Arc<SessionController>,
    offline: OfflineLibrary,
    catalog: Arc<Catalog>,
}

impl PlayerService {
    /// Start the audio session over the bridges in `core`.
    pub async fn bootstrap(
        core: CoreConfig,
        session_config: SessionConfig,
        catalog: Catalog,
    ) -> Result<Self> {
        core.validate()?;

        let events = EventBus::new(core.event_buffer_size);
        let offline = OfflineLibrary::new(
            Arc::clone(&core.download_store),
            events.clone(),
            session_config.default_extension.clone(),
        );
        let session =
            SessionController::start(&core, session_config, &catalog, events.clone()).await?;

        info!(
            categories = catalog.categories().len(),
            platform = ?core.platform,
            "Player service ready"
        );
        Ok(Self {
            events,
            session,
            offline,
            catalog: Arc::new(catalog),
        })
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    pub fn offline(&self) -> &OfflineLibrary {
        &self.offline
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to playback and download events.
    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// Persist the current position and release the native player.
    pub async fn shutdown(&self) {
        self.session.shutdown().await;
    }
}

#[cfg(feature = "desktop-shims")]
mod desktop {
    use super::*;
    use bridge_desktop::{SqliteSettingsStore, TokioDownloadStore};
    use bridge_traits::NativeAudioPlayer;
    use std::path::PathBuf;

    /// On-disk locations used by the desktop bridges.
    #[derive(Debug, Clone)]
    pub struct DesktopPaths {
        pub settings_db: PathBuf,
        pub files_dir: PathBuf,
    }

    impl DesktopPaths {
        /// `settings.db` and `files/` under `root`.
        pub fn under(root: impl Into<PathBuf>) -> Self {
            let root = root.into();
            Self {
                settings_db: root.join("settings.db"),
                files_dir: root.join("files"),
            }
        }
    }

    /// Bootstrap with SQLite settings and on-disk downloads.
    ///
    /// The audio player is always platform-specific and comes from the host.
    pub async fn bootstrap_desktop(
        paths: DesktopPaths,
        audio_player: Arc<dyn NativeAudioPlayer>,
        session_config: SessionConfig,
        catalog: Catalog,
    ) -> Result<PlayerService> {
        let settings = SqliteSettingsStore::new(paths.settings_db).await?;
        let downloads = TokioDownloadStore::with_directory(paths.files_dir)?;

        let core = CoreConfig::builder()
            .settings_store(Arc::new(settings))
            .download_store(Arc::new(downloads))
            .audio_player(audio_player)
            .build()?;

        PlayerService::bootstrap(core, session_config, catalog).await
    }
}
