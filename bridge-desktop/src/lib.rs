//! # Desktop Bridge Implementations
//!
//! Default implementations of the storage bridges for desktop platforms
//! (macOS, Windows, Linux):
//! - `SettingsStore` using a SQLite-backed key-value table
//! - `DownloadStore` using `reqwest` for transfers and `tokio::fs` for storage
//!
//! Audio output is platform-specific and is always supplied by the host.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{SqliteSettingsStore, TokioDownloadStore};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let settings = SqliteSettingsStore::new("settings.db".into()).await?;
//!     let downloads = TokioDownloadStore::new()?;
//!     // Hand both to `CoreConfig::builder()`
//!     Ok(())
//! }
//! ```

mod downloads;
mod settings;

pub use downloads::TokioDownloadStore;
pub use settings::SqliteSettingsStore;
