//! Host platform seam: the download subsystem and the settings store.
//!
//! The core never touches the network or the disk itself. It asks a
//! [`DownloadPlatform`] to start downloads, query them and clean them up, and
//! listens to its change broadcast. A browser runtime is one implementation;
//! [`LocalPlatform`] is a directory-backed one used by the CLI.

mod local;
mod store;

pub use local::LocalPlatform;
pub use store::{JsonFileStore, MemoryStore};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::{PlatformError, StoreError};

/// Identifier the platform assigns to a download.
pub type DownloadId = u64;

/// Store key for the (currently unused) preferred save folder.
pub const KEY_SAVE_LOCATION: &str = "saveLocation";
/// Store key for the detected user profile path.
pub const KEY_USER_PROFILE_PATH: &str = "userProfilePath";
/// Value reported for `saveLocation` when nothing is stored.
pub const DEFAULT_SAVE_LOCATION: &str = "%USERPROFILE%\\Desktop";

/// What the platform does when the target filename already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictAction {
    /// Append a disambiguating suffix; never overwrite or prompt.
    #[default]
    Uniquify,
    Overwrite,
    Prompt,
}

/// A request to download `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub url: String,
    /// Suggested filename relative to the download folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub conflict_action: ConflictAction,
    /// Ask the user where to save instead of saving silently.
    #[serde(default)]
    pub save_as: bool,
}

impl DownloadRequest {
    /// Silent download under `filename`, uniquified on collision.
    pub fn named(url: &str, filename: &str) -> Self {
        Self {
            url: url.to_string(),
            filename: Some(filename.to_string()),
            conflict_action: ConflictAction::Uniquify,
            save_as: false,
        }
    }

    /// Download that lets the user pick the destination.
    pub fn with_dialog(url: &str) -> Self {
        Self {
            url: url.to_string(),
            filename: None,
            conflict_action: ConflictAction::Uniquify,
            save_as: true,
        }
    }
}

/// Lifecycle state of a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    InProgress,
    Interrupted,
    Complete,
}

impl DownloadState {
    pub fn as_str(self) -> &'static str {
        match self {
            DownloadState::InProgress => "in_progress",
            DownloadState::Interrupted => "interrupted",
            DownloadState::Complete => "complete",
        }
    }
}

/// Snapshot of one download as reported by `search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadItem {
    pub id: DownloadId,
    pub url: String,
    /// Absolute path of the target file (may be empty before it is chosen).
    pub filename: String,
    pub state: DownloadState,
}

/// Previous and current value of a changed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub previous: DownloadState,
    pub current: DownloadState,
}

/// Change notification broadcast for every download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadDelta {
    pub id: DownloadId,
    pub state: Option<StateChange>,
}

impl DownloadDelta {
    /// True when this delta reports that `id` just reached `Complete`.
    pub fn completes(&self, id: DownloadId) -> bool {
        self.id == id
            && self
                .state
                .map(|s| s.current == DownloadState::Complete)
                .unwrap_or(false)
    }
}

/// The host's download subsystem.
#[async_trait]
pub trait DownloadPlatform: Send + Sync {
    /// Start a download. An error means the platform refused the request.
    async fn download(&self, request: DownloadRequest) -> Result<DownloadId, PlatformError>;

    /// Current record for `id`, if the platform still knows it.
    async fn search(&self, id: DownloadId) -> Result<Option<DownloadItem>, PlatformError>;

    /// Subscribe to change notifications for all downloads. Dropping the
    /// receiver unsubscribes.
    fn subscribe_changes(&self) -> broadcast::Receiver<DownloadDelta>;

    /// Delete the downloaded file from disk.
    async fn remove_file(&self, id: DownloadId) -> Result<(), PlatformError>;

    /// Forget the download record.
    async fn erase(&self, id: DownloadId) -> Result<(), PlatformError>;
}

/// The host's persistent key-value store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
