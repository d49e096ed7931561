//! One-shot probe that learns the user's profile directory.
//!
//! The probe downloads a 1x1 PNG as a throwaway file, waits for the platform
//! to settle its on-disk name, reads the full path back and runs the
//! extraction rules over it. The throwaway file and its record are removed
//! whatever the result.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::extract::extract_profile_path;
use super::state::ProfileState;
use crate::platform::{
    DownloadId, DownloadPlatform, DownloadRequest, SettingsStore, KEY_USER_PROFILE_PATH,
};

/// Transparent 1x1 PNG used as the throwaway download.
pub const PROBE_FILE_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";
/// Name requested for the throwaway download.
pub const PROBE_FILENAME: &str = "profile_detect.tmp";
/// Default wait between starting the probe and reading its path back.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Result of a detection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// A path was already known; nothing was done.
    AlreadyDetected(String),
    /// Another probe is in flight; nothing was done.
    AlreadyRunning,
    /// The probe found and stored a path.
    Detected(String),
    /// The probe ran but no rule matched the downloaded file's path.
    NotFound,
    /// The platform refused the probe download.
    ProbeFailed,
}

/// Owns the process-wide [`ProfileState`].
///
/// Create one per process (the background service does) and share it behind
/// an `Arc`. The state only moves through [`ProfileDetector::initialize`],
/// [`ProfileDetector::detect`] and [`ProfileDetector::detect_now`]; there is
/// no reset.
pub struct ProfileDetector<P: ?Sized, S: ?Sized> {
    platform: Arc<P>,
    store: Arc<S>,
    settle_delay: Duration,
    state: Mutex<ProfileState>,
}

impl<P, S> ProfileDetector<P, S>
where
    P: DownloadPlatform + ?Sized + 'static,
    S: SettingsStore + ?Sized + 'static,
{
    pub fn new(platform: Arc<P>, store: Arc<S>) -> Self {
        Self {
            platform,
            store,
            settle_delay: DEFAULT_SETTLE_DELAY,
            state: Mutex::new(ProfileState::Idle),
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn state(&self) -> ProfileState {
        self.lock().clone()
    }

    pub fn path(&self) -> Option<String> {
        self.lock().path().map(str::to_string)
    }

    /// Loads a previously stored path into the state. Returns it if present.
    pub async fn load_stored(&self) -> Option<String> {
        match self.store.get(KEY_USER_PROFILE_PATH).await {
            Ok(Some(path)) if !path.is_empty() => {
                if self.lock().adopt(path.clone()) {
                    tracing::info!("loaded stored user profile path: {}", path);
                }
                Some(path)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("reading stored user profile path failed: {}", e);
                None
            }
        }
    }

    /// Install/startup hook: use the stored path, or start a probe.
    ///
    /// Returns `true` when a probe was started.
    pub async fn initialize(self: &Arc<Self>) -> bool {
        if self.load_stored().await.is_some() {
            return false;
        }
        tracing::info!("no stored user profile path, starting detection");
        self.detect()
    }

    /// Starts a probe in the background.
    ///
    /// Returns `false` without doing anything when a path is already known
    /// or a probe is already in flight.
    pub fn detect(self: &Arc<Self>) -> bool {
        if self.begin().is_err() {
            return false;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.probe().await;
        });
        true
    }

    /// Runs a probe to completion on the current task.
    pub async fn detect_now(&self) -> DetectionOutcome {
        if let Err(skipped) = self.begin() {
            return skipped;
        }
        self.probe().await
    }

    fn begin(&self) -> Result<(), DetectionOutcome> {
        let mut state = self.lock();
        if let Some(path) = state.path() {
            tracing::debug!("profile path already detected: {}", path);
            return Err(DetectionOutcome::AlreadyDetected(path.to_string()));
        }
        if !state.try_begin() {
            tracing::debug!("profile path detection already running");
            return Err(DetectionOutcome::AlreadyRunning);
        }
        Ok(())
    }

    async fn probe(&self) -> DetectionOutcome {
        let request = DownloadRequest::named(PROBE_FILE_URL, PROBE_FILENAME);
        let id = match self.platform.download(request).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("profile probe download refused: {}", e);
                self.lock().finish(None);
                return DetectionOutcome::ProbeFailed;
            }
        };
        tracing::debug!("detecting user profile path via download {}", id);

        tokio::time::sleep(self.settle_delay).await;

        let found = self.downloaded_path(id).await.and_then(|full| {
            tracing::debug!("probe file path: {}", full);
            extract_profile_path(&full)
        });

        if let Some(path) = &found {
            if let Err(e) = self.store.set(KEY_USER_PROFILE_PATH, path).await {
                tracing::warn!("storing user profile path failed: {}", e);
            }
        }
        self.cleanup(id).await;
        self.lock().finish(found.clone());

        match found {
            Some(path) => {
                tracing::info!("user profile path detected: {}", path);
                DetectionOutcome::Detected(path)
            }
            None => {
                tracing::warn!("could not derive a user profile path from the probe download");
                DetectionOutcome::NotFound
            }
        }
    }

    async fn downloaded_path(&self, id: DownloadId) -> Option<String> {
        match self.platform.search(id).await {
            Ok(Some(item)) if !item.filename.is_empty() => Some(item.filename),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("querying probe download {} failed: {}", id, e);
                None
            }
        }
    }

    async fn cleanup(&self, id: DownloadId) {
        if let Err(e) = self.platform.remove_file(id).await {
            tracing::debug!("removing probe file {} failed: {}", id, e);
        }
        if let Err(e) = self.platform.erase(id).await {
            tracing::debug!("erasing probe record {} failed: {}", id, e);
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProfileState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
