//! CLI command handlers, one per file, plus the setup they share.

mod completions;
mod detect;
mod message;
mod resolve;
mod save;
mod state;
mod test_download;

pub use completions::run_completions;
pub use detect::run_detect_profile;
pub use message::run_message;
pub use resolve::run_resolve;
pub use save::run_save;
pub use state::run_state;
pub use test_download::run_test_download;

use anyhow::{Context as _, Result};
use qis_core::config::QisConfig;
use qis_core::platform::{
    DownloadId, DownloadItem, DownloadPlatform, DownloadState, JsonFileStore, LocalPlatform,
    MemoryStore, SettingsStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Config plus global flags, handed to every command.
pub struct Context {
    pub cfg: QisConfig,
    pub ephemeral: bool,
}

impl Context {
    pub fn new(cfg: QisConfig, ephemeral: bool) -> Self {
        Self { cfg, ephemeral }
    }

    /// `--dir`, else config `download_dir`, else the current directory.
    pub fn download_dir(&self, dir: Option<PathBuf>) -> Result<PathBuf> {
        match dir.or_else(|| self.cfg.download_dir.clone()) {
            Some(d) => Ok(d),
            None => std::env::current_dir().context("current directory"),
        }
    }

    pub fn platform(&self, dir: Option<PathBuf>) -> Result<Arc<LocalPlatform>> {
        let dir = self.download_dir(dir)?;
        tracing::debug!("saving into {}", dir.display());
        Ok(Arc::new(LocalPlatform::new(dir)))
    }

    pub fn store(&self) -> Result<Arc<dyn SettingsStore>> {
        if self.ephemeral {
            return Ok(Arc::new(MemoryStore::new()));
        }
        Ok(Arc::new(JsonFileStore::new(JsonFileStore::default_path()?)))
    }
}

/// Waits until download `id` leaves the in-progress state.
pub async fn wait_finished(platform: &LocalPlatform, id: DownloadId) -> Result<DownloadItem> {
    let mut changes = platform.subscribe_changes();
    loop {
        let item = platform
            .search(id)
            .await?
            .with_context(|| format!("download {id} disappeared"))?;
        if item.state != DownloadState::InProgress {
            return Ok(item);
        }
        match changes.recv().await {
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => anyhow::bail!("download {id} never finished"),
        }
    }
}

/// Prints the outcome of a finished download; interrupted downloads are errors.
pub fn report(item: &DownloadItem) -> Result<()> {
    match item.state {
        DownloadState::Complete => {
            println!("Saved {}", item.filename);
            Ok(())
        }
        state => anyhow::bail!("download {} of {} ended {}", item.id, item.url, state.as_str()),
    }
}
