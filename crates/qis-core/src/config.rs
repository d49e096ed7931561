use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::profile::DEFAULT_SETTLE_DELAY;

/// Global configuration loaded from `~/.config/qis/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QisConfig {
    /// Folder the local platform saves into (None = current directory).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Wait between starting the profile probe download and reading its path.
    #[serde(default = "default_probe_settle_ms")]
    pub probe_settle_ms: u64,
    /// URL fetched by the diagnostic "test download" menu item.
    #[serde(default = "default_test_download_url")]
    pub test_download_url: String,
}

fn default_probe_settle_ms() -> u64 {
    DEFAULT_SETTLE_DELAY.as_millis() as u64
}

fn default_test_download_url() -> String {
    "https://via.placeholder.com/150".to_string()
}

impl Default for QisConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            probe_settle_ms: default_probe_settle_ms(),
            test_download_url: default_test_download_url(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("qis")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<QisConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = QisConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: QisConfig = toml::from_str(&data)?;
    Ok(cfg)
}
