//! Directory-backed download platform.
//!
//! Writes downloads into one folder the way a browser download shelf would:
//! names are uniquified on collision, `data:` URIs are decoded in-process and
//! `http(s)` URLs are fetched with libcurl on a blocking task. There is no
//! dialog; a `save_as` request picks a sanitized name from the URL instead.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use tokio::sync::broadcast;

use super::{
    ConflictAction, DownloadDelta, DownloadId, DownloadItem, DownloadPlatform, DownloadRequest,
    DownloadState, StateChange,
};
use crate::error::PlatformError;
use crate::filename::{is_safe_filename, percent_decode_bytes, resolve_filename, sanitize_filename};

/// Capacity of the change broadcast; slow subscribers see `Lagged`.
const CHANGE_CHANNEL_CAPACITY: usize = 64;
/// Upper bound on ` (n)` suffixes tried before giving up.
const MAX_UNIQUIFY: u32 = 10_000;
/// Name used when nothing usable can be derived for a dialog-style request.
const FALLBACK_NAME: &str = "download";
/// Standard alphabet; `data:` payloads are accepted with or without padding.
const DATA_URI_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Default)]
struct Registry {
    next_id: DownloadId,
    items: HashMap<DownloadId, DownloadItem>,
}

/// Where the bytes of a download come from.
enum Source {
    Inline(Vec<u8>),
    Http(String),
}

/// Download platform that saves into `download_dir`.
pub struct LocalPlatform {
    download_dir: PathBuf,
    registry: Arc<Mutex<Registry>>,
    changes: broadcast::Sender<DownloadDelta>,
}

impl LocalPlatform {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            download_dir: download_dir.into(),
            registry: Arc::new(Mutex::new(Registry::default())),
            changes,
        }
    }

    fn target_name(request: &DownloadRequest) -> Result<String, PlatformError> {
        if let Some(name) = request.filename.as_deref() {
            if !is_safe_filename(name) {
                return Err(PlatformError::InvalidFilename(name.to_string()));
            }
            return Ok(name.to_string());
        }
        let picked = sanitize_filename(&resolve_filename(&request.url));
        if picked.is_empty() {
            Ok(FALLBACK_NAME.to_string())
        } else {
            Ok(picked)
        }
    }

    fn register(&self, url: &str, path: &Path) -> DownloadId {
        let mut reg = lock(&self.registry);
        reg.next_id += 1;
        let id = reg.next_id;
        reg.items.insert(
            id,
            DownloadItem {
                id,
                url: url.to_string(),
                filename: path.display().to_string(),
                state: DownloadState::InProgress,
            },
        );
        id
    }
}

#[async_trait]
impl DownloadPlatform for LocalPlatform {
    async fn download(&self, request: DownloadRequest) -> Result<DownloadId, PlatformError> {
        let source = Source::parse(&request.url)?;
        let name = Self::target_name(&request)?;
        let dir = self.download_dir.clone();
        let conflict = request.conflict_action;
        let (path, file) =
            tokio::task::spawn_blocking(move || prepare_target(&dir, &name, conflict))
                .await
                .map_err(|e| PlatformError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
        let id = self.register(&request.url, &path);
        tracing::debug!("local download {} -> {}", id, path.display());

        let registry = Arc::clone(&self.registry);
        let changes = self.changes.clone();
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || source.write_to(file))
                .await
                .map_err(anyhow::Error::from)
                .and_then(|r| r);
            let state = match result {
                Ok(bytes) => {
                    tracing::debug!("local download {} complete ({} bytes)", id, bytes);
                    DownloadState::Complete
                }
                Err(e) => {
                    tracing::warn!("local download {} interrupted: {:#}", id, e);
                    DownloadState::Interrupted
                }
            };
            finish(&registry, &changes, id, state);
        });

        Ok(id)
    }

    async fn search(&self, id: DownloadId) -> Result<Option<DownloadItem>, PlatformError> {
        Ok(lock(&self.registry).items.get(&id).cloned())
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<DownloadDelta> {
        self.changes.subscribe()
    }

    async fn remove_file(&self, id: DownloadId) -> Result<(), PlatformError> {
        let path = lock(&self.registry)
            .items
            .get(&id)
            .map(|item| PathBuf::from(&item.filename))
            .ok_or(PlatformError::UnknownId(id))?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn erase(&self, id: DownloadId) -> Result<(), PlatformError> {
        lock(&self.registry).items.remove(&id);
        Ok(())
    }
}

impl Source {
    fn parse(url: &str) -> Result<Self, PlatformError> {
        if let Some(rest) = url.strip_prefix("data:") {
            return decode_data_uri(rest).map(Source::Inline);
        }
        let parsed =
            url::Url::parse(url).map_err(|e| PlatformError::InvalidUrl(format!("{url}: {e}")))?;
        match parsed.scheme() {
            "http" | "https" => Ok(Source::Http(url.to_string())),
            other => Err(PlatformError::InvalidUrl(format!(
                "unsupported scheme {other:?} in {url}"
            ))),
        }
    }

    fn write_to(self, mut file: File) -> anyhow::Result<u64> {
        match self {
            Source::Inline(bytes) => {
                file.write_all(&bytes).context("write inline data")?;
                file.flush()?;
                Ok(bytes.len() as u64)
            }
            Source::Http(url) => fetch_http(&url, &mut file),
        }
    }
}

/// Decodes the part of a `data:` URI after the scheme.
fn decode_data_uri(rest: &str) -> Result<Vec<u8>, PlatformError> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PlatformError::InvalidUrl("data URI without payload".to_string()))?;
    if header.to_ascii_lowercase().ends_with(";base64") {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        DATA_URI_BASE64
            .decode(compact.as_bytes())
            .map_err(|e| PlatformError::InvalidUrl(format!("bad base64 payload: {e}")))
    } else {
        percent_decode_bytes(payload)
            .map_err(|e| PlatformError::InvalidUrl(format!("bad data URI payload: {e}")))
    }
}

/// Makes sure `dir` exists, then reserves the target file in it.
fn prepare_target(
    dir: &Path,
    name: &str,
    conflict: ConflictAction,
) -> Result<(PathBuf, File), PlatformError> {
    std::fs::create_dir_all(dir)?;
    reserve_path(dir, name, conflict)
}

/// Creates the target file, applying the conflict policy on collision.
fn reserve_path(
    dir: &Path,
    name: &str,
    conflict: ConflictAction,
) -> Result<(PathBuf, File), PlatformError> {
    let first = dir.join(name);
    match OpenOptions::new().write(true).create_new(true).open(&first) {
        Ok(f) => return Ok((first, f)),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e.into()),
    }

    match conflict {
        ConflictAction::Overwrite => {
            let f = OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(&first)?;
            Ok((first, f))
        }
        ConflictAction::Prompt => Err(PlatformError::Rejected(format!(
            "{} already exists",
            first.display()
        ))),
        ConflictAction::Uniquify => {
            for n in 1..=MAX_UNIQUIFY {
                let candidate = dir.join(uniquified_name(name, n));
                match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                    Ok(f) => return Ok((candidate, f)),
                    Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            Err(PlatformError::Rejected(format!(
                "no free name for {name} after {MAX_UNIQUIFY} attempts"
            )))
        }
    }
}

/// `photo.png` -> `photo (n).png`; names without an extension get the suffix at the end.
fn uniquified_name(name: &str, n: u32) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 => format!("{} ({}){}", &name[..idx], n, &name[idx..]),
        _ => format!("{name} ({n})"),
    }
}

fn fetch_http(url: &str, file: &mut File) -> anyhow::Result<u64> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(30))?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;
    easy.timeout(Duration::from_secs(600))?;

    let mut written = 0u64;
    let mut write_error: Option<std::io::Error> = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match file.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                write_error = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };
    if let Some(e) = write_error {
        return Err(e).context("write downloaded bytes");
    }
    performed.context("GET request failed")?;

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("GET {} returned HTTP {}", url, code);
    }
    file.flush()?;
    Ok(written)
}

fn finish(
    registry: &Mutex<Registry>,
    changes: &broadcast::Sender<DownloadDelta>,
    id: DownloadId,
    state: DownloadState,
) {
    let previous = {
        let mut reg = lock(registry);
        match reg.items.get_mut(&id) {
            Some(item) => std::mem::replace(&mut item.state, state),
            None => return,
        }
    };
    // No subscribers is fine.
    let _ = changes.send(DownloadDelta {
        id,
        state: Some(StateChange {
            previous,
            current: state,
        }),
    });
}

fn lock(registry: &Mutex<Registry>) -> std::sync::MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
