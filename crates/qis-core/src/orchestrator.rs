//! Save orchestration: resolve a name, request the download, fall back once.
//!
//! A save issues at most two platform requests. The first asks for a silent
//! download under the resolved filename; if the platform refuses it, the
//! second drops the filename and asks for a save dialog. Both use the
//! "uniquify" conflict policy. A refused retry is logged and dropped.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::filename::resolve_filename;
use crate::platform::{DownloadId, DownloadPlatform, DownloadRequest};
use crate::watcher::watch_completion;

/// Which attempt produced a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMethod {
    /// Silent download under the resolved filename.
    Normal,
    /// Fallback download with a save dialog.
    Retry,
}

impl DownloadMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            DownloadMethod::Normal => "normal",
            DownloadMethod::Retry => "retry",
        }
    }
}

impl fmt::Display for DownloadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A started download and the attempt that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadHandle {
    pub id: DownloadId,
    pub method: DownloadMethod,
}

/// One "save this image" event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SaveRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page_url: None,
            title: None,
        }
    }
}

/// Issues image downloads against a platform and hands them to the watcher.
pub struct ImageSaver<P: ?Sized> {
    platform: Arc<P>,
}

impl<P: ?Sized> Clone for ImageSaver<P> {
    fn clone(&self) -> Self {
        Self {
            platform: Arc::clone(&self.platform),
        }
    }
}

impl<P> ImageSaver<P>
where
    P: DownloadPlatform + ?Sized + 'static,
{
    pub fn new(platform: Arc<P>) -> Self {
        Self { platform }
    }

    /// Saves `url`, returning the started download or `None` when both
    /// attempts were refused.
    ///
    /// On success a completion watcher is spawned for the download; it only
    /// logs, so nothing waits on it.
    pub async fn save(&self, url: &str) -> Option<DownloadHandle> {
        let handle = self.start(url).await?;
        let platform = Arc::clone(&self.platform);
        tokio::spawn(async move {
            watch_completion(platform.as_ref(), handle).await;
        });
        Some(handle)
    }

    /// Same as [`save`](Self::save), logging the page context first.
    pub async fn save_request(&self, request: &SaveRequest) -> Option<DownloadHandle> {
        tracing::debug!(
            "save request url={} page={:?} title={:?}",
            request.url,
            request.page_url,
            request.title
        );
        self.save(&request.url).await
    }

    async fn start(&self, url: &str) -> Option<DownloadHandle> {
        let filename = resolve_filename(url);
        tracing::info!("saving {} as {}", url, filename);

        match self
            .platform
            .download(DownloadRequest::named(url, &filename))
            .await
        {
            Ok(id) => {
                tracing::info!("download started, id={}", id);
                return Some(DownloadHandle {
                    id,
                    method: DownloadMethod::Normal,
                });
            }
            Err(e) => {
                tracing::warn!("download of {} rejected ({}); retrying with save dialog", url, e);
            }
        }

        match self.platform.download(DownloadRequest::with_dialog(url)).await {
            Ok(id) => {
                tracing::info!("retry download started, id={}", id);
                Some(DownloadHandle {
                    id,
                    method: DownloadMethod::Retry,
                })
            }
            Err(e) => {
                tracing::error!("retry download of {} failed: {}", url, e);
                None
            }
        }
    }
}
