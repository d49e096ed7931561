//! Completion watcher: logs when a started download finishes.
//!
//! Purely diagnostic. The watcher subscribes to the platform's change
//! broadcast before it first queries the download, so a transition that lands
//! between the two cannot be missed. It stops listening after the first
//! completion it sees; dropping the receiver is the unsubscribe. There is no
//! timeout: a download that never completes keeps its watcher alive until
//! the platform closes the broadcast.

use tokio::sync::broadcast::error::RecvError;

use crate::orchestrator::DownloadHandle;
use crate::platform::{DownloadItem, DownloadPlatform, DownloadState};

/// How a watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The platform had no record of the download (or could not be queried).
    Missing,
    /// The download was already complete when first queried.
    AlreadyComplete(DownloadItem),
    /// A change notification reported completion.
    Completed(DownloadItem),
    /// The change broadcast closed before completion.
    StreamClosed,
}

/// Watches `handle` until it completes, logging its final metadata once.
pub async fn watch_completion<P>(platform: &P, handle: DownloadHandle) -> WatchOutcome
where
    P: DownloadPlatform + ?Sized,
{
    let mut changes = platform.subscribe_changes();

    let item = match query(platform, handle).await {
        Some(item) => item,
        None => return WatchOutcome::Missing,
    };
    tracing::info!(
        "{} download info: id={} filename={} state={} url={}",
        handle.method,
        item.id,
        item.filename,
        item.state.as_str(),
        item.url
    );
    if item.state == DownloadState::Complete {
        log_complete(handle, &item);
        return WatchOutcome::AlreadyComplete(item);
    }

    loop {
        match changes.recv().await {
            Ok(delta) if delta.completes(handle.id) => {
                return match query(platform, handle).await {
                    Some(item) => {
                        log_complete(handle, &item);
                        WatchOutcome::Completed(item)
                    }
                    None => WatchOutcome::Missing,
                };
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(
                    "watcher for {} lagged by {} notifications, re-checking",
                    handle.id,
                    skipped
                );
                match query(platform, handle).await {
                    Some(item) if item.state == DownloadState::Complete => {
                        log_complete(handle, &item);
                        return WatchOutcome::Completed(item);
                    }
                    Some(_) => {}
                    None => return WatchOutcome::Missing,
                }
            }
            Err(RecvError::Closed) => {
                tracing::debug!("change stream closed while watching {}", handle.id);
                return WatchOutcome::StreamClosed;
            }
        }
    }
}

async fn query<P>(platform: &P, handle: DownloadHandle) -> Option<DownloadItem>
where
    P: DownloadPlatform + ?Sized,
{
    match platform.search(handle.id).await {
        Ok(Some(item)) => Some(item),
        Ok(None) => {
            tracing::warn!("{} download {} not found", handle.method, handle.id);
            None
        }
        Err(e) => {
            tracing::warn!("querying {} download {} failed: {}", handle.method, handle.id, e);
            None
        }
    }
}

fn log_complete(handle: DownloadHandle, item: &DownloadItem) {
    tracing::info!(
        "{} download complete: id={} filename={} url={}",
        handle.method,
        item.id,
        item.filename,
        item.url
    );
}
