//! `qis message <json>` – feed one runtime message to the background service.

use anyhow::Result;
use qis_core::platform::{DownloadPlatform, DownloadState};
use qis_core::service::Background;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use super::{report, Context};

pub async fn run_message(
    ctx: &Context,
    json: &str,
    dir: Option<PathBuf>,
    wait_secs: u64,
) -> Result<()> {
    let platform = ctx.platform(dir)?;
    let store = ctx.store()?;
    let background = Background::new(platform.clone(), store, &ctx.cfg);

    // Subscribe before delivering so the save's completion cannot be missed.
    let mut changes = platform.subscribe_changes();
    let reply = match background.handle_message(json) {
        Some(r) => r,
        None => {
            println!("No reply (message not handled).");
            return Ok(());
        }
    };
    println!("{}", serde_json::to_string(&reply)?);

    let finished = tokio::time::timeout(Duration::from_secs(wait_secs), async {
        loop {
            match changes.recv().await {
                Ok(delta) => match delta.state {
                    Some(change) if change.current != DownloadState::InProgress => {
                        return Some(delta.id);
                    }
                    _ => {}
                },
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .await;

    match finished {
        Ok(Some(id)) => match platform.search(id).await? {
            Some(item) => report(&item),
            None => Ok(()),
        },
        Ok(None) => Ok(()),
        Err(_) => {
            println!("No download finished within {wait_secs}s.");
            Ok(())
        }
    }
}
