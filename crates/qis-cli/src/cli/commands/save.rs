//! `qis save <url>` – save one image and wait for it.

use anyhow::Result;
use qis_core::orchestrator::ImageSaver;
use std::path::PathBuf;

use super::{report, wait_finished, Context};

pub async fn run_save(ctx: &Context, url: &str, dir: Option<PathBuf>) -> Result<()> {
    let platform = ctx.platform(dir)?;
    let saver = ImageSaver::new(platform.clone());
    let handle = match saver.save(url).await {
        Some(h) => h,
        None => anyhow::bail!("download of {} was refused", url),
    };
    tracing::debug!("started {} download {}", handle.method, handle.id);
    let item = wait_finished(&platform, handle.id).await?;
    report(&item)
}
