//! `qis test-download` – same as the "Test Downloads" menu item.

use anyhow::Result;
use qis_core::service::{Background, MENU_TEST_DOWNLOADS};
use std::path::PathBuf;

use super::{report, wait_finished, Context};

pub async fn run_test_download(ctx: &Context, dir: Option<PathBuf>) -> Result<()> {
    let platform = ctx.platform(dir)?;
    let background = Background::new(platform.clone(), ctx.store()?, &ctx.cfg);
    let id = match background.on_menu_clicked(MENU_TEST_DOWNLOADS).await {
        Some(id) => id,
        None => anyhow::bail!("test download of {} was refused", ctx.cfg.test_download_url),
    };
    let item = wait_finished(&platform, id).await?;
    report(&item)
}
