//! `qis detect-profile` – run the profile probe once.

use anyhow::Result;
use qis_core::profile::{DetectionOutcome, ProfileDetector};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::Context;

pub async fn run_detect_profile(ctx: &Context, dir: Option<PathBuf>) -> Result<()> {
    let platform = ctx.platform(dir)?;
    let store = ctx.store()?;
    let detector = Arc::new(
        ProfileDetector::new(platform, store)
            .with_settle_delay(Duration::from_millis(ctx.cfg.probe_settle_ms)),
    );

    if let Some(path) = detector.load_stored().await {
        println!("Stored profile path: {path}");
        return Ok(());
    }
    match detector.detect_now().await {
        DetectionOutcome::Detected(path) | DetectionOutcome::AlreadyDetected(path) => {
            println!("Profile path: {path}");
        }
        DetectionOutcome::NotFound => println!("No profile path could be derived."),
        DetectionOutcome::AlreadyRunning => println!("Detection already running."),
        DetectionOutcome::ProbeFailed => anyhow::bail!("probe download was refused"),
    }
    Ok(())
}
