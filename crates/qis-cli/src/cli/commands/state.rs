//! `qis state` – show stored settings.

use anyhow::Result;
use qis_core::platform::{
    JsonFileStore, SettingsStore, DEFAULT_SAVE_LOCATION, KEY_SAVE_LOCATION,
    KEY_USER_PROFILE_PATH,
};

use super::Context;

pub async fn run_state(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let save_location = store
        .get(KEY_SAVE_LOCATION)
        .await?
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SAVE_LOCATION.to_string());
    let profile = store
        .get(KEY_USER_PROFILE_PATH)
        .await?
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "-".to_string());

    println!("{:<18} {}", "SAVE LOCATION", save_location);
    println!("{:<18} {}", "USER PROFILE PATH", profile);
    if !ctx.ephemeral {
        let path = JsonFileStore::default_path()?;
        println!("{:<18} {}", "STATE FILE", path.display());
    }
    Ok(())
}
