//! CLI for the QIS image saver.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use qis_core::config;
use std::path::PathBuf;

use commands::{
    run_completions, run_detect_profile, run_message, run_resolve, run_save, run_state,
    run_test_download, Context,
};

/// Top-level CLI for the QIS image saver.
#[derive(Debug, Parser)]
#[command(name = "qis")]
#[command(about = "QIS: save images under clean filenames", long_about = None)]
pub struct Cli {
    /// Keep settings in memory only; nothing is read from or written to the state file.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Save an image URL (http, https or data:) into the download folder.
    Save {
        /// Image URL.
        url: String,
        /// Folder to save into (default: config download_dir, then current directory).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Print the filename a URL would be saved under.
    Resolve {
        /// Image URL.
        url: String,
    },

    /// Run the profile-path probe and store the result.
    DetectProfile {
        /// Folder the probe file is written to.
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Deliver a raw JSON message to the background service, e.g.
    /// '{"action":"saveImage","imageUrl":"https://..."}'.
    Message {
        /// JSON message body.
        json: String,
        /// Folder downloads are written to.
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// How long to wait for a started download to finish.
        #[arg(long, default_value = "30", value_name = "SECS")]
        wait_secs: u64,
    },

    /// Run the diagnostic test download.
    TestDownload {
        /// Folder to save into.
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Show stored settings.
    State,

    /// Print shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let ctx = Context::new(cfg, cli.ephemeral);

        match cli.command {
            CliCommand::Save { url, dir } => run_save(&ctx, &url, dir).await?,
            CliCommand::Resolve { url } => run_resolve(&url),
            CliCommand::DetectProfile { dir } => run_detect_profile(&ctx, dir).await?,
            CliCommand::Message {
                json,
                dir,
                wait_secs,
            } => run_message(&ctx, &json, dir, wait_secs).await?,
            CliCommand::TestDownload { dir } => run_test_download(&ctx, dir).await?,
            CliCommand::State => run_state(&ctx).await?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
