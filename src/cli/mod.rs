//! Command-line interface.

mod report;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use crate::config::SyncConfig;
use crate::sync::Synchronizer;

#[derive(Parser)]
#[command(name = "docsync")]
#[command(about = "Sync documentation files into a Notion database")]
#[command(version)]
pub struct Cli {
    /// Changed files to sync (e.g. the files touched by a commit)
    pub files: Vec<String>,

    /// Notion integration token
    #[arg(long, env = "NOTION_KEY", hide_env_values = true)]
    notion_key: Option<String>,

    /// Target database ID
    #[arg(long, env = "NOTION_DATABASE_ID")]
    database_id: Option<String>,

    /// Directory the file paths are relative to (default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Number of files synced concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Request budget shared by all API calls
    #[arg(long)]
    requests_per_second: Option<u32>,

    /// Extra tag attached to every created page
    #[arg(long)]
    marker_tag: Option<String>,

    /// Name of the multi-select property holding tags
    #[arg(long)]
    tag_property: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Build the run config from the process environment.
    fn config(&self) -> anyhow::Result<SyncConfig> {
        self.config_with(|key| std::env::var(key).ok())
    }

    /// Build the run config, with CLI values taking precedence over `env`.
    ///
    /// The credentials come only from clap, which already falls back to
    /// their environment variables.
    fn config_with<F>(&self, env: F) -> anyhow::Result<SyncConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = SyncConfig::from_lookup(|key| match key {
            "NOTION_KEY" => self.notion_key.clone(),
            "NOTION_DATABASE_ID" => self.database_id.clone(),
            "DOCSYNC_WORKERS" => self.workers.map(|w| w.to_string()).or_else(|| env(key)),
            "DOCSYNC_REQUESTS_PER_SECOND" => self
                .requests_per_second
                .map(|r| r.to_string())
                .or_else(|| env(key)),
            "DOCSYNC_MARKER_TAG" => self.marker_tag.clone().or_else(|| env(key)),
            "DOCSYNC_TAG_PROPERTY" => self.tag_property.clone().or_else(|| env(key)),
            _ => env(key),
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config()?;

    let mut synchronizer =
        Synchronizer::from_config(&config).context("Failed to create Notion client")?;
    if let Some(root) = &cli.root {
        synchronizer = synchronizer.with_root(root);
    }

    let report = synchronizer.run(&cli.files).await;
    report::print_report(&report);

    // Per-file failures are logged and reported, not turned into an exit code.
    Ok(())
}
