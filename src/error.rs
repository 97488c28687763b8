//! Error types for the sync engine and its configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::notion::NotionError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while syncing a file or a tag.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Remote call failed: {0}")]
    Remote(#[from] NotionError),
    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid or missing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
