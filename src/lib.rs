//! docsync - keep repository documentation mirrored in a Notion database.
//!
//! Changed markdown files are grouped by the directory that contains them.
//! Each group maps to a tag in the database, and each file maps to a page
//! with its title under that tag. Pages are created when missing and have
//! their content replaced otherwise.

pub mod cli;
pub mod config;
pub mod error;
pub mod markdown;
pub mod notion;
pub mod rate_limit;
pub mod sync;

pub use config::SyncConfig;
pub use error::{ConfigError, SyncError, SyncResult};
pub use sync::{SyncReport, Synchronizer};
