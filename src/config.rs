//! Sync configuration.
//!
//! Built once at startup from the process environment (after `.env` is
//! loaded) and CLI overrides, then passed explicitly to the client and the
//! synchronizer.

use std::time::Duration;

use crate::error::ConfigError;

/// Default Notion REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";

/// API version sent in the `Notion-Version` header.
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Marker tag attached to every page this tool creates.
pub const DEFAULT_MARKER_TAG: &str = "repo doc";

/// Multi-select property holding page tags.
pub const DEFAULT_TAG_PROPERTY: &str = "Tags";

/// Notion allows roughly three requests per second per integration.
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 3;

pub const DEFAULT_WORKERS: usize = 4;

/// Page size used when listing a page's child blocks.
pub const DEFAULT_BLOCK_PAGE_SIZE: u32 = 50;

/// Pacing applied inside the block deletion loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionPacing {
    /// Pause before every `every`-th deletion, starting with the first.
    pub every: usize,
    pub delay: Duration,
}

impl DeletionPacing {
    /// Whether the deletion at `index` is preceded by a pause.
    pub fn pauses_before(&self, index: usize) -> bool {
        self.every > 0 && index % self.every == 0
    }
}

impl Default for DeletionPacing {
    fn default() -> Self {
        Self {
            every: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Configuration for a sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Integration token (`NOTION_KEY`).
    pub notion_key: String,
    /// Target database (`NOTION_DATABASE_ID`).
    pub database_id: String,
    pub api_base: String,
    pub notion_version: String,
    pub tag_property: String,
    pub marker_tag: String,
    /// Maximum number of files synced concurrently.
    pub workers: usize,
    /// Global request budget shared by every remote call.
    pub requests_per_second: u32,
    pub deletion_pacing: DeletionPacing,
    pub request_timeout: Duration,
    pub block_page_size: u32,
}

impl SyncConfig {
    /// Create a config with defaults for everything but credentials.
    pub fn new(notion_key: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            notion_key: notion_key.into(),
            database_id: database_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            tag_property: DEFAULT_TAG_PROPERTY.to_string(),
            marker_tag: DEFAULT_MARKER_TAG.to_string(),
            workers: DEFAULT_WORKERS,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            deletion_pacing: DeletionPacing::default(),
            request_timeout: Duration::from_secs(30),
            block_page_size: DEFAULT_BLOCK_PAGE_SIZE,
        }
    }

    /// Load using an arbitrary variable lookup.
    ///
    /// Supported variables:
    /// - `NOTION_KEY`, `NOTION_DATABASE_ID` (required)
    /// - `NOTION_API_BASE`, `NOTION_VERSION`
    /// - `DOCSYNC_TAG_PROPERTY`, `DOCSYNC_MARKER_TAG`
    /// - `DOCSYNC_WORKERS`, `DOCSYNC_REQUESTS_PER_SECOND`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let notion_key = lookup("NOTION_KEY").unwrap_or_default();
        let database_id = lookup("NOTION_DATABASE_ID").unwrap_or_default();
        Self::new(notion_key, database_id).with_overrides(lookup)
    }

    /// Apply optional overrides on top of the current values.
    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("NOTION_API_BASE") {
            self.api_base = val.trim_end_matches('/').to_string();
        }
        if let Some(val) = lookup("NOTION_VERSION") {
            self.notion_version = val;
        }
        if let Some(val) = lookup("DOCSYNC_TAG_PROPERTY") {
            self.tag_property = val;
        }
        if let Some(val) = lookup("DOCSYNC_MARKER_TAG") {
            self.marker_tag = val;
        }
        if let Some(val) = lookup("DOCSYNC_WORKERS") {
            self.workers = parse_number("DOCSYNC_WORKERS", &val)?;
        }
        if let Some(val) = lookup("DOCSYNC_REQUESTS_PER_SECOND") {
            self.requests_per_second = parse_number("DOCSYNC_REQUESTS_PER_SECOND", &val)?;
        }
        Ok(self)
    }

    /// Check that the config can drive a sync run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notion_key.trim().is_empty() {
            return Err(ConfigError::Missing("NOTION_KEY"));
        }
        if self.database_id.trim().is_empty() {
            return Err(ConfigError::Missing("NOTION_DATABASE_ID"));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                key: "workers",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.requests_per_second == 0 {
            return Err(ConfigError::Invalid {
                key: "requests_per_second",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.block_page_size == 0 || self.block_page_size > 100 {
            return Err(ConfigError::Invalid {
                key: "block_page_size",
                value: self.block_page_size.to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
