//! Reconciliation of changed documents against the remote database.
//!
//! Files are grouped by tag; each tag's existing pages are looked up once,
//! then every file is either created as a new page or has its existing
//! page's content replaced. Tags and files are processed concurrently up to
//! the configured worker count, and every file produces a [`FileOutcome`].

mod content;
mod create;
mod locate;
mod replace;
mod tags;

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tracing::{error, info};

pub use content::{derive_title, strip_links, ContentPreparer};
pub use create::create_page;
pub use locate::{locate_pages, PageIndex};
pub use replace::{delete_blocks, list_block_ids, replace_content, upload_blocks, ReplaceOutcome};
pub use tags::{extract_tags, TagMap};

use crate::config::{DeletionPacing, SyncConfig};
use crate::error::SyncResult;
use crate::markdown::NotionMarkdownConverter;
use crate::notion::{DocumentStore, NotionClient, NotionResult, PageId};

/// Knobs the synchronizer needs from the config.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub marker_tag: String,
    pub workers: usize,
    pub deletion_pacing: DeletionPacing,
    pub block_page_size: u32,
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            marker_tag: config.marker_tag.clone(),
            workers: config.workers,
            deletion_pacing: config.deletion_pacing,
            block_page_size: config.block_page_size,
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// A new page was created. With `append_error` set, only the first
    /// `appended` blocks reached it.
    Created {
        page_id: PageId,
        appended: usize,
        append_error: Option<String>,
    },
    /// An existing page had its content replaced.
    Updated {
        page_id: PageId,
        outcome: ReplaceOutcome,
    },
    /// Nothing was written for this file.
    Failed(String),
}

/// Result of syncing one file under one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub tag: String,
    pub path: String,
    pub title: String,
    pub action: SyncAction,
}

impl FileOutcome {
    /// Whether the page now holds exactly the file's content.
    pub fn is_complete(&self) -> bool {
        match &self.action {
            SyncAction::Created { append_error, .. } => append_error.is_none(),
            SyncAction::Updated { outcome, .. } => outcome.is_clean(),
            SyncAction::Failed(_) => false,
        }
    }
}

/// Outcomes of a sync run, in tag order then file order.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub outcomes: Vec<FileOutcome>,
}

impl SyncReport {
    pub fn created(&self) -> usize {
        self.count(|a| matches!(a, SyncAction::Created { .. }))
    }

    pub fn updated(&self) -> usize {
        self.count(|a| matches!(a, SyncAction::Updated { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|a| matches!(a, SyncAction::Failed(_)))
    }

    /// Files that were written but not cleanly.
    pub fn incomplete(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.is_complete() && !matches!(o.action, SyncAction::Failed(_)))
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::is_complete)
    }

    fn count(&self, pred: impl Fn(&SyncAction) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.action)).count()
    }
}

/// Drives a sync run against a document store.
pub struct Synchronizer {
    store: Arc<dyn DocumentStore>,
    preparer: ContentPreparer,
    options: SyncOptions,
}

impl Synchronizer {
    pub fn new(store: Arc<dyn DocumentStore>, preparer: ContentPreparer, options: SyncOptions) -> Self {
        Self {
            store,
            preparer,
            options,
        }
    }

    /// Build a synchronizer talking to Notion with the default converter.
    pub fn from_config(config: &SyncConfig) -> NotionResult<Self> {
        let client = NotionClient::new(config)?;
        let preparer = ContentPreparer::new(Arc::new(NotionMarkdownConverter::default()));
        Ok(Self::new(Arc::new(client), preparer, SyncOptions::from(config)))
    }

    /// Resolve document paths against `root`.
    pub fn with_root(mut self, root: impl Into<std::path::PathBuf>) -> Self {
        self.preparer = self.preparer.with_root(root);
        self
    }

    /// Sync every tagged file in `paths`, waiting for all work to finish.
    pub async fn run<S: AsRef<str>>(&self, paths: &[S]) -> SyncReport {
        let tags = extract_tags(paths.iter().map(|p| p.as_ref()));
        info!(
            "Syncing {} files across {} tags",
            tags.file_count(),
            tags.len()
        );

        let workers = self.options.workers.max(1);
        let semaphore = Semaphore::new(workers);
        let permits = &semaphore;
        let per_tag: Vec<Vec<FileOutcome>> = stream::iter(tags)
            .map(move |(tag, files)| self.sync_tag(tag, files, permits))
            .buffered(workers)
            .collect()
            .await;

        SyncReport {
            outcomes: per_tag.into_iter().flatten().collect(),
        }
    }

    async fn sync_tag(&self, tag: String, files: Vec<String>, permits: &Semaphore) -> Vec<FileOutcome> {
        let index = match locate_pages(self.store.as_ref(), &tag).await {
            Ok(index) => index,
            Err(e) => {
                error!("Error getting pages for tag {}: {}", tag, e);
                let reason = e.to_string();
                return files
                    .into_iter()
                    .map(|path| FileOutcome {
                        tag: tag.clone(),
                        title: derive_title(&path),
                        path,
                        action: SyncAction::Failed(reason.clone()),
                    })
                    .collect();
            }
        };

        let jobs = files
            .into_iter()
            .map(|path| self.sync_file(&tag, path, &index, permits));
        futures::future::join_all(jobs).await
    }

    async fn sync_file(
        &self,
        tag: &str,
        path: String,
        index: &PageIndex,
        permits: &Semaphore,
    ) -> FileOutcome {
        // Held for the whole file so at most `workers` files are in flight.
        let _permit = permits.acquire().await;

        let title = derive_title(&path);
        let action = match self.sync_document(tag, &path, &title, index).await {
            Ok(action) => action,
            Err(e) => {
                error!("Error syncing {}: {}", path, e);
                SyncAction::Failed(e.to_string())
            }
        };

        FileOutcome {
            tag: tag.to_string(),
            path,
            title,
            action,
        }
    }

    async fn sync_document(
        &self,
        tag: &str,
        path: &str,
        title: &str,
        index: &PageIndex,
    ) -> SyncResult<SyncAction> {
        let blocks = self.preparer.prepare(path).await?;
        let store = self.store.as_ref();

        match index.find(title) {
            Some(page_id) => {
                info!("Updating page: {} {} ({})", title, page_id, tag);
                let outcome = replace_content(
                    store,
                    self.options.deletion_pacing,
                    self.options.block_page_size,
                    page_id,
                    &blocks,
                )
                .await;
                Ok(SyncAction::Updated {
                    page_id: page_id.clone(),
                    outcome,
                })
            }
            None => {
                let page_id = create_page(store, title, tag, &self.options.marker_tag).await?;
                let (appended, append_error) = upload_blocks(store, &page_id, &blocks).await;
                Ok(SyncAction::Created {
                    page_id,
                    appended,
                    append_error,
                })
            }
        }
    }
}
