//! Replacing an existing page's content: delete every block, then append.
//!
//! Deletions are best-effort. A failed deletion is recorded and the pass
//! moves on, so a page can end up holding leftover old blocks followed by
//! the new ones. The outcome reports that case instead of hiding it.

use tracing::{error, info, warn};

use crate::config::DeletionPacing;
use crate::notion::{BlockId, ContentBlock, DocumentStore, NotionResult, PageId};

/// Result of replacing one page's content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Blocks found on the page before replacement.
    pub listed: usize,
    pub deleted: usize,
    /// Blocks that could not be deleted, with the error message.
    pub failed_deletions: Vec<(BlockId, String)>,
    /// Set when the block listing failed. The page was left untouched.
    pub list_error: Option<String>,
    pub appended: usize,
    pub append_error: Option<String>,
}

impl ReplaceOutcome {
    /// Whether old content may remain on the page.
    pub fn is_partial(&self) -> bool {
        !self.failed_deletions.is_empty() || self.list_error.is_some()
    }

    pub fn is_clean(&self) -> bool {
        !self.is_partial() && self.append_error.is_none()
    }
}

/// List all child block ids of a page, following cursors.
pub async fn list_block_ids(
    store: &dyn DocumentStore,
    page: &PageId,
    page_size: u32,
) -> NotionResult<Vec<BlockId>> {
    let mut ids = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let result = store
            .list_block_children(page, page_size, cursor.as_deref())
            .await?;
        ids.extend(result.block_ids);
        match result.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok(ids)
}

/// Delete blocks in order, pausing before every `pacing.every`-th one.
///
/// Returns the number deleted and the failures.
pub async fn delete_blocks(
    store: &dyn DocumentStore,
    pacing: DeletionPacing,
    block_ids: &[BlockId],
) -> (usize, Vec<(BlockId, String)>) {
    let mut deleted = 0;
    let mut failed = Vec::new();

    for (index, block_id) in block_ids.iter().enumerate() {
        if pacing.pauses_before(index) {
            tokio::time::sleep(pacing.delay).await;
        }
        match store.delete_block(block_id).await {
            Ok(()) => {
                info!("Deleted block: {}", block_id);
                deleted += 1;
            }
            Err(e) => {
                error!("Error deleting block {}: {}", block_id, e);
                failed.push((block_id.clone(), e.to_string()));
            }
        }
    }

    (deleted, failed)
}

/// Append blocks to a page, logging instead of failing.
///
/// Returns the number of blocks written and the error, if any. A failed
/// append can still have written its leading batches.
pub async fn upload_blocks(
    store: &dyn DocumentStore,
    page: &PageId,
    blocks: &[ContentBlock],
) -> (usize, Option<String>) {
    info!("Uploading blocks...");
    match store.append_block_children(page, blocks).await {
        Ok(()) => (blocks.len(), None),
        Err(e) => {
            error!("Error uploading blocks to {}: {}", page, e);
            (e.blocks_appended(), Some(e.to_string()))
        }
    }
}

/// Replace all content of `page` with `blocks`.
///
/// The append starts only after every deletion attempt has finished, and it
/// runs even when some deletions failed. If the blocks cannot be listed the
/// page is left as it is: nothing is deleted and nothing is appended.
pub async fn replace_content(
    store: &dyn DocumentStore,
    pacing: DeletionPacing,
    page_size: u32,
    page: &PageId,
    blocks: &[ContentBlock],
) -> ReplaceOutcome {
    let mut outcome = ReplaceOutcome::default();

    let block_ids = match list_block_ids(store, page, page_size).await {
        Ok(ids) => ids,
        Err(e) => {
            error!("Error getting page blocks for {}: {}", page, e);
            outcome.list_error = Some(e.to_string());
            return outcome;
        }
    };
    outcome.listed = block_ids.len();

    let (deleted, failed) = delete_blocks(store, pacing, &block_ids).await;
    outcome.deleted = deleted;
    if !failed.is_empty() {
        warn!(
            "Deleted {} of {} blocks on page {}; old content remains",
            deleted,
            block_ids.len(),
            page
        );
    }
    outcome.failed_deletions = failed;

    let (appended, append_error) = upload_blocks(store, page, blocks).await;
    outcome.appended = appended;
    outcome.append_error = append_error;

    outcome
}
