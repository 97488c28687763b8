//! Remote document store: the Notion database pages are synced into.
//!
//! The sync engine talks to the store through [`DocumentStore`] so the
//! reconciliation logic can run against [`NotionClient`] or, in tests, an
//! in-memory store.

mod client;
mod error;
mod types;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;

pub use client::{NotionClient, MAX_CHILDREN_PER_APPEND};
pub use error::{NotionError, NotionResult};
pub use types::{
    page_properties, page_title, parse_block_list, parse_query_response, tag_filter, BlockId,
    BlockPage, ContentBlock, PageId, QueryPage, RemotePageRef,
};

/// Operations the sync engine needs from the remote store.
///
/// Implementations are bound to one parent database and must be safe to
/// share across tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a page in the parent database with a title and tag values.
    async fn create_page(&self, title: &str, tags: &[&str]) -> NotionResult<PageId>;

    /// Fetch one page of database entries whose tag property contains `tag`.
    async fn query_database(&self, tag: &str, cursor: Option<&str>) -> NotionResult<QueryPage>;

    /// Fetch one page of a page's child block ids.
    async fn list_block_children(
        &self,
        page: &PageId,
        page_size: u32,
        cursor: Option<&str>,
    ) -> NotionResult<BlockPage>;

    async fn delete_block(&self, block: &BlockId) -> NotionResult<()>;

    /// Append blocks to the end of a page, preserving their order.
    async fn append_block_children(&self, page: &PageId, blocks: &[ContentBlock])
        -> NotionResult<()>;
}
