//! In-memory document store for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    BlockId, BlockPage, ContentBlock, DocumentStore, NotionError, NotionResult, PageId, QueryPage,
    RemotePageRef,
};

/// A recorded store call, in the order calls were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(String),
    Query(String),
    List(PageId),
    Delete(BlockId),
    Append(PageId, usize),
}

#[derive(Debug, Clone)]
pub struct MemoryPage {
    pub id: PageId,
    pub title: String,
    pub tags: Vec<String>,
    pub blocks: Vec<(BlockId, ContentBlock)>,
}

#[derive(Debug, Default)]
struct StoreState {
    pages: Vec<MemoryPage>,
    next_id: u64,
    calls: Vec<Call>,
    failing_deletes: HashSet<BlockId>,
    failing_creates: HashSet<String>,
    failing_queries: HashSet<String>,
    failing_lists: HashSet<PageId>,
    /// Page -> number of blocks written before the append fails.
    failing_appends: HashMap<PageId, usize>,
}

impl StoreState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// In-memory store with small result pages so pagination is exercised.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
    query_page_size: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_query_page_size(2)
    }

    pub fn with_query_page_size(query_page_size: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            query_page_size,
        }
    }

    /// Seed a page with `block_count` placeholder blocks.
    pub async fn seed_page(&self, title: &str, tags: &[&str], block_count: usize) -> PageId {
        let mut state = self.state.lock().await;
        let id = PageId(state.next_id("page"));
        let blocks = (0..block_count)
            .map(|i| {
                let block_id = BlockId(state.next_id("block"));
                let block = ContentBlock::new(
                    "paragraph",
                    serde_json::json!({ "rich_text": [{ "type": "text", "text": { "content": format!("old {i}") } }] }),
                );
                (block_id, block)
            })
            .collect();
        state.pages.push(MemoryPage {
            id: id.clone(),
            title: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            blocks,
        });
        id
    }

    pub async fn fail_delete(&self, block: &BlockId) {
        self.state.lock().await.failing_deletes.insert(block.clone());
    }

    pub async fn fail_create(&self, title: &str) {
        self.state.lock().await.failing_creates.insert(title.to_string());
    }

    pub async fn fail_query(&self, tag: &str) {
        self.state.lock().await.failing_queries.insert(tag.to_string());
    }

    pub async fn fail_list(&self, page: &PageId) {
        self.state.lock().await.failing_lists.insert(page.clone());
    }

    pub async fn fail_append(&self, page: &PageId) {
        self.fail_append_after(page, 0).await;
    }

    /// Accept the first `written` blocks of the next appends, then fail.
    pub async fn fail_append_after(&self, page: &PageId, written: usize) {
        self.state
            .lock()
            .await
            .failing_appends
            .insert(page.clone(), written);
    }

    pub async fn page(&self, id: &PageId) -> Option<MemoryPage> {
        let state = self.state.lock().await;
        state.pages.iter().find(|p| &p.id == id).cloned()
    }

    pub async fn pages(&self) -> Vec<MemoryPage> {
        self.state.lock().await.pages.clone()
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.state.lock().await.calls.clone()
    }

    fn rejected(what: &str) -> NotionError {
        NotionError::Api {
            status: 400,
            code: "validation_error".to_string(),
            message: format!("{what} rejected"),
        }
    }

    fn not_found(id: &str) -> NotionError {
        NotionError::Api {
            status: 404,
            code: "object_not_found".to_string(),
            message: format!("{id} not found"),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_page(&self, title: &str, tags: &[&str]) -> NotionResult<PageId> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::Create(title.to_string()));
        if state.failing_creates.contains(title) {
            return Err(Self::rejected("create"));
        }
        let id = PageId(state.next_id("page"));
        state.pages.push(MemoryPage {
            id: id.clone(),
            title: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            blocks: Vec::new(),
        });
        Ok(id)
    }

    async fn query_database(&self, tag: &str, cursor: Option<&str>) -> NotionResult<QueryPage> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::Query(tag.to_string()));
        if state.failing_queries.contains(tag) {
            return Err(Self::rejected("query"));
        }
        let matching: Vec<RemotePageRef> = state
            .pages
            .iter()
            .filter(|p| p.tags.iter().any(|t| t == tag))
            .map(|p| RemotePageRef {
                title: p.title.clone(),
                id: p.id.clone(),
            })
            .collect();

        let start: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
        let end = (start + self.query_page_size).min(matching.len());
        let next_cursor = (end < matching.len()).then(|| end.to_string());
        Ok(QueryPage {
            pages: matching[start.min(end)..end].to_vec(),
            next_cursor,
        })
    }

    async fn list_block_children(
        &self,
        page: &PageId,
        page_size: u32,
        cursor: Option<&str>,
    ) -> NotionResult<BlockPage> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::List(page.clone()));
        if state.failing_lists.contains(page) {
            return Err(Self::rejected("list"));
        }
        let found = state
            .pages
            .iter()
            .find(|p| &p.id == page)
            .ok_or_else(|| Self::not_found(&page.0))?;

        let ids: Vec<BlockId> = found.blocks.iter().map(|(id, _)| id.clone()).collect();
        let start: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
        let end = (start + page_size as usize).min(ids.len());
        let next_cursor = (end < ids.len()).then(|| end.to_string());
        Ok(BlockPage {
            block_ids: ids[start.min(end)..end].to_vec(),
            next_cursor,
        })
    }

    async fn delete_block(&self, block: &BlockId) -> NotionResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::Delete(block.clone()));
        if state.failing_deletes.contains(block) {
            return Err(Self::rejected("delete"));
        }
        for page in state.pages.iter_mut() {
            if let Some(pos) = page.blocks.iter().position(|(id, _)| id == block) {
                page.blocks.remove(pos);
                return Ok(());
            }
        }
        Err(Self::not_found(&block.0))
    }

    async fn append_block_children(
        &self,
        page: &PageId,
        blocks: &[ContentBlock],
    ) -> NotionResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::Append(page.clone(), blocks.len()));
        let limit = state.failing_appends.get(page).copied();
        let accepted = &blocks[..limit.unwrap_or(blocks.len()).min(blocks.len())];
        let new_ids: Vec<BlockId> = (0..accepted.len())
            .map(|_| BlockId(state.next_id("block")))
            .collect();
        let target = state
            .pages
            .iter_mut()
            .find(|p| &p.id == page)
            .ok_or_else(|| Self::not_found(&page.0))?;
        target
            .blocks
            .extend(new_ids.into_iter().zip(accepted.iter().cloned()));

        match limit {
            None => Ok(()),
            Some(0) => Err(Self::rejected("append")),
            Some(_) => Err(NotionError::PartialAppend {
                appended: accepted.len(),
                source: Box::new(Self::rejected("append")),
            }),
        }
    }
}
