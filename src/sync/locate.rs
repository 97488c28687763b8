//! Finding the remote pages already filed under a tag.

use tracing::debug;

use crate::notion::{DocumentStore, NotionResult, PageId, RemotePageRef};

/// Pages found for one tag, looked up by exact title.
#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    pages: Vec<RemotePageRef>,
}

impl PageIndex {
    pub fn new(pages: Vec<RemotePageRef>) -> Self {
        Self { pages }
    }

    /// First page whose title equals `title`.
    pub fn find(&self, title: &str) -> Option<&PageId> {
        self.pages.iter().find(|p| p.title == title).map(|p| &p.id)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Query every page tagged with `tag`, following cursors until exhausted.
pub async fn locate_pages(store: &dyn DocumentStore, tag: &str) -> NotionResult<PageIndex> {
    let mut pages = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let result = store.query_database(tag, cursor.as_deref()).await?;
        pages.extend(result.pages);
        match result.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    debug!("Found {} existing pages for tag {}", pages.len(), tag);
    Ok(PageIndex::new(pages))
}
