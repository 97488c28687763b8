//! Creating pages for documents that have no remote counterpart yet.

use tracing::{error, info};

use crate::notion::{DocumentStore, NotionResult, PageId};

/// Create a page titled `title`, tagged with `tag` and the marker tag.
pub async fn create_page(
    store: &dyn DocumentStore,
    title: &str,
    tag: &str,
    marker_tag: &str,
) -> NotionResult<PageId> {
    info!("Creating page: {} ({})", title, tag);
    match store.create_page(title, &[tag, marker_tag]).await {
        Ok(id) => {
            info!("Created page: {} {} ({})", title, id, tag);
            Ok(id)
        }
        Err(e) => {
            error!("Error creating page {}: {}", title, e);
            Err(e)
        }
    }
}
