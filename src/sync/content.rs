//! Loading documents and preparing their content blocks.

use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{SyncError, SyncResult};
use crate::markdown::MarkdownConverter;
use crate::notion::ContentBlock;

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));

/// Replace markdown links `[text](url)` with their text.
///
/// Relative and local URLs are rejected by the store, so no link target may
/// reach it.
pub fn strip_links(markdown: &str) -> String {
    LINK_PATTERN.replace_all(markdown, "$1").into_owned()
}

/// Document title: the file name up to its first `.`.
pub fn derive_title(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name.split('.').next().unwrap_or(file_name).to_string()
}

/// Reads files and converts them into content blocks.
#[derive(Clone)]
pub struct ContentPreparer {
    converter: Arc<dyn MarkdownConverter>,
    root: Option<PathBuf>,
}

impl ContentPreparer {
    pub fn new(converter: Arc<dyn MarkdownConverter>) -> Self {
        Self {
            converter,
            root: None,
        }
    }

    /// Resolve relative document paths against `root` instead of the
    /// working directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => PathBuf::from(path),
        }
    }

    /// Convert markdown text, stripping links first.
    pub fn prepare_text(&self, markdown: &str) -> Vec<ContentBlock> {
        self.converter.convert(&strip_links(markdown))
    }

    /// Read `path` in full and convert it.
    pub async fn prepare(&self, path: &str) -> SyncResult<Vec<ContentBlock>> {
        let resolved = self.resolve(path);
        let contents = tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|source| SyncError::FileRead {
                path: resolved.clone(),
                source,
            })?;
        Ok(self.prepare_text(&contents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::NotionMarkdownConverter;

    fn preparer() -> ContentPreparer {
        ContentPreparer::new(Arc::new(NotionMarkdownConverter::default()))
    }

    #[test]
    fn test_strip_links() {
        assert_eq!(
            strip_links("[Click here](./local.md) for info"),
            "Click here for info"
        );
        assert_eq!(
            strip_links("[a](x.md) and [b](https://example.com/b)"),
            "a and b"
        );
        assert_eq!(strip_links("no links here"), "no links here");
        assert_eq!(strip_links("![logo](img/logo.png)"), "!logo");
        assert_eq!(strip_links("[](empty.md)"), "[](empty.md)");
    }

    #[test]
    fn test_derive_title() {
        assert_eq!(derive_title("docs/sub/My Doc.v2.md"), "My Doc");
        assert_eq!(derive_title("docs/readme.md"), "readme");
        assert_eq!(derive_title("readme"), "readme");
        assert_eq!(derive_title(".hidden"), "");
    }

    #[test]
    fn test_links_stripped_before_conversion() {
        let blocks = preparer().prepare_text("See [the guide](../guide.md).\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].plain_text(), "See the guide.");
        let json = serde_json::to_string(blocks[0].as_json()).unwrap();
        assert!(!json.contains("guide.md"));
    }

    #[tokio::test]
    async fn test_prepare_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# Heading\n\nBody\n").unwrap();

        let blocks = preparer().prepare(path.to_str().unwrap()).await.unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].block_type(), "heading_1");
    }

    #[tokio::test]
    async fn test_prepare_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/guide.md"), "Guide text\n").unwrap();

        let blocks = preparer()
            .with_root(dir.path())
            .prepare("docs/guide.md")
            .await
            .unwrap();
        assert_eq!(blocks[0].plain_text(), "Guide text");
    }

    #[tokio::test]
    async fn test_prepare_missing_file() {
        let err = preparer().prepare("does/not/exist.md").await.unwrap_err();
        assert!(matches!(err, SyncError::FileRead { .. }));
        assert!(err.to_string().contains("does/not/exist.md"));
    }
}
