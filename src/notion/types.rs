//! Notion identifiers, content blocks, and response parsing.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::{NotionError, NotionResult};

/// Opaque page identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub String);

/// Opaque block identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        PageId(s.to_string())
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        BlockId(s.to_string())
    }
}

/// One structured unit of page content, in Notion's block object format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentBlock(Value);

impl ContentBlock {
    /// Build a block of `block_type` with the given type-specific payload.
    pub fn new(block_type: &str, body: Value) -> Self {
        let mut block = json!({
            "object": "block",
            "type": block_type,
        });
        block[block_type] = body;
        ContentBlock(block)
    }

    pub fn block_type(&self) -> &str {
        self.0.get("type").and_then(Value::as_str).unwrap_or("")
    }

    /// Concatenated plain text of the block's rich text, if it has any.
    pub fn plain_text(&self) -> String {
        let body = &self.0[self.block_type()];
        body.get("rich_text")
            .and_then(Value::as_array)
            .map(|segments| {
                segments
                    .iter()
                    .filter_map(|s| s.pointer("/text/content").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

/// A remote page's title and identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePageRef {
    pub title: String,
    pub id: PageId,
}

/// One page of database query results.
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub pages: Vec<RemotePageRef>,
    pub next_cursor: Option<String>,
}

/// One page of block children.
#[derive(Debug, Clone, Default)]
pub struct BlockPage {
    pub block_ids: Vec<BlockId>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

impl ListResponse {
    fn parse(value: Value) -> NotionResult<Self> {
        serde_json::from_value(value).map_err(|e| NotionError::Decode(e.to_string()))
    }

    fn cursor(&self) -> Option<String> {
        if self.has_more {
            self.next_cursor.clone()
        } else {
            None
        }
    }
}

/// Parse a `databases/{id}/query` response.
///
/// Pages without a readable title are skipped.
pub fn parse_query_response(value: Value) -> NotionResult<QueryPage> {
    let list = ListResponse::parse(value)?;
    let next_cursor = list.cursor();
    let pages = list
        .results
        .iter()
        .filter_map(|page| {
            let id = page.get("id").and_then(Value::as_str)?;
            let title = page_title(page)?;
            Some(RemotePageRef {
                title,
                id: PageId::from(id),
            })
        })
        .collect();
    Ok(QueryPage { pages, next_cursor })
}

/// Parse a `blocks/{id}/children` listing.
pub fn parse_block_list(value: Value) -> NotionResult<BlockPage> {
    let list = ListResponse::parse(value)?;
    let next_cursor = list.cursor();
    let block_ids = list
        .results
        .iter()
        .filter_map(|block| block.get("id").and_then(Value::as_str))
        .map(BlockId::from)
        .collect();
    Ok(BlockPage {
        block_ids,
        next_cursor,
    })
}

/// Extract the plain text of the first segment of a page's title property.
///
/// The title property is found by type, so it works whatever the database
/// names its title column.
pub fn page_title(page: &Value) -> Option<String> {
    let properties = page.get("properties")?.as_object()?;
    let title_prop = properties
        .values()
        .find(|prop| prop.get("type").and_then(Value::as_str) == Some("title"))?;
    let first = title_prop.get("title")?.as_array()?.first()?;
    first
        .get("plain_text")
        .or_else(|| first.pointer("/text/content"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Properties payload for a new page.
pub fn page_properties(tag_property: &str, title: &str, tags: &[&str]) -> Value {
    let options: Vec<Value> = tags.iter().map(|tag| json!({ "name": tag })).collect();
    let mut properties = json!({
        "title": {
            "title": [{ "text": { "content": title } }]
        }
    });
    properties[tag_property] = json!({
        "type": "multi_select",
        "multi_select": options,
    });
    properties
}

/// Filter selecting pages whose tag property contains `tag`.
pub fn tag_filter(tag_property: &str, tag: &str) -> Value {
    json!({
        "property": tag_property,
        "multi_select": { "contains": tag }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_response() {
        let body = json!({
            "object": "list",
            "results": [
                {
                    "id": "page-1",
                    "properties": {
                        "Tags": { "type": "multi_select", "multi_select": [] },
                        "Name": {
                            "type": "title",
                            "title": [{ "plain_text": "readme", "text": { "content": "readme" } }]
                        }
                    }
                },
                {
                    "id": "page-2",
                    "properties": { "Name": { "type": "title", "title": [] } }
                }
            ],
            "has_more": true,
            "next_cursor": "cursor-2"
        });

        let page = parse_query_response(body).unwrap();
        assert_eq!(
            page.pages,
            vec![RemotePageRef {
                title: "readme".to_string(),
                id: PageId::from("page-1"),
            }]
        );
        assert_eq!(page.next_cursor.as_deref(), Some("cursor-2"));
    }

    #[test]
    fn test_cursor_ignored_without_has_more() {
        let body = json!({ "results": [], "has_more": false, "next_cursor": "stale" });
        assert!(parse_query_response(body).unwrap().next_cursor.is_none());
    }

    #[test]
    fn test_parse_block_list() {
        let body = json!({
            "results": [{ "id": "b1", "type": "paragraph" }, { "id": "b2" }],
            "has_more": false,
            "next_cursor": null
        });
        let page = parse_block_list(body).unwrap();
        assert_eq!(page.block_ids, vec![BlockId::from("b1"), BlockId::from("b2")]);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let err = parse_block_list(json!({ "results": "nope" })).unwrap_err();
        assert!(matches!(err, NotionError::Decode(_)));
    }

    #[test]
    fn test_title_falls_back_to_text_content() {
        let page = json!({
            "properties": {
                "title": { "type": "title", "title": [{ "text": { "content": "guide" } }] }
            }
        });
        assert_eq!(page_title(&page).as_deref(), Some("guide"));
    }

    #[test]
    fn test_page_properties() {
        let props = page_properties("Tags", "guide", &["docs", "repo doc"]);
        assert_eq!(props["title"]["title"][0]["text"]["content"], "guide");
        assert_eq!(props["Tags"]["multi_select"][0]["name"], "docs");
        assert_eq!(props["Tags"]["multi_select"][1]["name"], "repo doc");
    }

    #[test]
    fn test_tag_filter() {
        let filter = tag_filter("Tags", "docs");
        assert_eq!(filter["property"], "Tags");
        assert_eq!(filter["multi_select"]["contains"], "docs");
    }

    #[test]
    fn test_content_block_accessors() {
        let block = ContentBlock::new(
            "paragraph",
            json!({ "rich_text": [{ "type": "text", "text": { "content": "hi " } }, { "type": "text", "text": { "content": "there" } }] }),
        );
        assert_eq!(block.block_type(), "paragraph");
        assert_eq!(block.plain_text(), "hi there");
        assert_eq!(block.as_json()["object"], "block");
    }
}
