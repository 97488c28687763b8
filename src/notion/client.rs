//! Notion REST client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::error::{NotionError, NotionResult};
use super::types::{
    page_properties, parse_block_list, parse_query_response, tag_filter, BlockId, BlockPage,
    ContentBlock, PageId, QueryPage,
};
use super::DocumentStore;
use crate::config::SyncConfig;
use crate::rate_limit::{RateLimitConfig, RateLimiter};

/// Notion rejects appends with more children than this.
pub const MAX_CHILDREN_PER_APPEND: usize = 100;

/// Client bound to a single database.
///
/// Every request goes through the shared rate limiter, so clones of one
/// client (or clients sharing a limiter) stay within one budget.
#[derive(Clone)]
pub struct NotionClient {
    client: Client,
    api_base: String,
    database_id: String,
    tag_property: String,
    rate_limiter: RateLimiter,
}

impl NotionClient {
    /// Create a client from the sync config with its own rate limiter.
    pub fn new(config: &SyncConfig) -> NotionResult<Self> {
        let limiter = RateLimiter::with_config(RateLimitConfig {
            requests_per_second: config.requests_per_second,
        });
        Self::with_rate_limiter(config, limiter)
    }

    /// Create a client that shares an existing rate limiter.
    pub fn with_rate_limiter(config: &SyncConfig, rate_limiter: RateLimiter) -> NotionResult<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.notion_key))
            .map_err(|e| NotionError::Decode(format!("invalid token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            "notion-version",
            HeaderValue::from_str(&config.notion_version)
                .map_err(|e| NotionError::Decode(format!("invalid Notion-Version: {e}")))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            database_id: config.database_id.clone(),
            tag_property: config.tag_property.clone(),
            rate_limiter,
        })
    }

    /// Get the rate limiter for this client.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    fn query_body(&self, tag: &str, cursor: Option<&str>) -> Value {
        let mut body = json!({ "filter": tag_filter(&self.tag_property, tag) });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }
        body
    }

    /// Send a request once the rate limiter allows it and decode the JSON body.
    async fn send(&self, request: RequestBuilder) -> NotionResult<Value> {
        self.rate_limiter.acquire().await;

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = NotionError::from_response(status.as_u16(), &body);
            if err.is_rate_limited() {
                warn!("Notion rate limit exceeded, request rejected");
            }
            return Err(err);
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| NotionError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for NotionClient {
    async fn create_page(&self, title: &str, tags: &[&str]) -> NotionResult<PageId> {
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": page_properties(&self.tag_property, title, tags),
        });
        let response = self.send(self.client.post(self.url("pages")).json(&body)).await?;

        response
            .get("id")
            .and_then(Value::as_str)
            .map(PageId::from)
            .ok_or_else(|| NotionError::Decode("page response has no id".to_string()))
    }

    async fn query_database(&self, tag: &str, cursor: Option<&str>) -> NotionResult<QueryPage> {
        let body = self.query_body(tag, cursor);
        let url = self.url(&format!("databases/{}/query", self.database_id));
        debug!("Querying pages tagged {}", tag);
        let response = self.send(self.client.post(url).json(&body)).await?;
        parse_query_response(response)
    }

    async fn list_block_children(
        &self,
        page: &PageId,
        page_size: u32,
        cursor: Option<&str>,
    ) -> NotionResult<BlockPage> {
        let request = self
            .client
            .get(self.url(&format!("blocks/{}/children", page)))
            .query(&list_params(page_size, cursor));
        let response = self.send(request).await?;
        parse_block_list(response)
    }

    async fn delete_block(&self, block: &BlockId) -> NotionResult<()> {
        self.send(self.client.delete(self.url(&format!("blocks/{}", block))))
            .await?;
        Ok(())
    }

    async fn append_block_children(
        &self,
        page: &PageId,
        blocks: &[ContentBlock],
    ) -> NotionResult<()> {
        let url = self.url(&format!("blocks/{}/children", page));
        // Batches are sent in order so the page keeps reading order.
        let mut appended = 0;
        for batch in blocks.chunks(MAX_CHILDREN_PER_APPEND) {
            let body = json!({ "children": batch });
            if let Err(e) = self.send(self.client.patch(&url).json(&body)).await {
                if appended == 0 {
                    return Err(e);
                }
                return Err(NotionError::PartialAppend {
                    appended,
                    source: Box::new(e),
                });
            }
            appended += batch.len();
        }
        Ok(())
    }
}

fn list_params(page_size: u32, cursor: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![("page_size", page_size.to_string())];
    if let Some(cursor) = cursor {
        params.push(("start_cursor", cursor.to_string()));
    }
    params
}
