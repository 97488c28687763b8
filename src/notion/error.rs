//! Notion client error types.

use serde::Deserialize;
use thiserror::Error;

/// Result type for document store operations.
pub type NotionResult<T> = Result<T, NotionError>;

/// Errors from the remote document store.
#[derive(Debug, Error)]
pub enum NotionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Notion API error (HTTP {status}): {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("Failed to decode response: {0}")]
    Decode(String),
    /// A multi-request append failed after some blocks were written.
    #[error("Append failed after {appended} blocks: {source}")]
    PartialAppend {
        appended: usize,
        #[source]
        source: Box<NotionError>,
    },
}

impl NotionError {
    /// Build an API error from a non-success response body.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            #[serde(default)]
            code: String,
            #[serde(default)]
            message: String,
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => NotionError::Api {
                status,
                code: parsed.code,
                message: parsed.message,
            },
            Err(_) => NotionError::Api {
                status,
                code: "unknown".to_string(),
                message: body.chars().take(200).collect(),
            },
        }
    }

    /// Whether the store rejected the request for exceeding its rate limit.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            NotionError::Api { status: 429, .. } => true,
            NotionError::PartialAppend { source, .. } => source.is_rate_limited(),
            _ => false,
        }
    }

    /// Blocks already written when an append failed.
    pub fn blocks_appended(&self) -> usize {
        match self {
            NotionError::PartialAppend { appended, .. } => *appended,
            _ => 0,
        }
    }
}
