//! Content extraction: from a URL to title, text, author and content type

mod author;
mod drive;
mod http;

pub use author::extract_author;
pub use drive::{drive_file_id, resolve_file_hosting, FileHost};
pub use http::{clean_text, HttpContentExtractor};

use async_trait::async_trait;
use thiserror::Error;

/// Content type given to HTML pages
pub const CONTENT_TYPE_BLOG: &str = "blog";

/// Content type given to everything else that is supported
pub const CONTENT_TYPE_OTHER: &str = "other";

/// Readable content of one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub url: String,
    pub title: String,
    pub text: String,
    pub author: Option<String>,
    pub content_type: String,
}

/// Why a URL produced no content
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("unsupported content type '{content_type}'")]
    Unsupported { content_type: String },

    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("unreadable document: {0}")]
    Unreadable(String),

    #[error("no readable content")]
    Empty,
}

/// Content extraction collaborator
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractedContent, ExtractError>;
}
