//! Collaborator interfaces for the validate and transform stages

use crate::extract::ExtractedContent;
use crate::pipeline::chunker::ContentChunk;
use async_trait::async_trait;
use thiserror::Error;

/// Failures raised by a validator or transformer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdapterError {
    #[error("adapter unavailable: {0}")]
    Unavailable(String),

    #[error("adapter failed: {0}")]
    Failed(String),
}

/// Structured output of one transform call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedSection {
    pub title: Option<String>,
    pub body: String,
}

/// Document-level attributes taken once from the first chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: String,
    pub content_type: String,
    pub author: Option<String>,
}

/// Decides whether extracted content is worth keeping
///
/// A `false` answer is a normal outcome, not an error.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, content: &ExtractedContent) -> bool;
}

/// Turns extracted content into a structured section
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Transforms the whole document (`chunk == None`) or one chunk of it
    ///
    /// `Ok(None)` means no usable structure came out.
    async fn transform(
        &self,
        content: &ExtractedContent,
        chunk: Option<&ContentChunk>,
    ) -> Result<Option<TransformedSection>, AdapterError>;

    /// Reads document-level metadata from the first chunk only
    async fn extract_metadata(
        &self,
        content: &ExtractedContent,
        first_chunk: &ContentChunk,
    ) -> Result<Option<DocumentMetadata>, AdapterError>;
}
