//! Offline markdown transformer

use crate::extract::ExtractedContent;
use crate::pipeline::chunker::ContentChunk;
use crate::pipeline::traits::{AdapterError, DocumentMetadata, Transformer, TransformedSection};
use async_trait::async_trait;

/// Converts plain text into a minimal markdown document
///
/// The title becomes a level-one heading on the whole document or on the
/// first chunk only; paragraphs are trimmed and empty ones dropped.
#[derive(Debug, Clone, Default)]
pub struct MarkdownTransformer;

impl MarkdownTransformer {
    pub fn new() -> Self {
        Self
    }
}

fn paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn to_markdown(title: &str, text: &str, with_heading: bool) -> Option<String> {
    let body = paragraphs(text).join("\n\n");
    if body.is_empty() {
        return None;
    }

    let title = title.trim();
    if with_heading && !title.is_empty() {
        Some(format!("# {}\n\n{}", title, body))
    } else {
        Some(body)
    }
}

#[async_trait]
impl Transformer for MarkdownTransformer {
    async fn transform(
        &self,
        content: &ExtractedContent,
        chunk: Option<&ContentChunk>,
    ) -> Result<Option<TransformedSection>, AdapterError> {
        let (text, with_heading) = match chunk {
            Some(chunk) => (chunk.text.as_str(), chunk.index == 0),
            None => (content.text.as_str(), true),
        };

        Ok(
            to_markdown(&content.title, text, with_heading).map(|body| TransformedSection {
                title: with_heading
                    .then(|| content.title.trim().to_string())
                    .filter(|t| !t.is_empty()),
                body,
            }),
        )
    }

    async fn extract_metadata(
        &self,
        content: &ExtractedContent,
        first_chunk: &ContentChunk,
    ) -> Result<Option<DocumentMetadata>, AdapterError> {
        let heading = first_chunk
            .text
            .lines()
            .find_map(|line| line.trim().strip_prefix("# "))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let title = match heading {
            Some(heading) => heading.to_string(),
            None if !content.title.trim().is_empty() => content.title.trim().to_string(),
            None => first_chunk
                .text
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or_default()
                .to_string(),
        };

        Ok(Some(DocumentMetadata {
            title,
            content_type: content.content_type.clone(),
            author: content.author.clone(),
        }))
    }
}
