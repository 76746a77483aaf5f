//! reqwest-backed content extractor

use crate::config::Config;
use crate::crawler::{
    body_text, build_http_client, content_type_of, document_title, element_text, send_get,
    UserAgentRotation,
};
use crate::extract::author::extract_author;
use crate::extract::drive::FileHost;
use crate::extract::{
    ContentExtractor, ExtractError, ExtractedContent, CONTENT_TYPE_BLOG, CONTENT_TYPE_OTHER,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::time::Duration;

/// Where the main content of a page usually lives, most specific last
const MAIN_CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    ".content",
    ".post-content",
    ".entry-content",
    "#content",
    "#main",
    ".main-content",
];

/// Collapses all whitespace runs to one space and caps the length in characters
pub fn clean_text(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max_chars) {
        Some((cut, _)) => collapsed[..cut].to_string(),
        None => collapsed,
    }
}

fn main_content_text(document: &Html) -> String {
    for selector in MAIN_CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = element_text(element);
            if !text.trim().is_empty() {
                return text;
            }
        }
    }
    body_text(document)
}

fn content_from_html(url: &str, html: &str, max_chars: usize) -> ExtractedContent {
    let document = Html::parse_document(html);

    ExtractedContent {
        url: url.to_string(),
        title: document_title(&document).unwrap_or_default(),
        text: clean_text(&main_content_text(&document), max_chars),
        author: extract_author(&document),
        content_type: CONTENT_TYPE_BLOG.to_string(),
    }
}

fn first_line_title(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| clean_text(line, 120))
        .unwrap_or_default()
}

fn content_from_plain_text(url: &str, body: &str, max_chars: usize) -> ExtractedContent {
    ExtractedContent {
        url: url.to_string(),
        title: first_line_title(body),
        text: clean_text(body, max_chars),
        author: None,
        content_type: CONTENT_TYPE_OTHER.to_string(),
    }
}

fn content_from_pdf(
    url: &str,
    bytes: &[u8],
    max_chars: usize,
) -> Result<ExtractedContent, ExtractError> {
    // the parser panics on some malformed files
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| ExtractError::Unreadable("PDF parser panicked".to_string()))?
        .map_err(|e| ExtractError::Unreadable(e.to_string()))?;

    Ok(ExtractedContent {
        url: url.to_string(),
        title: first_line_title(&text),
        text: clean_text(&text, max_chars),
        author: None,
        content_type: CONTENT_TYPE_OTHER.to_string(),
    })
}

/// Body formats the extractor can read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Html,
    PlainText,
    Pdf,
}

impl BodyKind {
    fn from_content_type(content_type: &str) -> Option<Self> {
        if content_type.contains("text/html") {
            Some(Self::Html)
        } else if content_type.contains("text/plain") {
            Some(Self::PlainText)
        } else if content_type.contains("application/pdf") {
            Some(Self::Pdf)
        } else {
            None
        }
    }
}

/// Extracts readable content over HTTP
///
/// Supports `text/html`, `text/plain` and `application/pdf`. Everything else
/// is reported as [`ExtractError::Unsupported`]. Hosted-file links are tried
/// through their direct download first, then scraped as ordinary pages.
#[derive(Debug)]
pub struct HttpContentExtractor {
    client: Client,
    agents: UserAgentRotation,
    max_content_length: usize,
    file_host: FileHost,
}

impl HttpContentExtractor {
    pub fn new(
        timeout: Duration,
        user_agents: Vec<String>,
        max_content_length: usize,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(timeout)?,
            agents: UserAgentRotation::new(user_agents),
            max_content_length,
            file_host: FileHost::default(),
        })
    }

    /// Resolves hosted-file links against `file_host` instead of Drive
    pub fn with_file_host(mut self, file_host: FileHost) -> Self {
        self.file_host = file_host;
        self
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.crawler.timeout(),
            config.crawler.user_agents.clone(),
            config.pipeline.max_content_length,
        )
    }

    /// Fetches `fetch_url` and reads it as the content of `url`
    async fn fetch_content(
        &self,
        url: &str,
        fetch_url: &str,
    ) -> Result<ExtractedContent, ExtractError> {
        let response = send_get(&self.client, &self.agents, fetch_url)
            .await
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(ExtractError::Status {
                status: response.status().as_u16(),
            });
        }

        let content_type = content_type_of(&response);
        let Some(kind) = BodyKind::from_content_type(&content_type) else {
            return Err(ExtractError::Unsupported { content_type });
        };

        let content = match kind {
            BodyKind::Pdf => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ExtractError::Network(e.to_string()))?;
                content_from_pdf(url, &bytes, self.max_content_length)?
            }
            BodyKind::Html | BodyKind::PlainText => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| ExtractError::Network(e.to_string()))?;
                if kind == BodyKind::Html {
                    content_from_html(url, &body, self.max_content_length)
                } else {
                    content_from_plain_text(url, &body, self.max_content_length)
                }
            }
        };

        if content.text.is_empty() {
            return Err(ExtractError::Empty);
        }

        Ok(content)
    }
}

#[async_trait]
impl ContentExtractor for HttpContentExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedContent, ExtractError> {
        if let Some(direct) = self.file_host.direct_url(url) {
            tracing::debug!("Resolved hosted file {} to {}", url, direct);
            match self.fetch_content(url, &direct).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    tracing::debug!("Direct download for {} failed ({}), scraping the page", url, e)
                }
            }
        }

        self.fetch_content(url, url).await
    }
}
