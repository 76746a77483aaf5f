//! HTTP fetcher implementation
//!
//! This module handles the HTTP side of crawling:
//! - Building HTTP clients with timeouts and compression
//! - Rotating the client identifier across requests
//! - Classifying failures into typed [`FetchError`]s
//! - Parsing HTML responses into links, title and text

use crate::config::CrawlerConfig;
use crate::crawler::parser::parse_html;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{redirect::Policy, Client, Response};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A fetched and parsed page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value (lower-cased, may be empty)
    pub content_type: String,

    /// Page title, HTML only
    pub title: Option<String>,

    /// Absolute outbound links, HTML only
    pub links: Vec<String>,

    /// Visible text
    pub text: String,
}

impl FetchedPage {
    pub fn is_html(&self) -> bool {
        self.content_type.contains("text/html")
    }
}

/// Transient fetch failures; none of them are retried within a pass
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

impl FetchError {
    /// Maps a reqwest error onto the fetch taxonomy
    pub fn classify(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else if error.is_body() || error.is_decode() {
            Self::Body(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

/// Fetch-and-parse capability used by the crawl loop and the pipeline
#[async_trait]
pub trait FetchAdapter: Send + Sync {
    /// Fetches `url`, returning status, content type, links and text
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Round-robin over a fixed list of client identifiers
#[derive(Debug)]
pub struct UserAgentRotation {
    agents: Vec<String>,
    cursor: AtomicUsize,
}

impl UserAgentRotation {
    pub fn new(agents: Vec<String>) -> Self {
        let agents: Vec<String> = agents
            .into_iter()
            .filter(|agent| !agent.trim().is_empty())
            .collect();
        Self {
            agents,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Returns the next identifier; `None` when the list is empty
    pub fn next_agent(&self) -> Option<&str> {
        if self.agents.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.agents.len();
        Some(self.agents[index].as_str())
    }
}

/// Builds an HTTP client with the given request timeout
///
/// The client follows up to 10 redirects; the identifier is set per request.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a GET with the next rotating identifier
pub(crate) async fn send_get(
    client: &Client,
    agents: &UserAgentRotation,
    url: &str,
) -> Result<Response, FetchError> {
    let mut request = client.get(url);
    if let Some(agent) = agents.next_agent() {
        request = request.header(USER_AGENT, agent);
    }
    request.send().await.map_err(|e| FetchError::classify(&e))
}

/// Lower-cased Content-Type of a response, empty if missing
pub(crate) fn content_type_of(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase()
}

/// reqwest-backed [`FetchAdapter`]
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    agents: UserAgentRotation,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agents: Vec<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(timeout)?,
            agents: UserAgentRotation::new(user_agents),
        })
    }

    pub fn from_config(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.timeout(), config.user_agents.clone())
    }
}

#[async_trait]
impl FetchAdapter for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = send_get(&self.client, &self.agents, url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = content_type_of(&response);
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(page_from_body(final_url, status.as_u16(), content_type, &body))
    }
}

fn page_from_body(final_url: Url, status: u16, content_type: String, body: &str) -> FetchedPage {
    let mut page = FetchedPage {
        final_url: final_url.to_string(),
        status,
        content_type,
        title: None,
        links: Vec::new(),
        text: String::new(),
    };

    if page.is_html() {
        let parsed = parse_html(body, &final_url);
        page.title = parsed.title;
        page.links = parsed.links;
        page.text = parsed.text;
    } else if page.content_type.contains("text/plain") {
        page.text = body.to_string();
    }

    page
}
