use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for a harvest session
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
}

/// The organization being harvested
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Display name, also consulted by the skip-word exception
    pub name: String,

    /// Home page of the organization; the crawl starts here
    pub url: String,

    /// Team that owns every stored knowledge item
    #[serde(rename = "team-id")]
    pub team_id: String,

    /// Optional user attribution for stored items
    #[serde(rename = "user-id", default)]
    pub user_id: String,
}

/// Crawl loop behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Page quota for a single crawl pass
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Fixed delay between requests (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra skip words, merged with the built-in list
    #[serde(rename = "skip-words", default)]
    pub skip_words: Vec<String>,

    /// Client identifiers rotated across requests
    #[serde(rename = "user-agents", default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
            skip_words: Vec::new(),
            user_agents: default_user_agents(),
        }
    }
}

/// How a batch of URLs is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ProcessingMode {
    /// Isolated OS threads, each with its own runtime and adapters
    #[serde(rename = "worker-pool")]
    WorkerPool,

    /// One task interleaving up to N pipelines behind a semaphore
    #[serde(rename = "cooperative")]
    Cooperative,
}

/// Extraction pipeline and executor settings
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(rename = "chunk-size", default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(rename = "chunk-overlap", default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// How far back from a cut point to look for a sentence boundary
    #[serde(rename = "boundary-window", default = "default_boundary_window")]
    pub boundary_window: usize,

    /// Extracted text is truncated to this many characters
    #[serde(rename = "max-content-length", default = "default_max_content_length")]
    pub max_content_length: usize,

    #[serde(rename = "min-content-length", default = "default_min_content_length")]
    pub min_content_length: usize,

    #[serde(rename = "min-title-length", default = "default_min_title_length")]
    pub min_title_length: usize,

    #[serde(rename = "processing-mode", default = "default_processing_mode")]
    pub processing_mode: ProcessingMode,

    /// Worker count or semaphore permits, depending on the mode
    #[serde(rename = "max-concurrency", default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Abandon a batch after this many seconds
    #[serde(rename = "batch-timeout-secs", default)]
    pub batch_timeout_secs: Option<u64>,

    /// Keep discovering until a round finds nothing new
    #[serde(default = "default_true")]
    pub iterative: bool,

    /// In single-pass mode, append discoveries to the URL list
    #[serde(rename = "save-discovered-urls", default = "default_true")]
    pub save_discovered_urls: bool,

    /// Drop URLs the team already has stored before each round
    #[serde(rename = "skip-existing-urls", default)]
    pub skip_existing_urls: bool,
}

impl PipelineConfig {
    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            boundary_window: default_boundary_window(),
            max_content_length: default_max_content_length(),
            min_content_length: default_min_content_length(),
            min_title_length: default_min_title_length(),
            processing_mode: default_processing_mode(),
            max_concurrency: default_max_concurrency(),
            batch_timeout_secs: None,
            iterative: true,
            save_discovered_urls: true,
            skip_existing_urls: false,
        }
    }
}

/// Where knowledge items and URL lists live
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory holding the per-target URL lists
    #[serde(rename = "url-directory", default = "default_url_directory")]
    pub url_directory: String,
}

fn default_max_pages() -> usize {
    50
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
    ]
}

fn default_chunk_size() -> usize {
    10_000
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_boundary_window() -> usize {
    200
}

fn default_max_content_length() -> usize {
    100_000
}

fn default_min_content_length() -> usize {
    100
}

fn default_min_title_length() -> usize {
    5
}

fn default_processing_mode() -> ProcessingMode {
    ProcessingMode::WorkerPool
}

fn default_max_concurrency() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_url_directory() -> String {
    "data/urls".to_string()
}
