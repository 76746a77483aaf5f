//! Knowledge Harvester: organization-scoped web discovery and knowledge extraction
//!
//! This crate crawls the web presence of a target organization, iteratively
//! expands its URL set until no new pages turn up, and pushes every page
//! through an extraction pipeline (extract, validate, transform, persist).
//! The pipeline runs under either a parallel worker pool or a cooperative
//! bounded-concurrency executor; both report into the same aggregate stats.

pub mod config;
pub mod crawler;
pub mod discovery;
pub mod executor;
pub mod extract;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod state;
pub mod storage;
pub mod url;

use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid state transition for {url}: {from} -> {to}")]
    InvalidTransition {
        url: String,
        from: state::PageState,
        to: state::PageState,
    },

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub use config::Config;
pub use discovery::{run_session, SessionOutcome, SessionReport};
pub use output::AggregateStats;
pub use pipeline::{Pipeline, PipelineOutcome, PipelineResult};
pub use state::PageState;
pub use url::{normalize_url, NormalizedUrl};

/// Runs a full extraction session for the configured target
///
/// Wires the HTTP adapters, the SQLite knowledge store and the file-backed
/// frontier together, picks the executor named by `pipeline.processing-mode`
/// and drives the discovery loop to completion or cancellation.
pub async fn harvest(config: Config, stop: CancellationToken) -> Result<SessionOutcome> {
    let config = Arc::new(config);

    let frontier = storage::FileFrontierStore::for_target(
        &config.storage.url_directory,
        &config.target.url,
    )?;
    let store = storage::SqliteKnowledgeStore::new(std::path::Path::new(
        &config.storage.database_path,
    ))?;

    let executor = executor::build_executor(Arc::clone(&config))?;

    Ok(run_session(&config, executor.as_ref(), &frontier, &store, stop).await)
}

/// Loads the configuration at `path` and runs [`harvest`] with it
///
/// The SHA-256 digest of the file is logged so a session can be tied back
/// to the exact config it ran with.
pub async fn harvest_from_file(
    path: &std::path::Path,
    stop: CancellationToken,
) -> Result<SessionOutcome> {
    let (config, hash) = config::load_config_with_hash(path)?;
    tracing::info!(
        "Loaded config {} for {} (sha256 {})",
        path.display(),
        config.target.name,
        hash
    );
    harvest(config, stop).await
}
