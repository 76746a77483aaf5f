//! Batch executors for the extraction pipeline
//!
//! The pipeline is reached only through [`UrlProcessor`]. Two executors run
//! a batch of URLs through it under different scheduling models and report
//! the same [`BatchOutcome`]:
//!
//! - [`WorkerPoolExecutor`]: OS threads, each with its own runtime and its
//!   own processor built by a [`ProcessorFactory`]
//! - [`CooperativeExecutor`]: one task interleaving up to N runs of a
//!   shared processor behind a semaphore

mod cooperative;
mod worker_pool;

pub use cooperative::CooperativeExecutor;
pub use worker_pool::WorkerPoolExecutor;

use crate::config::{Config, ProcessingMode};
use crate::output::{AggregateStats, StatsAggregator};
use crate::pipeline::{HttpPipelineFactory, Pipeline, PipelineResult};
use crate::url::{normalize_url, NormalizedUrl};
use crate::HarvestError;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs the whole pipeline for one URL
#[async_trait]
pub trait UrlProcessor: Send + Sync {
    async fn process(&self, url: &str) -> PipelineResult;
}

/// Builds one processor per isolated worker
pub trait ProcessorFactory: Send + Sync + 'static {
    fn create(&self) -> Result<Box<dyn UrlProcessor>, HarvestError>;
}

impl<F> ProcessorFactory for F
where
    F: Fn() -> Result<Box<dyn UrlProcessor>, HarvestError> + Send + Sync + 'static,
{
    fn create(&self) -> Result<Box<dyn UrlProcessor>, HarvestError> {
        self()
    }
}

/// How a batch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Completed,
    /// The stop token fired; in-flight work was abandoned
    Cancelled,
    /// The batch timeout elapsed; in-flight work was abandoned
    TimedOut,
}

impl BatchStatus {
    pub fn is_interrupted(&self) -> bool {
        !matches!(self, Self::Completed)
    }
}

/// Stats and subpages gathered from one batch
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub stats: AggregateStats,
    pub discovered: BTreeSet<NormalizedUrl>,
    pub status: BatchStatus,
}

impl BatchOutcome {
    fn from_aggregator(aggregator: &StatsAggregator, status: BatchStatus) -> Self {
        let (stats, discovered) = aggregator.take();
        Self {
            stats,
            discovered,
            status,
        }
    }

    fn empty() -> Self {
        Self {
            stats: AggregateStats::default(),
            discovered: BTreeSet::new(),
            status: BatchStatus::Completed,
        }
    }
}

/// Runs a batch of URLs through the pipeline
///
/// Each distinct URL (by normalized form) is processed at most once per
/// call. Firing `stop` abandons in-flight work and returns what has been
/// aggregated so far.
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    async fn execute(&self, urls: Vec<String>, stop: &CancellationToken) -> BatchOutcome;
}

/// Drops repeated URLs, keeping the first spelling of each normalized form
pub fn dedup_batch(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(normalize_url(url)))
        .collect()
}

/// Resolves after `timeout`, or never when there is none
async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}

/// Builds the executor selected by `pipeline.processing-mode`
pub fn build_executor(config: Arc<Config>) -> Result<Box<dyn BatchExecutor>, HarvestError> {
    let concurrency = config.pipeline.max_concurrency;
    let timeout = config.pipeline.batch_timeout();

    match config.pipeline.processing_mode {
        ProcessingMode::WorkerPool => {
            tracing::info!("Using worker pool with {} workers", concurrency);
            let factory = HttpPipelineFactory::new(Arc::clone(&config));
            Ok(Box::new(WorkerPoolExecutor::new(
                Arc::new(factory),
                concurrency,
                timeout,
            )))
        }
        ProcessingMode::Cooperative => {
            tracing::info!("Using cooperative executor with {} permits", concurrency);
            let pipeline = Pipeline::from_config(&config)?;
            Ok(Box::new(CooperativeExecutor::new(
                Arc::new(pipeline),
                concurrency,
                timeout,
            )))
        }
    }
}
