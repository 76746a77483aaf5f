//! Cooperative bounded-concurrency executor
//!
//! All runs are polled from the calling task through a `FuturesUnordered`;
//! a semaphore admits at most `max_concurrency` of them past the gate at a
//! time. Dropping the set on cancellation drops every child future.

use crate::executor::{deadline, dedup_batch, BatchExecutor, BatchOutcome, BatchStatus, UrlProcessor};
use crate::output::StatsAggregator;
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

pub struct CooperativeExecutor {
    processor: Arc<dyn UrlProcessor>,
    max_concurrency: usize,
    batch_timeout: Option<Duration>,
}

impl CooperativeExecutor {
    pub fn new(
        processor: Arc<dyn UrlProcessor>,
        max_concurrency: usize,
        batch_timeout: Option<Duration>,
    ) -> Self {
        Self {
            processor,
            max_concurrency: max_concurrency.max(1),
            batch_timeout,
        }
    }
}

#[async_trait]
impl BatchExecutor for CooperativeExecutor {
    async fn execute(&self, urls: Vec<String>, stop: &CancellationToken) -> BatchOutcome {
        let urls = dedup_batch(urls);
        if urls.is_empty() {
            return BatchOutcome::empty();
        }
        let total = urls.len();

        let gate = Arc::new(Semaphore::new(self.max_concurrency));
        let aggregator = StatsAggregator::new();

        let mut in_flight = FuturesUnordered::new();
        for url in urls {
            let gate = Arc::clone(&gate);
            let processor = Arc::clone(&self.processor);
            in_flight.push(async move {
                let _permit = gate.acquire_owned().await.ok();
                processor.process(&url).await
            });
        }

        let timeout = deadline(self.batch_timeout);
        tokio::pin!(timeout);

        let mut finished = 0usize;
        let status = loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break BatchStatus::Cancelled,
                _ = &mut timeout => break BatchStatus::TimedOut,
                next = in_flight.next() => match next {
                    Some(result) => {
                        finished += 1;
                        tracing::debug!("Finished {} ({}/{})", result.url, finished, total);
                        aggregator.record(&result);
                    }
                    None => break BatchStatus::Completed,
                },
            }
        };

        if status.is_interrupted() {
            tracing::warn!(
                "Batch {:?} with {} of {} URLs unfinished",
                status,
                in_flight.len(),
                total
            );
        }
        drop(in_flight);

        BatchOutcome::from_aggregator(&aggregator, status)
    }
}
