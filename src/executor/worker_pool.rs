//! Parallel worker-pool executor
//!
//! Each worker is an OS thread running its own current-thread tokio runtime
//! and its own processor, so no adapter state is shared between workers.
//! URLs go out over a bounded crossbeam channel; results come back over a
//! tokio channel to the coordinating task, which is the only writer of the
//! batch statistics.

use crate::executor::{
    deadline, dedup_batch, BatchExecutor, BatchOutcome, BatchStatus, ProcessorFactory,
};
use crate::output::StatsAggregator;
use crate::pipeline::PipelineResult;
use crate::url::{normalize_url, NormalizedUrl};
use async_trait::async_trait;
use crossbeam_channel::{Receiver, Sender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::runtime::Builder;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// What a worker reports back to the coordinator
enum WorkerMessage {
    Finished(PipelineResult),
    /// The worker could not start and took no URLs
    Unavailable { worker: usize, error: String },
}

pub struct WorkerPoolExecutor {
    factory: Arc<dyn ProcessorFactory>,
    workers: usize,
    batch_timeout: Option<Duration>,
}

impl WorkerPoolExecutor {
    pub fn new(
        factory: Arc<dyn ProcessorFactory>,
        workers: usize,
        batch_timeout: Option<Duration>,
    ) -> Self {
        Self {
            factory,
            workers: workers.max(1),
            batch_timeout,
        }
    }

    fn spawn_worker(
        &self,
        id: usize,
        tasks: Receiver<String>,
        results: UnboundedSender<WorkerMessage>,
        halt: Arc<AtomicBool>,
    ) -> std::io::Result<JoinHandle<()>> {
        let factory = Arc::clone(&self.factory);

        thread::Builder::new()
            .name(format!("harvest-worker-{id}"))
            .spawn(move || {
                let runtime = match Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = results.send(WorkerMessage::Unavailable {
                            worker: id,
                            error: e.to_string(),
                        });
                        return;
                    }
                };
                let processor = match factory.create() {
                    Ok(processor) => processor,
                    Err(e) => {
                        let _ = results.send(WorkerMessage::Unavailable {
                            worker: id,
                            error: e.to_string(),
                        });
                        return;
                    }
                };

                while let Ok(url) = tasks.recv() {
                    if halt.load(Ordering::SeqCst) {
                        break;
                    }
                    let result = runtime.block_on(processor.process(&url));
                    if results.send(WorkerMessage::Finished(result)).is_err() {
                        break;
                    }
                }
                tracing::debug!("Worker {} exiting", id);
            })
    }
}

#[async_trait]
impl BatchExecutor for WorkerPoolExecutor {
    async fn execute(&self, urls: Vec<String>, stop: &CancellationToken) -> BatchOutcome {
        let urls = dedup_batch(urls);
        if urls.is_empty() {
            return BatchOutcome::empty();
        }
        let total = urls.len();

        let (task_tx, task_rx): (Sender<String>, Receiver<String>) =
            crossbeam_channel::bounded(total);
        let mut outstanding: HashMap<NormalizedUrl, String> = HashMap::with_capacity(total);
        for url in urls {
            outstanding.insert(normalize_url(&url), url.clone());
            if task_tx.send(url).is_err() {
                break;
            }
        }
        drop(task_tx);

        let halt = Arc::new(AtomicBool::new(false));
        let (result_tx, mut result_rx): (_, UnboundedReceiver<WorkerMessage>) =
            unbounded_channel();

        let worker_count = self.workers.min(total);
        let mut handles = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            match self.spawn_worker(id, task_rx.clone(), result_tx.clone(), Arc::clone(&halt)) {
                Ok(handle) => handles.push(handle),
                Err(e) => tracing::error!("Failed to spawn worker {}: {}", id, e),
            }
        }
        drop(result_tx);
        tracing::info!("Started {} workers for {} URLs", handles.len(), total);

        let aggregator = StatsAggregator::new();
        let timeout = deadline(self.batch_timeout);
        tokio::pin!(timeout);

        let status = loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break BatchStatus::Cancelled,
                _ = &mut timeout => break BatchStatus::TimedOut,
                message = result_rx.recv() => match message {
                    Some(WorkerMessage::Finished(result)) => {
                        outstanding.remove(&normalize_url(&result.url));
                        tracing::debug!(
                            "Finished {} ({}/{})",
                            result.url,
                            total - outstanding.len(),
                            total
                        );
                        aggregator.record(&result);
                        if outstanding.is_empty() {
                            break BatchStatus::Completed;
                        }
                    }
                    Some(WorkerMessage::Unavailable { worker, error }) => {
                        tracing::error!("Worker {} unavailable: {}", worker, error);
                    }
                    None => {
                        // every worker is gone
                        for url in outstanding.values() {
                            aggregator.record_failure(url, "no worker available to process URL");
                        }
                        outstanding.clear();
                        break BatchStatus::Completed;
                    }
                },
            }
        };

        if status.is_interrupted() {
            halt.store(true, Ordering::SeqCst);
            let mut drained = 0usize;
            while task_rx.try_recv().is_ok() {
                drained += 1;
            }
            tracing::warn!(
                "Batch {:?}: abandoned {} in-flight and {} queued URLs",
                status,
                outstanding.len().saturating_sub(drained),
                drained
            );
        } else {
            let joined = tokio::task::spawn_blocking(move || {
                handles
                    .into_iter()
                    .filter_map(|handle| handle.join().err())
                    .count()
            })
            .await;
            if let Ok(panicked) = joined {
                if panicked > 0 {
                    tracing::warn!("{} workers panicked", panicked);
                }
            }
        }

        BatchOutcome::from_aggregator(&aggregator, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::ScriptedProcessor;
    use crate::executor::{CooperativeExecutor, UrlProcessor};
    use crate::HarvestError;
    use std::sync::atomic::Ordering;

    fn site() -> ScriptedProcessor {
        ScriptedProcessor::new(&[
            ("https://example.com/", &["https://example.com/a", "https://example.com/b"]),
            ("https://example.com/a", &["https://example.com/b", "https://example.com/c"]),
            ("https://example.com/b", &[]),
        ])
    }

    fn batch() -> Vec<String> {
        [
            "https://example.com/",
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/b/",
            "https://example.com/missing",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[tokio::test]
    async fn test_processes_batch_once_per_url() {
        let processor = site();
        let executor = WorkerPoolExecutor::new(processor.factory(), 3, None);

        let outcome = executor.execute(batch(), &CancellationToken::new()).await;

        assert_eq!(outcome.status, BatchStatus::Completed);
        assert_eq!(processor.calls.load(Ordering::SeqCst), 4);
        assert_eq!(outcome.stats.processed, 3);
        assert_eq!(outcome.stats.failed, 1);
        assert_eq!(outcome.stats.errors[0].0, "https://example.com/missing");
        assert_eq!(outcome.discovered.len(), 3);
    }

    #[tokio::test]
    async fn test_matches_cooperative_executor() {
        let pool = WorkerPoolExecutor::new(site().factory(), 4, None)
            .execute(batch(), &CancellationToken::new())
            .await;
        let cooperative = CooperativeExecutor::new(Arc::new(site()), 4, None)
            .execute(batch(), &CancellationToken::new())
            .await;

        assert_eq!(pool.stats.attempted(), cooperative.stats.attempted());
        assert_eq!(pool.stats.discovered, cooperative.stats.discovered);
        assert_eq!(pool.discovered, cooperative.discovered);
    }

    #[tokio::test]
    async fn test_unavailable_workers_fail_their_urls() {
        let factory: Arc<dyn ProcessorFactory> = Arc::new(|| {
            Err::<Box<dyn UrlProcessor>, _>(HarvestError::Worker("no database".to_string()))
        });
        let executor = WorkerPoolExecutor::new(factory, 2, None);

        let outcome = executor.execute(batch(), &CancellationToken::new()).await;

        assert_eq!(outcome.status, BatchStatus::Completed);
        assert_eq!(outcome.stats.failed, 4);
        assert_eq!(outcome.stats.processed, 0);
    }

    #[tokio::test]
    async fn test_stop_does_not_wait_for_workers() {
        let processor = ScriptedProcessor::slow(Duration::from_millis(500));
        let executor = WorkerPoolExecutor::new(processor.factory(), 2, None);
        let stop = CancellationToken::new();

        let trigger = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let urls = (0..10).map(|i| format!("https://example.com/{}", i)).collect();
        let started = std::time::Instant::now();
        let outcome = executor.execute(urls, &stop).await;

        assert_eq!(outcome.status, BatchStatus::Cancelled);
        assert!(started.elapsed() < Duration::from_millis(450));
        assert_eq!(outcome.stats.attempted(), 0);
    }

    #[tokio::test]
    async fn test_batch_timeout() {
        let processor = ScriptedProcessor::slow(Duration::from_millis(500));
        let executor =
            WorkerPoolExecutor::new(processor.factory(), 1, Some(Duration::from_millis(20)));

        let outcome = executor
            .execute(vec!["https://example.com/x".to_string()], &CancellationToken::new())
            .await;
        assert_eq!(outcome.status, BatchStatus::TimedOut);
    }
}
