//! Session entry point

use crate::config::Config;
use crate::discovery::{run_discovery, DiscoveryOptions, SessionReport};
use crate::executor::BatchExecutor;
use crate::output::AggregateStats;
use crate::storage::{FrontierList, FrontierStore, KnowledgeStore};
use tokio_util::sync::CancellationToken;

/// How a session ended
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// The URL list was missing or empty; nothing ran
    NoWork { reason: String },

    /// A collaborator was unavailable before any URL was processed
    Failed {
        reason: String,
        stats: AggregateStats,
    },

    /// Rounds ran, possibly with per-URL failures or an early stop
    Completed(SessionReport),
}

impl SessionOutcome {
    pub fn stats(&self) -> Option<&AggregateStats> {
        match self {
            Self::NoWork { .. } => None,
            Self::Failed { stats, .. } => Some(stats),
            Self::Completed(report) => Some(&report.stats),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Loads the target's URL list and runs discovery over it
///
/// Per-URL problems never end the session; they are returned in the stats.
pub async fn run_session(
    config: &Config,
    executor: &dyn BatchExecutor,
    frontier: &dyn FrontierStore,
    store: &dyn KnowledgeStore,
    stop: CancellationToken,
) -> SessionOutcome {
    let urls = match frontier.load_set(FrontierList::Authoritative) {
        Ok(urls) => urls,
        Err(e) => {
            tracing::error!("Failed to read the {}: {}", FrontierList::Authoritative, e);
            return SessionOutcome::Failed {
                reason: format!("failed to read the {}: {}", FrontierList::Authoritative, e),
                stats: AggregateStats::default(),
            };
        }
    };

    if urls.is_empty() {
        tracing::warn!("No URLs to process for {}", config.target.name);
        return SessionOutcome::NoWork {
            reason: format!("no URLs to process for {}", config.target.name),
        };
    }

    if let Err(e) = store.ping().await {
        tracing::error!("Knowledge store unavailable: {}", e);
        return SessionOutcome::Failed {
            reason: format!("knowledge store unavailable: {}", e),
            stats: AggregateStats::default(),
        };
    }

    tracing::info!(
        "Starting session for {} with {} URLs",
        config.target.name,
        urls.len()
    );

    let options = DiscoveryOptions::from_config(config);
    let report = run_discovery(urls, executor, frontier, store, &options, &stop).await;

    tracing::info!(
        "Session for {} finished ({:?}) after {} rounds: {} processed, {} failed, {} saved",
        config.target.name,
        report.status,
        report.rounds.len(),
        report.stats.processed,
        report.stats.failed,
        report.stats.saved
    );

    SessionOutcome::Completed(report)
}
