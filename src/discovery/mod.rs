//! Iterative discovery: run batches until no new URL turns up
//!
//! Each round runs the executor over the current URL set, collects the
//! subpages the pipelines reported and keeps only those that are neither in
//! the original list nor already processed this session. Those become the
//! next round. Between rounds the running union of discoveries is written
//! to the discovered list, and each round's new URLs are appended to the
//! authoritative list, which therefore only ever grows.

mod session;

pub use session::{run_session, SessionOutcome};

use crate::config::Config;
use crate::executor::{dedup_batch, BatchExecutor, BatchStatus};
use crate::output::AggregateStats;
use crate::storage::{FrontierList, FrontierStore, KnowledgeStore};
use crate::url::{normalize_url, NormalizedUrl};
use std::collections::{BTreeSet, HashSet};
use tokio_util::sync::CancellationToken;

/// One executed round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRound {
    pub round_number: usize,
    pub input_urls: Vec<String>,

    /// Every subpage reported this round, known or not
    pub newly_discovered: Vec<String>,

    /// The subset that was never seen before; input of the following round
    pub next_round: Vec<String>,
}

/// Loop settings
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub team_id: String,

    /// Keep running rounds until nothing new is found
    pub iterative: bool,

    /// In single-pass mode, still append the discoveries to the URL list
    pub save_discovered_urls: bool,

    /// Drop URLs the team already has before each round
    pub skip_existing_urls: bool,

    /// Hard stop on the number of rounds
    pub max_rounds: Option<usize>,
}

impl DiscoveryOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            team_id: config.target.team_id.clone(),
            iterative: config.pipeline.iterative,
            save_discovered_urls: config.pipeline.save_discovered_urls,
            skip_existing_urls: config.pipeline.skip_existing_urls,
            max_rounds: None,
        }
    }

    fn appends_discoveries(&self) -> bool {
        self.iterative || self.save_discovered_urls
    }
}

/// Result of a session that ran
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub stats: AggregateStats,
    pub rounds: Vec<DiscoveryRound>,
    pub status: BatchStatus,
}

fn to_strings<'a>(urls: impl IntoIterator<Item = &'a NormalizedUrl>) -> Vec<String> {
    urls.into_iter().map(|u| u.as_str().to_string()).collect()
}

/// Removes URLs the team already has stored, counting them as skipped
///
/// Dropped URLs join `processed` so a later round does not check them again.
async fn drop_stored(
    urls: Vec<String>,
    store: &dyn KnowledgeStore,
    team_id: &str,
    stats: &mut AggregateStats,
    processed: &mut HashSet<NormalizedUrl>,
) -> Vec<String> {
    let mut kept = Vec::with_capacity(urls.len());
    for url in urls {
        match store.exists(team_id, &url).await {
            Ok(true) => {
                stats.already_stored += 1;
                processed.insert(normalize_url(&url));
            }
            Ok(false) => kept.push(url),
            Err(e) => {
                tracing::warn!("Could not check whether {} is stored: {}", url, e);
                kept.push(url);
            }
        }
    }
    kept
}

/// Runs rounds from `initial` until a fixed point, cancellation or timeout
///
/// No URL is processed twice in one call. `stats.discovered` in the
/// returned report counts distinct subpages over the whole session.
pub async fn run_discovery(
    initial: Vec<String>,
    executor: &dyn BatchExecutor,
    frontier: &dyn FrontierStore,
    store: &dyn KnowledgeStore,
    options: &DiscoveryOptions,
    stop: &CancellationToken,
) -> SessionReport {
    let original: HashSet<NormalizedUrl> = initial.iter().map(|u| normalize_url(u)).collect();
    let mut processed: HashSet<NormalizedUrl> = HashSet::new();
    let mut cumulative: BTreeSet<NormalizedUrl> = BTreeSet::new();
    let mut stats = AggregateStats::default();
    let mut rounds = Vec::new();
    let mut status = BatchStatus::Completed;

    let mut current = dedup_batch(initial);

    loop {
        if stop.is_cancelled() {
            status = BatchStatus::Cancelled;
            break;
        }

        current.retain(|url| !processed.contains(&normalize_url(url)));
        if options.skip_existing_urls {
            let before = current.len();
            let checked = std::mem::take(&mut current);
            current =
                drop_stored(checked, store, &options.team_id, &mut stats, &mut processed).await;
            tracing::debug!("Skipped {} stored URLs", before - current.len());
        }
        if current.is_empty() {
            break;
        }
        processed.extend(current.iter().map(|u| normalize_url(u)));

        let round_number = rounds.len() + 1;
        tracing::info!("Round {}: processing {} URLs", round_number, current.len());

        let outcome = executor.execute(current.clone(), stop).await;
        stats.merge(outcome.stats);
        stats.iterations += 1;

        let next: Vec<String> = to_strings(
            outcome
                .discovered
                .iter()
                .filter(|u| !original.contains(*u) && !processed.contains(*u)),
        );
        cumulative.extend(outcome.discovered.iter().cloned());

        if let Err(e) = frontier.save_set(FrontierList::Discovered, &to_strings(&cumulative)) {
            tracing::error!("Failed to save {}: {}", FrontierList::Discovered, e);
            stats.record_error(FrontierList::Discovered.to_string(), e.to_string());
        }
        if options.appends_discoveries() && !next.is_empty() {
            match frontier.append_set(FrontierList::Authoritative, &next) {
                Ok(added) => tracing::info!("Added {} URLs to the {}", added, FrontierList::Authoritative),
                Err(e) => {
                    tracing::error!("Failed to append to {}: {}", FrontierList::Authoritative, e);
                    stats.record_error(FrontierList::Authoritative.to_string(), e.to_string());
                }
            }
        }

        tracing::info!(
            "Round {} done: {} subpages reported, {} new",
            round_number,
            outcome.discovered.len(),
            next.len()
        );
        rounds.push(DiscoveryRound {
            round_number,
            input_urls: std::mem::take(&mut current),
            newly_discovered: to_strings(&outcome.discovered),
            next_round: next.clone(),
        });

        if outcome.status.is_interrupted() {
            status = outcome.status;
            break;
        }
        if next.is_empty() {
            tracing::info!("No new URLs after round {}, stopping", round_number);
            break;
        }
        if !options.iterative {
            break;
        }
        if options.max_rounds.is_some_and(|max| round_number >= max) {
            tracing::warn!("Reached the round limit of {}", round_number);
            break;
        }
        current = next;
    }

    stats.discovered = cumulative.len();

    if status == BatchStatus::Completed {
        if let Err(e) = frontier.remove(FrontierList::Discovered) {
            tracing::warn!("Failed to remove {}: {}", FrontierList::Discovered, e);
            stats.record_error(FrontierList::Discovered.to_string(), e.to_string());
        }
    }

    SessionReport {
        stats,
        rounds,
        status,
    }
}
