//! Session statistics
//!
//! This module provides the counters returned to the caller at the end of a
//! session, and the mutex-guarded aggregator that concurrent pipeline
//! completions report into.

use crate::pipeline::{PipelineOutcome, PipelineResult};
use crate::url::{normalize_url, NormalizedUrl};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Counters for one session
///
/// Every field is a sum or an append-only list, so merging results in any
/// order gives the same totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// URLs whose pipeline reached the store
    pub processed: usize,

    /// URLs whose pipeline ended in an error
    pub failed: usize,

    /// URLs with unsupported content
    pub skipped: usize,

    /// URLs dropped before a round because the team already had them
    pub already_stored: usize,

    /// Distinct subpages reported by pipelines
    pub discovered: usize,

    /// URLs whose content was extracted, saved or not
    pub content_extracted: usize,

    /// Knowledge items newly written
    pub saved: usize,

    /// Chunks produced for long documents
    pub chunks: usize,

    /// Discovery rounds run
    pub iterations: usize,

    /// `(url, message)` for every failure
    pub errors: Vec<(String, String)>,
}

impl AggregateStats {
    /// Adds another batch's counters to these
    pub fn merge(&mut self, other: AggregateStats) {
        self.processed += other.processed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.already_stored += other.already_stored;
        self.discovered += other.discovered;
        self.content_extracted += other.content_extracted;
        self.saved += other.saved;
        self.chunks += other.chunks;
        self.iterations += other.iterations;
        self.errors.extend(other.errors);
    }

    /// URLs that reached a terminal success or failure
    pub fn attempted(&self) -> usize {
        self.processed + self.failed
    }

    pub fn record_error(&mut self, url: impl Into<String>, message: impl Into<String>) {
        self.errors.push((url.into(), message.into()));
    }
}

impl fmt::Display for AggregateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Harvest Statistics ===")?;
        writeln!(f, "  Rounds: {}", self.iterations)?;
        writeln!(f, "  Processed: {}", self.processed)?;
        writeln!(f, "  Failed: {}", self.failed)?;
        writeln!(f, "  Skipped (unsupported): {}", self.skipped)?;
        writeln!(f, "  Already stored: {}", self.already_stored)?;
        writeln!(f, "  Subpages discovered: {}", self.discovered)?;
        writeln!(f, "  Content extracted: {}", self.content_extracted)?;
        writeln!(f, "  Items saved: {}", self.saved)?;
        writeln!(f, "  Chunks: {}", self.chunks)?;

        let success_rate = if self.attempted() > 0 {
            (self.processed as f64 / self.attempted() as f64) * 100.0
        } else {
            0.0
        };
        write!(f, "Success Rate: {:.1}%", success_rate)?;

        if !self.errors.is_empty() {
            write!(f, "\nErrors ({}):", self.errors.len())?;
            for (url, message) in &self.errors {
                write!(f, "\n  - {}: {}", url, message)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Inner {
    stats: AggregateStats,
    discovered: BTreeSet<NormalizedUrl>,
}

/// Shared sink for pipeline results
///
/// Clones share the same counters. Each subpage is counted once per
/// aggregator no matter how many pipelines report it.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    inner: Arc<Mutex<Inner>>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Folds one pipeline result into the counters
    pub fn record(&self, result: &PipelineResult) {
        let mut inner = self.lock();
        let Inner { stats, discovered } = &mut *inner;

        for subpage in &result.subpages {
            if discovered.insert(normalize_url(subpage)) {
                stats.discovered += 1;
            }
        }

        if result.content_extracted {
            stats.content_extracted += 1;
        }
        stats.chunks += result.chunks;

        match &result.outcome {
            PipelineOutcome::Saved { items } => {
                stats.processed += 1;
                stats.saved += items;
            }
            PipelineOutcome::Rejected => {}
            PipelineOutcome::Skipped { .. } => stats.skipped += 1,
            PipelineOutcome::Failed { .. } => {
                stats.failed += 1;
                let message = result.error().unwrap_or_default();
                stats.record_error(&result.url, message);
            }
        }
    }

    /// Records a URL that never produced a pipeline result
    pub fn record_failure(&self, url: &str, message: impl Into<String>) {
        let mut inner = self.lock();
        inner.stats.failed += 1;
        inner.stats.record_error(url, message);
    }

    /// Current counters
    pub fn snapshot(&self) -> AggregateStats {
        self.lock().stats.clone()
    }

    /// Takes the counters and the discovered set, leaving the aggregator empty
    pub fn take(&self) -> (AggregateStats, BTreeSet<NormalizedUrl>) {
        let inner = std::mem::take(&mut *self.lock());
        (inner.stats, inner.discovered)
    }
}
