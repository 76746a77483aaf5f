//! In-memory frontier for one crawl pass

use crate::state::PageState;
use crate::url::{normalize_url, NormalizedUrl};
use crate::HarvestError;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// A URL handed out by the frontier, now in the `Fetching` state
#[derive(Debug, Clone)]
pub struct Dequeued {
    /// The URL as it was discovered
    pub url: String,
    pub normalized: NormalizedUrl,
}

/// Visited set, FIFO queue and discovered set of a single pass
///
/// Every membership check goes through [`normalize_url`], so two spellings
/// of the same page are one entry.
#[derive(Debug, Default)]
pub struct FrontierState {
    visited: HashSet<NormalizedUrl>,
    queue: VecDeque<String>,
    queued: HashSet<NormalizedUrl>,
    discovered: BTreeSet<NormalizedUrl>,
    states: HashMap<NormalizedUrl, PageState>,
}

impl FrontierState {
    /// Creates a frontier seeded with one start URL
    pub fn new(start_url: &str) -> Self {
        let mut frontier = Self::default();
        frontier.push(start_url);
        frontier
    }

    fn push(&mut self, url: &str) -> bool {
        let normalized = normalize_url(url);
        if self.visited.contains(&normalized) || self.queued.contains(&normalized) {
            return false;
        }
        self.queue.push_back(url.to_string());
        self.states.insert(normalized.clone(), PageState::Pending);
        self.queued.insert(normalized);
        true
    }

    /// Queues a discovered link unless it was already visited or queued
    ///
    /// Returns true if the link was queued.
    pub fn enqueue(&mut self, url: &str) -> bool {
        if !self.push(url) {
            return false;
        }
        self.discovered.insert(normalize_url(url));
        true
    }

    /// True if the URL (under its normalized form) was visited or queued
    pub fn is_known(&self, url: &str) -> bool {
        let normalized = normalize_url(url);
        self.visited.contains(&normalized) || self.queued.contains(&normalized)
    }

    /// Pops the next unvisited URL and moves it to `Fetching`
    pub fn dequeue(&mut self) -> Result<Option<Dequeued>, HarvestError> {
        while let Some(url) = self.queue.pop_front() {
            let normalized = normalize_url(&url);
            if !self.visited.insert(normalized.clone()) {
                continue;
            }
            self.transition(&normalized, PageState::Fetching)?;
            return Ok(Some(Dequeued { url, normalized }));
        }
        Ok(None)
    }

    /// Marks a fetched URL as expanded
    pub fn mark_expanded(&mut self, normalized: &NormalizedUrl) -> Result<(), HarvestError> {
        self.transition(normalized, PageState::Expanded)
    }

    fn transition(&mut self, normalized: &NormalizedUrl, to: PageState) -> Result<(), HarvestError> {
        let from = self
            .states
            .get(normalized)
            .copied()
            .unwrap_or(PageState::Pending);

        if !from.can_transition_to(to) {
            return Err(HarvestError::InvalidTransition {
                url: normalized.to_string(),
                from,
                to,
            });
        }

        self.states.insert(normalized.clone(), to);
        Ok(())
    }

    pub fn state_of(&self, url: &str) -> Option<PageState> {
        self.states.get(&normalize_url(url)).copied()
    }

    pub fn visited(&self) -> &HashSet<NormalizedUrl> {
        &self.visited
    }

    pub fn discovered(&self) -> &BTreeSet<NormalizedUrl> {
        &self.discovered
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_pending_then_fetching() {
        let mut frontier = FrontierState::new("https://example.com/");
        assert_eq!(
            frontier.state_of("https://example.com/"),
            Some(PageState::Pending)
        );

        let next = frontier.dequeue().unwrap().unwrap();
        assert_eq!(next.url, "https://example.com/");
        assert_eq!(
            frontier.state_of("https://example.com"),
            Some(PageState::Fetching)
        );

        frontier.mark_expanded(&next.normalized).unwrap();
        assert_eq!(
            frontier.state_of("https://example.com/"),
            Some(PageState::Expanded)
        );
    }

    #[test]
    fn test_equivalent_urls_queued_once() {
        let mut frontier = FrontierState::new("https://example.com/");
        assert!(frontier.enqueue("https://example.com/about"));
        assert!(!frontier.enqueue("https://example.com/about/"));
        assert!(!frontier.enqueue("HTTPS://EXAMPLE.COM/about"));
        assert_eq!(frontier.queue_len(), 2);
        assert_eq!(frontier.discovered().len(), 1);
    }

    #[test]
    fn test_visited_urls_not_requeued() {
        let mut frontier = FrontierState::new("https://example.com/");
        let root = frontier.dequeue().unwrap().unwrap();
        frontier.mark_expanded(&root.normalized).unwrap();

        assert!(!frontier.enqueue("https://example.com"));
        assert!(frontier.is_known("https://example.com/"));
        assert!(frontier.dequeue().unwrap().is_none());
    }

    #[test]
    fn test_expanding_twice_is_rejected() {
        let mut frontier = FrontierState::new("https://example.com/");
        let root = frontier.dequeue().unwrap().unwrap();
        frontier.mark_expanded(&root.normalized).unwrap();

        let err = frontier.mark_expanded(&root.normalized).unwrap_err();
        assert!(matches!(err, HarvestError::InvalidTransition { .. }));
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = FrontierState::new("https://example.com/");
        frontier.enqueue("https://example.com/a");
        frontier.enqueue("https://example.com/b");

        let order: Vec<String> = std::iter::from_fn(|| frontier.dequeue().unwrap())
            .map(|d| d.url)
            .collect();
        assert_eq!(
            order,
            vec![
                "https://example.com/",
                "https://example.com/a",
                "https://example.com/b"
            ]
        );
    }
}
