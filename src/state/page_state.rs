/// Page state definitions for a single crawl pass
use std::fmt;

/// Lifecycle of a URL within one crawl pass
///
/// `Pending -> Fetching` on dequeue, `Fetching -> Expanded` once the fetch
/// adapter returns, whether it succeeded or not. Expanded URLs are never
/// re-queued within the same pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Queued, not yet dequeued
    Pending,

    /// Dequeued and handed to the fetch adapter
    Fetching,

    /// Fetch finished; links (if any) have been considered
    Expanded,
}

impl PageState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expanded)
    }

    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching) | (Self::Fetching, Self::Expanded)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Expanded => "expanded",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
