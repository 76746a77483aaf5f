//! State tracking for a crawl pass
//!
//! # Components
//!
//! - `PageState`: per-URL lifecycle (pending, fetching, expanded)
//! - `FrontierState`: visited set, work queue and discovered set

mod frontier;
mod page_state;

pub use frontier::{Dequeued, FrontierState};
pub use page_state::PageState;
