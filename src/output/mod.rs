//! Output module for session statistics
//!
//! This module handles:
//! - Aggregating pipeline results from concurrent workers
//! - Rendering the end-of-session summary

pub mod stats;

pub use stats::{AggregateStats, StatsAggregator};
