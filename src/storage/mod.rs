//! Storage module for knowledge items and persisted URL lists
//!
//! This module handles:
//! - SQLite persistence of knowledge items, idempotent per team and source URL
//! - Newline-delimited URL lists that carry discovery state between rounds

mod frontier_file;
mod schema;
mod sqlite;
mod traits;

pub use frontier_file::FileFrontierStore;
pub use sqlite::SqliteKnowledgeStore;
pub use traits::{FrontierStore, KnowledgeStore, StorageError, StorageResult};

use sha2::{Digest, Sha256};
use std::fmt;

/// A structured knowledge item ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeItem {
    pub source_url: String,
    pub title: String,
    pub content: String,
    pub content_type: String,
    pub author: Option<String>,
    pub user_id: Option<String>,
}

impl KnowledgeItem {
    /// Hex-encoded SHA-256 of the item body
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.content.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// A knowledge item as read back from the store
#[derive(Debug, Clone)]
pub struct StoredItem {
    pub id: i64,
    pub team_id: String,
    pub item: KnowledgeItem,
    pub content_hash: String,
    pub created_at: String,
}

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// The team already had an item for this source URL
    Duplicate,
}

/// Store-wide counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStatistics {
    pub total_items: u64,
    pub total_teams: u64,
}

/// The two URL lists kept per crawl target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontierList {
    /// Every URL known for the target; only ever appended to
    Authoritative,

    /// Subpages discovered during the running session; rewritten each round
    Discovered,
}

impl fmt::Display for FrontierList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authoritative => f.write_str("url list"),
            Self::Discovered => f.write_str("discovered list"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_depends_on_content_only() {
        let a = KnowledgeItem {
            source_url: "https://example.com/a".to_string(),
            title: "A".to_string(),
            content: "same body".to_string(),
            content_type: "blog".to_string(),
            author: None,
            user_id: None,
        };
        let b = KnowledgeItem {
            source_url: "https://example.com/b".to_string(),
            title: "B".to_string(),
            ..a.clone()
        };
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }
}
