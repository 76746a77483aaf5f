//! Storage traits and error types
//!
//! Two narrow interfaces live here: the knowledge store that receives
//! finished items, and the frontier store that holds the URL lists that
//! survive between discovery rounds.

use crate::storage::{FrontierList, KnowledgeItem, UpsertOutcome};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistent home of knowledge items
///
/// `upsert` is idempotent on `(team_id, item.source_url)`: writing the same
/// key twice is a successful no-op reported as [`UpsertOutcome::Duplicate`].
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Stores an item unless the team already has one for its source URL
    async fn upsert(&self, team_id: &str, item: &KnowledgeItem) -> StorageResult<UpsertOutcome>;

    /// True if the team already has an item for `source_url`
    async fn exists(&self, team_id: &str, source_url: &str) -> StorageResult<bool>;

    /// Cheap reachability check run before a session starts
    async fn ping(&self) -> StorageResult<()>;
}

/// Read/write access to the persisted URL lists of one target
///
/// Lists are ordered and compared by normalized URL. A missing list reads
/// as empty.
pub trait FrontierStore: Send + Sync {
    /// Loads every URL of `list`, in stored order
    fn load_set(&self, list: FrontierList) -> StorageResult<Vec<String>>;

    /// Replaces the contents of `list`
    fn save_set(&self, list: FrontierList, urls: &[String]) -> StorageResult<()>;

    /// Appends the URLs not already present; returns how many were added
    fn append_set(&self, list: FrontierList, urls: &[String]) -> StorageResult<usize>;

    /// Deletes `list`; deleting a missing list is not an error
    fn remove(&self, list: FrontierList) -> StorageResult<()>;
}
