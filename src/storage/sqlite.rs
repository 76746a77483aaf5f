//! SQLite implementation of the knowledge store

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{KnowledgeStore, StorageError, StorageResult};
use crate::storage::{KnowledgeItem, StoreStatistics, StoredItem, UpsertOutcome};
use crate::url::normalize_url;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

const ITEM_COLUMNS: &str =
    "id, team_id, source_url, title, content, content_type, author, user_id, content_hash, created_at";

/// SQLite storage backend
///
/// Items are keyed by team and by the normalized source URL, so
/// `/about` and `/about/` are the same item.
pub struct SqliteKnowledgeStore {
    conn: Mutex<Connection>,
}

impl SqliteKnowledgeStore {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database private to this instance
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_item(&self, team_id: &str, item: &KnowledgeItem) -> StorageResult<UpsertOutcome> {
        let changed = self.conn().execute(
            "INSERT OR IGNORE INTO knowledge_items
                (team_id, source_url, source_key, title, content, content_type, author, user_id, content_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                team_id,
                item.source_url,
                normalize_url(&item.source_url).as_str(),
                item.title,
                item.content,
                item.content_type,
                item.author,
                item.user_id,
                item.content_hash(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(if changed == 0 {
            UpsertOutcome::Duplicate
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn item_exists(&self, team_id: &str, source_url: &str) -> StorageResult<bool> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM knowledge_items WHERE team_id = ?1 AND source_key = ?2",
                params![team_id, normalize_url(source_url).as_str()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// All items of a team, oldest first
    pub fn items_for_team(&self, team_id: &str) -> StorageResult<Vec<StoredItem>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM knowledge_items WHERE team_id = ?1 ORDER BY id",
            ITEM_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![team_id], row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Case-insensitive substring search over title and content
    pub fn search(&self, team_id: &str, query: &str) -> StorageResult<Vec<StoredItem>> {
        let pattern = format!("%{}%", query.to_lowercase());
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM knowledge_items
             WHERE team_id = ?1 AND (lower(title) LIKE ?2 OR lower(content) LIKE ?2)
             ORDER BY id",
            ITEM_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![team_id, pattern], row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Total items and distinct teams
    pub fn statistics(&self) -> StorageResult<StoreStatistics> {
        let (items, teams): (i64, i64) = self.conn().query_row(
            "SELECT COUNT(*), COUNT(DISTINCT team_id) FROM knowledge_items",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(StoreStatistics {
            total_items: u64::try_from(items).unwrap_or(0),
            total_teams: u64::try_from(teams).unwrap_or(0),
        })
    }
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<StoredItem> {
    Ok(StoredItem {
        id: row.get(0)?,
        team_id: row.get(1)?,
        item: KnowledgeItem {
            source_url: row.get(2)?,
            title: row.get(3)?,
            content: row.get(4)?,
            content_type: row.get(5)?,
            author: row.get(6)?,
            user_id: row.get(7)?,
        },
        content_hash: row.get(8)?,
        created_at: row.get(9)?,
    })
}

#[async_trait]
impl KnowledgeStore for SqliteKnowledgeStore {
    async fn upsert(&self, team_id: &str, item: &KnowledgeItem) -> StorageResult<UpsertOutcome> {
        if team_id.is_empty() {
            return Err(StorageError::Database(
                "team_id cannot be empty".to_string(),
            ));
        }
        self.insert_item(team_id, item)
    }

    async fn exists(&self, team_id: &str, source_url: &str) -> StorageResult<bool> {
        self.item_exists(team_id, source_url)
    }

    async fn ping(&self) -> StorageResult<()> {
        self.conn()
            .query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}
