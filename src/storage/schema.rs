//! Database schema for the knowledge store

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per (team, source page)
CREATE TABLE IF NOT EXISTS knowledge_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    team_id TEXT NOT NULL,
    source_url TEXT NOT NULL,
    source_key TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    content_type TEXT NOT NULL,
    author TEXT,
    user_id TEXT,
    content_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(team_id, source_key)
);

CREATE INDEX IF NOT EXISTS idx_items_team ON knowledge_items(team_id);
CREATE INDEX IF NOT EXISTS idx_items_hash ON knowledge_items(content_hash);
"#;

/// Creates all tables and indexes if they do not exist yet
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
