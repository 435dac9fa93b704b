//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Search database.

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Crawled documents, one row per normalized URL
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    text TEXT NOT NULL,
    snippet TEXT NOT NULL,
    length INTEGER NOT NULL,
    depth INTEGER NOT NULL,
    parent_url TEXT,
    outbound_links TEXT NOT NULL,
    crawled_at TEXT NOT NULL
);

-- Resumable crawl jobs; frontier, visited set, node log and per-host
-- robots/politeness state are JSON blobs
CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    start_url TEXT NOT NULL,
    max_depth INTEGER NOT NULL,
    max_pages INTEGER NOT NULL,
    scope TEXT NOT NULL,
    status TEXT NOT NULL,
    queue TEXT NOT NULL,
    visited TEXT NOT NULL,
    nodes TEXT NOT NULL,
    stats TEXT NOT NULL,
    hosts TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
"#;

/// Creates all tables and indexes if they do not exist yet
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
