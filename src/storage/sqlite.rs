//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the document and
//! job store traits.

use crate::state::{CrawlJob, JobStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{DocumentStore, JobStore, StorageError, StorageResult};
use crate::storage::{Document, DocumentFilter};
use crate::url::Scope;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend
///
/// The connection sits behind a mutex so one instance can be shared between
/// the crawl controller and the search engine.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens or creates the database file and initializes the schema
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

/// Timestamps are stored as fixed-width RFC 3339 strings so that SQL string
/// comparison orders them chronologically.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::Database(format!("Invalid timestamp {}: {}", raw, e)))
}

/// Raw columns of a `documents` row before JSON/timestamp decoding
struct DocumentRow {
    url: String,
    title: String,
    text: String,
    snippet: String,
    length: i64,
    depth: i64,
    parent_url: Option<String>,
    outbound_links: String,
    crawled_at: String,
}

impl DocumentRow {
    fn into_document(self) -> StorageResult<Document> {
        Ok(Document {
            url: self.url,
            title: self.title,
            text: self.text,
            snippet: self.snippet,
            length: self.length.max(0) as usize,
            depth: self.depth.max(0) as u32,
            parent_url: self.parent_url,
            outbound_links: serde_json::from_str(&self.outbound_links)?,
            crawled_at: parse_timestamp(&self.crawled_at)?,
        })
    }
}

/// Raw columns of a `jobs` row
struct JobRow {
    id: String,
    start_url: String,
    max_depth: i64,
    max_pages: i64,
    scope: String,
    status: String,
    queue: String,
    visited: String,
    nodes: String,
    stats: String,
    hosts: String,
    created_at: String,
    updated_at: String,
}

impl JobRow {
    fn into_job(self) -> StorageResult<CrawlJob> {
        let status = JobStatus::from_db_string(&self.status)
            .ok_or_else(|| StorageError::Database(format!("Unknown job status: {}", self.status)))?;
        let scope: Scope = self
            .scope
            .parse()
            .map_err(|e| StorageError::Database(format!("{}", e)))?;

        Ok(CrawlJob {
            id: self.id,
            start_url: self.start_url,
            max_depth: self.max_depth.max(0) as u32,
            max_pages: self.max_pages.max(0) as usize,
            scope,
            status,
            queue: serde_json::from_str(&self.queue)?,
            visited: serde_json::from_str(&self.visited)?,
            nodes: serde_json::from_str(&self.nodes)?,
            stats: serde_json::from_str(&self.stats)?,
            hosts: serde_json::from_str(&self.hosts)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

impl DocumentStore for SqliteStorage {
    fn upsert_if_absent(&self, doc: &Document) -> StorageResult<bool> {
        let links = serde_json::to_string(&doc.outbound_links)?;
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO documents
             (url, title, text, snippet, length, depth, parent_url, outbound_links, crawled_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                doc.url,
                doc.title,
                doc.text,
                doc.snippet,
                doc.length as i64,
                doc.depth as i64,
                doc.parent_url,
                links,
                format_timestamp(&doc.crawled_at),
            ],
        )?;
        Ok(inserted > 0)
    }

    fn find_all(&self, filter: &DocumentFilter) -> StorageResult<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT url, title, text, snippet, length, depth, parent_url, outbound_links, crawled_at
             FROM documents
             WHERE ?1 IS NULL OR substr(url, 1, length(?1)) = ?1
             ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![filter.url_prefix], |row| {
                Ok(DocumentRow {
                    url: row.get(0)?,
                    title: row.get(1)?,
                    text: row.get(2)?,
                    snippet: row.get(3)?,
                    length: row.get(4)?,
                    depth: row.get(5)?,
                    parent_url: row.get(6)?,
                    outbound_links: row.get(7)?,
                    crawled_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(DocumentRow::into_document).collect()
    }

    fn count(&self, filter: &DocumentFilter) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE ?1 IS NULL OR substr(url, 1, length(?1)) = ?1",
            params![filter.url_prefix],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

impl JobStore for SqliteStorage {
    fn insert_job(&self, job: &CrawlJob) -> StorageResult<()> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO jobs
             (id, start_url, max_depth, max_pages, scope, status, queue, visited, nodes, stats, hosts, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                job.id,
                job.start_url,
                job.max_depth as i64,
                job.max_pages as i64,
                job.scope.as_str(),
                job.status.to_db_string(),
                serde_json::to_string(&job.queue)?,
                serde_json::to_string(&job.visited)?,
                serde_json::to_string(&job.nodes)?,
                serde_json::to_string(&job.stats)?,
                serde_json::to_string(&job.hosts)?,
                format_timestamp(&job.created_at),
                format_timestamp(&job.updated_at),
            ],
        )?;

        if inserted == 0 {
            return Err(StorageError::DuplicateJob(job.id.clone()));
        }
        Ok(())
    }

    fn get_job(&self, id: &str) -> StorageResult<Option<CrawlJob>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, start_url, max_depth, max_pages, scope, status, queue, visited, nodes, stats, hosts, created_at, updated_at
             FROM jobs WHERE id = ?1",
        )?;

        let row = stmt
            .query_row(params![id], |row| {
                Ok(JobRow {
                    id: row.get(0)?,
                    start_url: row.get(1)?,
                    max_depth: row.get(2)?,
                    max_pages: row.get(3)?,
                    scope: row.get(4)?,
                    status: row.get(5)?,
                    queue: row.get(6)?,
                    visited: row.get(7)?,
                    nodes: row.get(8)?,
                    stats: row.get(9)?,
                    hosts: row.get(10)?,
                    created_at: row.get(11)?,
                    updated_at: row.get(12)?,
                })
            })
            .optional()?;

        row.map(JobRow::into_job).transpose()
    }

    fn update_job(&self, job: &CrawlJob) -> StorageResult<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE jobs SET status = ?1, queue = ?2, visited = ?3, nodes = ?4, stats = ?5, hosts = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                job.status.to_db_string(),
                serde_json::to_string(&job.queue)?,
                serde_json::to_string(&job.visited)?,
                serde_json::to_string(&job.nodes)?,
                serde_json::to_string(&job.stats)?,
                serde_json::to_string(&job.hosts)?,
                format_timestamp(&job.updated_at),
                job.id,
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::JobNotFound(job.id.clone()));
        }
        Ok(())
    }

    fn delete_completed_before(&self, cutoff: DateTime<Utc>) -> StorageResult<u64> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM jobs WHERE status = ?1 AND updated_at < ?2",
            params![
                JobStatus::Completed.to_db_string(),
                format_timestamp(&cutoff)
            ],
        )?;
        Ok(deleted as u64)
    }
}
