//! Storage traits and error types
//!
//! This module defines the trait interfaces for storage backends and
//! associated error types.

use crate::state::CrawlJob;
use crate::storage::{Document, DocumentFilter};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Duplicate job id: {0}")]
    DuplicateJob(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Keyed store of crawled documents
///
/// Implementations must make single-document upserts atomic. The crawler and
/// the search engine perform no locking of their own on top of this.
pub trait DocumentStore: Send + Sync {
    /// Inserts the document unless one with the same URL already exists
    ///
    /// Returns true if the document was inserted.
    fn upsert_if_absent(&self, doc: &Document) -> StorageResult<bool>;

    /// Returns matching documents in insertion order
    fn find_all(&self, filter: &DocumentFilter) -> StorageResult<Vec<Document>>;

    /// Counts matching documents
    fn count(&self, filter: &DocumentFilter) -> StorageResult<u64>;
}

/// Store of crawl job snapshots
pub trait JobStore: Send + Sync {
    /// Inserts a new job; fails if the id is taken
    fn insert_job(&self, job: &CrawlJob) -> StorageResult<()>;

    /// Loads a job snapshot by id
    fn get_job(&self, id: &str) -> StorageResult<Option<CrawlJob>>;

    /// Replaces the stored snapshot of an existing job
    fn update_job(&self, job: &CrawlJob) -> StorageResult<()>;

    /// Deletes completed jobs last updated before the cutoff
    ///
    /// Returns the number of deleted jobs.
    fn delete_completed_before(&self, cutoff: DateTime<Utc>) -> StorageResult<u64>;
}
