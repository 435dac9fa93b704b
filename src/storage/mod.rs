//! Storage module for persisting crawl data
//!
//! This module handles the two stores the crawler and the search engine share:
//! - The document store, keyed by normalized URL
//! - The job store, holding resumable crawl job snapshots
//!
//! Both are exposed as traits so callers can swap the SQLite backend for the
//! in-memory one used in tests and one-shot runs.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use traits::{DocumentStore, JobStore, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Opens (or creates) the SQLite database at the given path
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A crawled page as stored in the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Normalized URL, unique across the store
    pub url: String,
    pub title: String,
    pub text: String,
    pub snippet: String,
    /// Token count of title + text
    pub length: usize,
    pub depth: u32,
    pub parent_url: Option<String>,
    pub outbound_links: Vec<String>,
    pub crawled_at: DateTime<Utc>,
}

/// Selection criteria for `find_all` and `count`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    /// Only documents whose URL starts with this prefix
    pub url_prefix: Option<String>,
}

impl DocumentFilter {
    /// Matches every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches documents under the given URL prefix, e.g. one site's origin
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            url_prefix: Some(prefix.into()),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match &self.url_prefix {
            Some(prefix) => doc.url.starts_with(prefix.as_str()),
            None => true,
        }
    }
}
