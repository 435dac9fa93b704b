//! Sumi-Search: a polite site crawler with a hybrid search index
//!
//! This crate crawls a single website in short, resumable batches, builds an
//! inverted index over the crawled pages, and answers queries by blending
//! BM25 relevance, PageRank authority and title/URL matching. It also serves
//! prefix and fuzzy query suggestions over the indexed vocabulary.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod index;
pub mod ranking;
pub mod robots;
pub mod search;
pub mod state;
pub mod storage;
pub mod suggest;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Search operations
#[derive(Debug, Error)]
pub enum SumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Crawl job not found: {0}")]
    JobNotFound(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),

    #[error("Unknown crawl scope: {0}")]
    UnknownScope(String),
}

/// Result type alias for Sumi-Search operations
pub type Result<T> = std::result::Result<T, SumiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::CrawlController;
pub use search::{SearchEngine, SearchError};
pub use state::{CrawlJob, JobStatus, NodeStatus};
pub use crate::url::{normalize_url, Scope};
