//! Configuration module for Sumi-Search
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section and key is optional; an empty file yields the defaults.
//!
//! # Example
//!
//! ```no_run
//! use sumi_search::config::load_config;
//! use std::path::Path;
//!
//! let loaded = load_config(Path::new("sumi.toml")).unwrap();
//! println!("Crawler will use max depth: {}", loaded.config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, SearchConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{config_fingerprint, load_config, parse_config, LoadedConfig};
pub use validation::validate;
