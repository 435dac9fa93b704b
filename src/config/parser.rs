//! Reading `sumi.toml`
//!
//! The file is read once; the same text is parsed and fingerprinted so the
//! logged fingerprint always matches the settings in effect.

use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// A parsed configuration and the fingerprint of the text it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// Hex SHA-256 of the file contents
    pub fingerprint: String,
}

/// Parses and validates configuration text
///
/// Missing sections and keys take their defaults; unknown `scope` values and
/// out-of-range numbers are rejected.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

pub fn config_fingerprint(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Reads, parses and fingerprints a configuration file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_search::config::load_config;
///
/// let loaded = load_config(Path::new("sumi.toml")).unwrap();
/// println!("{} pages per job", loaded.config.crawler.max_pages);
/// ```
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(LoadedConfig {
        config: parse_config(&content)?,
        fingerprint: config_fingerprint(&content),
    })
}
