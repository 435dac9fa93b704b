use crate::ranking::RankWeights;
use crate::url::Scope;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Sumi-Search
///
/// Every section is optional; missing keys fall back to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub search: SearchConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum link depth from the start URL
    pub max_depth: u32,

    /// Maximum number of URLs visited per job
    pub max_pages: usize,

    /// Pages processed per batch
    pub batch_size: usize,

    /// Wall-clock budget of one batch (milliseconds)
    pub time_budget_ms: u64,

    /// Time reserved at the end of a batch for persisting the job (milliseconds)
    pub safety_margin_ms: u64,

    /// Minimum time between requests to the same host (milliseconds)
    pub politeness_delay_ms: u64,

    /// Largest robots.txt Crawl-delay honoured (milliseconds)
    pub max_crawl_delay_ms: u64,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Maximum frontier length
    pub frontier_cap: usize,

    /// Maximum links enqueued from one page
    pub fanout_cap: usize,

    /// Default scope for new jobs
    pub scope: Scope,

    /// Seed new jobs from /sitemap.xml
    pub sitemap: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_pages: 50,
            batch_size: 5,
            time_budget_ms: 8_000,
            safety_margin_ms: 1_500,
            politeness_delay_ms: 750,
            max_crawl_delay_ms: 5_000,
            request_timeout_secs: 12,
            frontier_cap: 100,
            fanout_cap: 10,
            scope: Scope::Host,
            sitemap: false,
        }
    }
}

impl CrawlerConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    pub fn safety_margin(&self) -> Duration {
        Duration::from_millis(self.safety_margin_ms)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn max_crawl_delay(&self) -> Duration {
        Duration::from_millis(self.max_crawl_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt product token
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler (may be empty)
    pub contact_url: String,

    /// Email address for crawler-related contact (may be empty)
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiSearch".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: String::new(),
            contact_email: String::new(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        let contact: Vec<String> = [
            (!self.contact_url.is_empty()).then(|| format!("+{}", self.contact_url)),
            (!self.contact_email.is_empty()).then(|| self.contact_email.clone()),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

/// Query-time defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SearchConfig {
    /// Constant share of the BM25 score
    pub alpha: f64,

    /// Weight of the normalized PageRank
    pub beta: f64,

    /// Number of results returned
    pub k: usize,

    /// Weight of the title/URL match
    pub title_boost: f64,

    /// Number of suggestions returned
    pub suggest_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            beta: 0.8,
            k: 10,
            title_boost: 0.5,
            suggest_limit: 8,
        }
    }
}

impl SearchConfig {
    pub fn weights(&self) -> RankWeights {
        RankWeights {
            alpha: self.alpha,
            beta: self.beta,
            title_boost: self.title_boost,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./sumi-search.db"),
        }
    }
}
