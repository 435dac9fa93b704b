//! Crawl job snapshot
//!
//! A `CrawlJob` is the whole persisted state of a resumable crawl: frontier,
//! visited set, node log and statistics. Each batch takes a snapshot by value
//! and hands back a new one, which the caller persists.

use crate::url::Scope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::time::Duration;

/// Lifecycle status of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for the next batch
    Pending,
    /// A batch is currently being processed
    Running,
    /// Frontier exhausted or page limit reached
    Completed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }

    /// Parses a status from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Status of a single crawled URL in the node log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Crawling,
    Completed,
    Error,
}

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
    pub parent_url: Option<String>,
}

impl FrontierEntry {
    pub fn new(url: impl Into<String>, depth: u32, parent_url: Option<String>) -> Self {
        Self {
            url: url.into(),
            depth,
            parent_url,
        }
    }
}

/// One entry of the node log
///
/// Serializes to the `node` payload of the streaming progress protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlNode {
    pub url: String,
    pub depth: u32,
    pub status: NodeStatus,
    #[serde(rename = "parent")]
    pub parent_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_count: Option<usize>,
}

impl CrawlNode {
    pub fn crawling(entry: &FrontierEntry) -> Self {
        Self {
            url: entry.url.clone(),
            depth: entry.depth,
            status: NodeStatus::Crawling,
            parent_url: entry.parent_url.clone(),
            title: None,
            link_count: None,
        }
    }

    pub fn complete(&mut self, title: &str, link_count: usize) {
        self.status = NodeStatus::Completed;
        self.title = Some(title.to_string());
        self.link_count = Some(link_count);
    }

    pub fn fail(&mut self) {
        self.status = NodeStatus::Error;
    }
}

/// Running counters of a crawl job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub total_pages: usize,
    pub completed_pages: usize,
    pub queue_size: usize,
    pub duration_seconds: f64,
}

/// Per-origin state that outlives a single batch
///
/// Holds the robots.txt body fetched for the origin and the time of the last
/// page request, so a resumed job neither refetches robots.txt nor skips the
/// politeness delay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostState {
    /// Raw robots.txt body; empty when none could be fetched
    #[serde(default)]
    pub robots_txt: String,
    #[serde(default)]
    pub robots_fetched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_fetch: Option<DateTime<Utc>>,
}

/// Persisted state of a resumable crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlJob {
    pub id: String,
    pub start_url: String,
    pub max_depth: u32,
    pub max_pages: usize,
    pub scope: Scope,
    pub status: JobStatus,
    pub queue: VecDeque<FrontierEntry>,
    pub visited: BTreeSet<String>,
    pub nodes: Vec<CrawlNode>,
    pub stats: JobStats,
    /// Keyed by origin (`scheme://host[:port]`)
    #[serde(default)]
    pub hosts: BTreeMap<String, HostState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CrawlJob {
    /// Creates a pending job whose frontier holds only the start URL
    ///
    /// `start_url` must already be normalized.
    pub fn new(
        id: impl Into<String>,
        start_url: impl Into<String>,
        max_depth: u32,
        max_pages: usize,
        scope: Scope,
    ) -> Self {
        let start_url = start_url.into();
        let now = Utc::now();
        let mut queue = VecDeque::new();
        queue.push_back(FrontierEntry::new(start_url.clone(), 0, None));

        Self {
            id: id.into(),
            start_url,
            max_depth,
            max_pages,
            scope,
            status: JobStatus::Pending,
            queue,
            visited: BTreeSet::new(),
            nodes: Vec::new(),
            stats: JobStats {
                queue_size: 1,
                ..JobStats::default()
            },
            hosts: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    /// True once the visited set has reached the page limit
    pub fn page_limit_reached(&self) -> bool {
        self.visited.len() >= self.max_pages
    }

    /// True if the URL is already visited or waiting in the frontier
    pub fn is_known(&self, url: &str) -> bool {
        self.visited.contains(url) || self.queue.iter().any(|e| e.url == url)
    }

    /// Recomputes counters from the snapshot and adds `elapsed` to the duration
    pub fn refresh_stats(&mut self, elapsed: Duration) {
        self.stats.total_pages = self.visited.len();
        self.stats.completed_pages = self
            .nodes
            .iter()
            .filter(|n| n.status == NodeStatus::Completed)
            .count();
        self.stats.queue_size = self.queue.len();
        self.stats.duration_seconds += elapsed.as_secs_f64();
    }

    /// Settles the status after a batch: completed when nothing is left to do
    pub fn settle_status(&mut self) {
        self.status = if self.queue.is_empty() || self.page_limit_reached() {
            JobStatus::Completed
        } else {
            JobStatus::Pending
        };
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> CrawlJob {
        CrawlJob::new("job-1", "https://example.com/", 2, 5, Scope::Host)
    }

    #[test]
    fn test_new_job_seeds_frontier() {
        let job = job();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.queue.len(), 1);
        assert_eq!(job.queue[0].depth, 0);
        assert_eq!(job.queue[0].parent_url, None);
        assert_eq!(job.stats.queue_size, 1);
        assert!(job.visited.is_empty());
    }

    #[test]
    fn test_status_db_round_trip() {
        for status in [JobStatus::Pending, JobStatus::Running, JobStatus::Completed] {
            assert_eq!(JobStatus::from_db_string(status.to_db_string()), Some(status));
        }
        assert_eq!(JobStatus::from_db_string("bogus"), None);
    }

    #[test]
    fn test_settle_status_empty_queue_completes() {
        let mut job = job();
        job.queue.clear();
        job.settle_status();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn test_settle_status_page_limit_completes() {
        let mut job = job();
        for i in 0..5 {
            job.visited.insert(format!("https://example.com/{}", i));
        }
        job.settle_status();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn test_settle_status_pending_with_work_left() {
        let mut job = job();
        job.settle_status();
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn test_refresh_stats_accumulates_duration() {
        let mut job = job();
        job.visited.insert("https://example.com/".to_string());
        let mut node = CrawlNode::crawling(&job.queue[0]);
        node.complete("Home", 3);
        job.nodes.push(node);
        job.queue.clear();

        job.refresh_stats(Duration::from_millis(1500));
        job.refresh_stats(Duration::from_millis(500));

        assert_eq!(job.stats.total_pages, 1);
        assert_eq!(job.stats.completed_pages, 1);
        assert_eq!(job.stats.queue_size, 0);
        assert!((job.stats.duration_seconds - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_node_serializes_to_protocol_shape() {
        let entry = FrontierEntry::new("https://example.com/a", 1, Some("https://example.com/".into()));
        let mut node = CrawlNode::crawling(&entry);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["status"], "crawling");
        assert_eq!(json["parent"], "https://example.com/");
        assert!(json.get("title").is_none());

        node.complete("Page A", 4);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["title"], "Page A");
        assert_eq!(json["linkCount"], 4);
    }
}
