//! One crawl session: the per-invocation state shared by batch and streaming
//! crawls
//!
//! A session owns the robots.txt cache and the politeness clock. Batch crawls
//! restore both from the job's per-origin state and save them back, so a
//! resumed job keeps its robots rules and per-host delays.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{fetch_url, FetchResult};
use crate::crawler::politeness::Politeness;
use crate::extract::extract;
use crate::index::document_tokens;
use crate::robots::{fetch_robots, origin_key, ParsedRobots, RobotsCache};
use crate::state::{CrawlJob, CrawlNode, FrontierEntry, HostState};
use crate::storage::{Document, DocumentStore};
use crate::url::{normalize_url, ScopeRule};
use chrono::Utc;
use rand::seq::SliceRandom;
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Why a URL produced no document
#[derive(Debug, Error)]
pub enum VisitError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("out of scope")]
    OutOfScope,

    #[error("disallowed by robots.txt")]
    Disallowed,

    #[error("HTTP {0}")]
    Http(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("not HTML: {0}")]
    NotHtml(String),

    #[error("redirected out of scope to {0}")]
    RedirectOutOfScope(String),

    #[error("politeness wait of {0:?} does not fit in the time budget")]
    OverBudget(std::time::Duration),

    #[error("no extractable text")]
    NoText,
}

/// A successfully crawled page
#[derive(Debug, Clone)]
pub struct Visited {
    pub document: Document,
    pub links: Vec<Url>,
}

/// Limits applied while crawling
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub frontier_cap: usize,
    pub fanout_cap: usize,
}

impl From<&CrawlerConfig> for SessionLimits {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            frontier_cap: config.frontier_cap,
            fanout_cap: config.fanout_cap,
        }
    }
}

pub struct CrawlSession {
    client: Client,
    scope: ScopeRule,
    agent: String,
    limits: SessionLimits,
    robots: RobotsCache,
    politeness: Politeness,
    store: Option<Arc<dyn DocumentStore>>,
    deadline: Option<Instant>,
}

impl CrawlSession {
    pub fn new(
        client: Client,
        scope: ScopeRule,
        agent: impl Into<String>,
        config: &CrawlerConfig,
        store: Option<Arc<dyn DocumentStore>>,
    ) -> Self {
        Self {
            client,
            scope,
            agent: agent.into(),
            limits: SessionLimits::from(config),
            robots: RobotsCache::new(),
            politeness: Politeness::new(config.politeness_delay(), config.max_crawl_delay()),
            store,
            deadline: None,
        }
    }

    /// Visits whose politeness wait would end after `deadline` are deferred
    pub fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    /// Loads robots rules and last-fetch times carried by a job
    pub fn restore(&mut self, hosts: &BTreeMap<String, HostState>) {
        for (origin, host) in hosts {
            if let Some(fetched_at) = host.robots_fetched_at {
                let robots = if host.robots_txt.is_empty() {
                    ParsedRobots::allow_all()
                } else {
                    ParsedRobots::from_content(&host.robots_txt)
                };
                self.robots.restore(origin.clone(), robots, fetched_at);
            }
            if let Some(last_fetch) = host.last_fetch {
                self.politeness.restore(origin.clone(), last_fetch);
            }
        }
    }

    /// Writes robots rules and last-fetch times back into a job
    pub fn save(&self, hosts: &mut BTreeMap<String, HostState>) {
        for (origin, cached) in self.robots.iter() {
            let host = hosts.entry(origin.to_string()).or_default();
            host.robots_txt = cached.content.content().to_string();
            host.robots_fetched_at = Some(cached.fetched_at);
        }
        for origin in self.politeness.origins() {
            let host = hosts.entry(origin.to_string()).or_default();
            host.last_fetch = self.politeness.last_fetch(origin);
        }
    }

    /// Fetches robots.txt for the URL's origin unless already cached
    async fn ensure_robots(&mut self, url: &Url) -> String {
        let origin = origin_key(url);
        if self.robots.get(&origin).is_none() {
            let robots = fetch_robots(&self.client, url).await;
            self.robots.insert(origin.clone(), robots);
        }
        origin
    }

    /// Checks a URL against its origin's robots.txt, fetching it once
    pub async fn robots_allows(&mut self, url: &Url) -> bool {
        let origin = self.ensure_robots(url).await;
        self.robots
            .get(&origin)
            .map(|robots| robots.is_allowed(url.as_str(), &self.agent))
            .unwrap_or(true)
    }

    /// Fetches and extracts one frontier entry
    ///
    /// The order of checks is: scope of the queued URL, robots.txt,
    /// politeness wait, fetch, scope of the final URL, content type,
    /// extraction. With a deadline set, a wait that would run past it fails
    /// with `OverBudget` before anything is fetched.
    pub async fn visit(&mut self, entry: &FrontierEntry) -> Result<Visited, VisitError> {
        let url = Url::parse(&entry.url).map_err(|e| VisitError::InvalidUrl(e.to_string()))?;
        if !self.scope.allows(&url) {
            return Err(VisitError::OutOfScope);
        }

        let origin = self.ensure_robots(&url).await;
        let (allowed, crawl_delay) = match self.robots.get(&origin) {
            Some(robots) => (
                robots.is_allowed(url.as_str(), &self.agent),
                robots.crawl_delay(&self.agent),
            ),
            None => (true, None),
        };
        if !allowed {
            return Err(VisitError::Disallowed);
        }

        if let Some(deadline) = self.deadline {
            let wait = self
                .politeness
                .time_until_allowed(&origin, crawl_delay, Utc::now())
                .unwrap_or_default();
            if Instant::now() + wait > deadline {
                return Err(VisitError::OverBudget(wait));
            }
        }
        self.politeness.acquire(&origin, crawl_delay).await;

        let (final_url, content_type, body) = match fetch_url(&self.client, &url).await {
            FetchResult::Success {
                final_url,
                content_type,
                body,
            } => (final_url, content_type, body),
            FetchResult::ContentMismatch { content_type } => {
                return Err(VisitError::NotHtml(content_type))
            }
            FetchResult::HttpError { status_code } => return Err(VisitError::Http(status_code)),
            FetchResult::NetworkError { error } => return Err(VisitError::Network(error)),
        };

        let final_url = normalize_url(final_url.as_str())
            .map_err(|_| VisitError::RedirectOutOfScope(final_url.to_string()))?;
        if !self.scope.allows(&final_url) {
            return Err(VisitError::RedirectOutOfScope(final_url.to_string()));
        }

        debug!("Fetched {} ({})", final_url, content_type);
        let page = extract(&body, &final_url, &self.scope).ok_or(VisitError::NoText)?;

        let mut document = Document {
            url: final_url.to_string(),
            title: page.title,
            text: page.text,
            snippet: page.snippet,
            length: 0,
            depth: entry.depth,
            parent_url: entry.parent_url.clone(),
            outbound_links: page.links.iter().map(|l| l.to_string()).collect(),
            crawled_at: Utc::now(),
        };
        document.length = document_tokens(&document).len();

        Ok(Visited {
            document,
            links: page.links,
        })
    }

    /// Crawls one entry and folds the outcome into the job
    ///
    /// Marks the URL visited, logs a node, stores the document when the
    /// session has a store, and enqueues outbound links while the entry is
    /// above the depth limit. Failures only mark the node as an error.
    ///
    /// # Returns
    ///
    /// * `Some(CrawlNode)` - The final state of the node appended for this entry
    /// * `None` - The politeness wait did not fit before the deadline; the
    ///   entry is back at the front of the frontier and nothing was recorded
    pub async fn crawl_entry(&mut self, job: &mut CrawlJob, entry: FrontierEntry) -> Option<CrawlNode> {
        let outcome = self.visit(&entry).await;
        if let Err(VisitError::OverBudget(wait)) = &outcome {
            debug!("Deferring {}: would wait {:?}", entry.url, wait);
            job.queue.push_front(entry);
            return None;
        }

        job.visited.insert(entry.url.clone());
        let mut node = CrawlNode::crawling(&entry);

        match outcome {
            Ok(visited) => {
                if let Some(store) = &self.store {
                    match store.upsert_if_absent(&visited.document) {
                        Ok(true) => debug!("Stored {}", visited.document.url),
                        Ok(false) => debug!("Already stored {}", visited.document.url),
                        Err(e) => warn!("Failed to store {}: {}", visited.document.url, e),
                    }
                }
                node.complete(&visited.document.title, visited.links.len());

                if entry.depth < job.max_depth {
                    self.enqueue_links(job, &entry, visited.links).await;
                }
            }
            Err(e) => {
                debug!("Skipping {}: {}", entry.url, e);
                node.fail();
            }
        }

        job.nodes.push(node.clone());
        Some(node)
    }

    /// Adds new links to the frontier in random order
    ///
    /// At most `fanout_cap` links are considered; known and robots-disallowed
    /// URLs are skipped, and nothing is added once the frontier is full.
    pub async fn enqueue_links(&mut self, job: &mut CrawlJob, parent: &FrontierEntry, links: Vec<Url>) {
        let links = shuffled(links);

        for link in links.into_iter().take(self.limits.fanout_cap) {
            if job.queue.len() >= self.limits.frontier_cap {
                debug!("Frontier full ({} entries)", job.queue.len());
                break;
            }
            if job.is_known(link.as_str()) {
                continue;
            }
            if !self.robots_allows(&link).await {
                debug!("Not enqueuing {}: disallowed by robots.txt", link);
                continue;
            }
            job.queue.push_back(FrontierEntry::new(
                link.as_str(),
                parent.depth + 1,
                Some(parent.url.clone()),
            ));
        }
    }
}

fn shuffled(mut links: Vec<Url>) -> Vec<Url> {
    links.shuffle(&mut rand::thread_rng());
    links
}

/// Pops the next entry worth crawling, skipping visited and too-deep ones
pub fn next_entry(job: &mut CrawlJob) -> Option<FrontierEntry> {
    while let Some(entry) = job.queue.pop_front() {
        if job.visited.contains(&entry.url) {
            continue;
        }
        if entry.depth > job.max_depth {
            debug!("Skipping {}: depth {} > {}", entry.url, entry.depth, job.max_depth);
            continue;
        }
        return Some(entry);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::Scope;

    #[test]
    fn test_next_entry_skips_visited_and_deep() {
        let mut job = CrawlJob::new("j", "https://a.com/", 1, 10, Scope::Host);
        job.visited.insert("https://a.com/".to_string());
        job.queue
            .push_back(FrontierEntry::new("https://a.com/deep", 2, None));
        job.queue
            .push_back(FrontierEntry::new("https://a.com/ok", 1, None));

        let entry = next_entry(&mut job).unwrap();
        assert_eq!(entry.url, "https://a.com/ok");
        assert!(next_entry(&mut job).is_none());
    }

    #[test]
    fn test_host_state_survives_a_new_session() {
        let config = CrawlerConfig::default();
        let start = Url::parse("https://a.com/").unwrap();
        let new_session =
            || CrawlSession::new(Client::new(), ScopeRule::new(Scope::Host, &start), "TestBot", &config, None);

        let fetched_at = Utc::now() - chrono::Duration::minutes(5);
        let last_fetch = Utc::now() - chrono::Duration::milliseconds(200);
        let mut hosts = BTreeMap::new();
        hosts.insert(
            "https://a.com".to_string(),
            HostState {
                robots_txt: "User-agent: *\nDisallow: /private\n".to_string(),
                robots_fetched_at: Some(fetched_at),
                last_fetch: Some(last_fetch),
            },
        );

        let mut session = new_session();
        session.restore(&hosts);
        let robots = session.robots.get("https://a.com").unwrap();
        assert!(!robots.is_allowed("https://a.com/private", "TestBot"));
        assert!(session
            .politeness
            .time_until_allowed("https://a.com", None, Utc::now())
            .is_some());

        let mut saved = BTreeMap::new();
        session.save(&mut saved);
        assert_eq!(saved, hosts);

        let mut next = new_session();
        next.restore(&saved);
        assert_eq!(next.politeness.last_fetch("https://a.com"), Some(last_fetch));
    }

    #[test]
    fn test_shuffled_keeps_all_links() {
        let links: Vec<Url> = (0..10)
            .map(|i| Url::parse(&format!("https://a.com/{}", i)).unwrap())
            .collect();
        let mut result = shuffled(links.clone());
        result.sort();
        let mut expected = links;
        expected.sort();
        assert_eq!(result, expected);
    }
}
