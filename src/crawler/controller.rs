//! Crawl controller - resumable, time-sliced crawl jobs
//!
//! This module contains the job lifecycle:
//! - Creating jobs (optionally seeded from the sitemap)
//! - Processing one bounded batch of a job and persisting the new snapshot
//! - Driving a job to completion across batches
//! - Removing old completed jobs

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::session::{next_entry, CrawlSession};
use crate::crawler::sitemap::fetch_sitemap;
use crate::state::{CrawlJob, FrontierEntry, JobStatus};
use crate::storage::{DocumentStore, JobStore};
use crate::url::{normalize_url, Scope, ScopeRule};
use crate::{Result, SumiError};
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Parameters of a new crawl job
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub start_url: String,
    pub max_depth: u32,
    pub max_pages: usize,
    pub scope: Scope,
    /// Seed the frontier from /sitemap.xml
    pub sitemap: bool,
}

impl JobRequest {
    /// A request using the configured defaults
    pub fn new(start_url: impl Into<String>, config: &CrawlerConfig) -> Self {
        Self {
            start_url: start_url.into(),
            max_depth: config.max_depth,
            max_pages: config.max_pages,
            scope: config.scope,
            sitemap: config.sitemap,
        }
    }
}

/// Main crawl controller
///
/// Callers must not run two batches of the same job concurrently; the
/// controller does no locking across `process_batch` calls.
pub struct CrawlController {
    pub(crate) config: CrawlerConfig,
    pub(crate) user_agent: UserAgentConfig,
    pub(crate) documents: Arc<dyn DocumentStore>,
    pub(crate) jobs: Arc<dyn JobStore>,
    pub(crate) client: Client,
}

impl CrawlController {
    /// Creates a new controller
    ///
    /// # Arguments
    ///
    /// * `config` - The full configuration; the crawler and user-agent sections are used
    /// * `documents` - Where crawled pages are stored
    /// * `jobs` - Where job snapshots are persisted
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlController)` - Ready to create and process jobs
    /// * `Err(SumiError)` - The HTTP client could not be built
    pub fn new(
        config: &Config,
        documents: Arc<dyn DocumentStore>,
        jobs: Arc<dyn JobStore>,
    ) -> Result<Self> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;

        Ok(Self {
            config: config.crawler.clone(),
            user_agent: config.user_agent.clone(),
            documents,
            jobs,
            client,
        })
    }

    pub fn crawler_config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub(crate) fn session(&self, start_url: &Url, scope: Scope, save: bool) -> CrawlSession {
        let store = save.then(|| Arc::clone(&self.documents));
        CrawlSession::new(
            self.client.clone(),
            ScopeRule::new(scope, start_url),
            self.user_agent.crawler_name.clone(),
            &self.config,
            store,
        )
    }

    /// Builds a new pending job without persisting it
    pub(crate) async fn build_job(&self, request: &JobRequest) -> Result<CrawlJob> {
        let start = normalize_url(&request.start_url)?;
        let id = Uuid::new_v4().to_string();
        let mut job = CrawlJob::new(
            id,
            start.as_str(),
            request.max_depth,
            request.max_pages,
            request.scope,
        );

        if request.sitemap && request.max_depth >= 1 {
            let rule = ScopeRule::new(request.scope, &start);
            let seeds = fetch_sitemap(&self.client, &start, &rule).await;
            let mut added = 0;
            for url in seeds {
                if job.queue.len() >= self.config.frontier_cap {
                    break;
                }
                if job.is_known(url.as_str()) {
                    continue;
                }
                job.queue.push_back(FrontierEntry::new(
                    url.as_str(),
                    1,
                    Some(job.start_url.clone()),
                ));
                added += 1;
            }
            info!("Seeded {} URLs from sitemap for {}", added, job.start_url);
            job.stats.queue_size = job.queue.len();
        }

        Ok(job)
    }

    /// Creates a job with the configured scope
    ///
    /// # Returns
    ///
    /// The new job's id
    pub async fn create_job(&self, start_url: &str, max_depth: u32, max_pages: usize) -> Result<String> {
        let request = JobRequest {
            max_depth,
            max_pages,
            ..JobRequest::new(start_url, &self.config)
        };
        self.create_job_with(request).await
    }

    /// Creates and persists a job from a full request
    pub async fn create_job_with(&self, request: JobRequest) -> Result<String> {
        let job = self.build_job(&request).await?;
        self.jobs.insert_job(&job)?;
        info!(
            "Created crawl job {} for {} (depth {}, pages {}, scope {})",
            job.id, job.start_url, job.max_depth, job.max_pages, job.scope
        );
        Ok(job.id)
    }

    /// Loads a job snapshot
    pub fn get_job(&self, id: &str) -> Result<CrawlJob> {
        self.jobs
            .get_job(id)?
            .ok_or_else(|| SumiError::JobNotFound(id.to_string()))
    }

    /// Processes one batch of a job and persists the new snapshot
    ///
    /// Pages are crawled until `batch_size` pages are done, the job's page
    /// limit is reached, the frontier is empty, or the elapsed time plus the
    /// configured safety margin reaches `time_budget`. The time check only
    /// applies after the first page.
    ///
    /// Robots rules and per-origin fetch times are restored from the job and
    /// saved back with it, so politeness holds across batches. A politeness
    /// wait that would end past `time_budget` minus the safety margin ends the
    /// batch instead, with the entry left at the front of the frontier. The
    /// crawl-delay cap is validated to fit in the configured budget, so
    /// `run_to_completion` always advances.
    ///
    /// Calling this on a completed job returns the stored snapshot unchanged.
    ///
    /// # Arguments
    ///
    /// * `id` - The job id
    /// * `batch_size` - Maximum pages crawled in this call
    /// * `time_budget` - Wall-clock budget of this call
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlJob)` - The updated snapshot, pending or completed
    /// * `Err(SumiError)` - The job does not exist or the job store failed
    pub async fn process_batch(
        &self,
        id: &str,
        batch_size: usize,
        time_budget: Duration,
    ) -> Result<CrawlJob> {
        let mut job = self.get_job(id)?;
        if job.is_completed() {
            debug!("Job {} already completed", id);
            return Ok(job);
        }

        job.status = JobStatus::Running;
        job.updated_at = Utc::now();
        self.jobs.update_job(&job)?;

        let start = normalize_url(&job.start_url)?;
        let mut session = self.session(&start, job.scope, true);
        session.restore(&job.hosts);
        let safety_margin = self.config.safety_margin();
        let started = Instant::now();
        session.set_deadline(started + time_budget.saturating_sub(safety_margin));
        let mut processed = 0;

        while processed < batch_size {
            if job.page_limit_reached() {
                break;
            }
            if processed > 0 && started.elapsed() + safety_margin >= time_budget {
                debug!("Time budget reached after {} pages", processed);
                break;
            }
            let Some(entry) = next_entry(&mut job) else {
                break;
            };

            if session.crawl_entry(&mut job, entry).await.is_none() {
                debug!("Politeness wait does not fit in the budget after {} pages", processed);
                break;
            }
            processed += 1;
        }

        session.save(&mut job.hosts);
        job.refresh_stats(started.elapsed());
        job.settle_status();
        self.jobs.update_job(&job)?;

        info!(
            "Job {}: batch of {} pages done, {} visited, {} queued, status {}",
            job.id,
            processed,
            job.stats.total_pages,
            job.stats.queue_size,
            job.status
        );

        Ok(job)
    }

    /// Runs batches with the configured size and budget until the job completes
    pub async fn run_to_completion(&self, id: &str) -> Result<CrawlJob> {
        loop {
            let job = self
                .process_batch(id, self.config.batch_size, self.config.time_budget())
                .await?;
            if job.is_completed() {
                return Ok(job);
            }
        }
    }

    /// Deletes completed jobs not updated within `older_than`
    ///
    /// # Returns
    ///
    /// The number of deleted jobs
    pub fn cleanup_completed_jobs(&self, older_than: chrono::Duration) -> Result<u64> {
        let cutoff = Utc::now() - older_than;
        let deleted = self.jobs.delete_completed_before(cutoff)?;
        info!("Removed {} completed jobs older than {}", deleted, cutoff);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn controller() -> CrawlController {
        let store = Arc::new(MemoryStorage::new());
        CrawlController::new(&Config::default(), store.clone(), store).unwrap()
    }

    #[tokio::test]
    async fn test_create_job_normalizes_start_url() {
        let controller = controller();
        let id = controller
            .create_job("HTTP://Example.COM:80/a/../b#x", 2, 10)
            .await
            .unwrap();

        let job = controller.get_job(&id).unwrap();
        assert_eq!(job.start_url, "http://example.com/b");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.queue.len(), 1);
        assert_eq!(job.max_pages, 10);
    }

    #[tokio::test]
    async fn test_create_job_rejects_invalid_url() {
        let controller = controller();
        assert!(controller.create_job("ftp://example.com/", 2, 10).await.is_err());
        assert!(controller.create_job("not a url", 2, 10).await.is_err());
    }

    #[tokio::test]
    async fn test_process_batch_unknown_job() {
        let controller = controller();
        let result = controller
            .process_batch("missing", 5, Duration::from_secs(5))
            .await;
        assert!(matches!(result, Err(SumiError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_cleanup_removes_old_completed_jobs() {
        let store = Arc::new(MemoryStorage::new());
        let controller = CrawlController::new(&Config::default(), store.clone(), store.clone()).unwrap();

        let mut job = CrawlJob::new("old", "https://a.com/", 1, 1, Scope::Host);
        job.status = JobStatus::Completed;
        job.updated_at = Utc::now() - chrono::Duration::days(8);
        store.insert_job(&job).unwrap();

        assert_eq!(
            controller
                .cleanup_completed_jobs(chrono::Duration::days(7))
                .unwrap(),
            1
        );
    }
}
