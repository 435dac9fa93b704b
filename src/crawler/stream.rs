//! Streaming crawl sessions
//!
//! A streaming crawl runs one job from start to finish for a single live
//! consumer, pushing a progress event after every state change. The job is
//! never persisted; documents are stored only when requested. Dropping the
//! receiver ends the crawl before the next page.

use crate::crawler::controller::{CrawlController, JobRequest};
use crate::crawler::session::next_entry;
use crate::state::{CrawlJob, CrawlNode, JobStatus};
use crate::{Result, SumiError};
use serde::Serialize;
use std::time::Instant;
use tokio::sync::mpsc::Sender;
use tracing::{debug, info};

/// Job counters as sent to streaming consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStats {
    pub total_pages: usize,
    pub completed_pages: usize,
    pub queue_size: usize,
    /// Seconds since the session started
    pub duration: f64,
    pub status: JobStatus,
}

impl StreamStats {
    fn from_job(job: &CrawlJob) -> Self {
        Self {
            total_pages: job.stats.total_pages,
            completed_pages: job.stats.completed_pages,
            queue_size: job.stats.queue_size,
            duration: job.stats.duration_seconds,
            status: job.status,
        }
    }
}

/// One message of the streaming progress protocol
///
/// Serializes as `{"type": "node", "node": {...}}`, `{"type": "stats", ...}`,
/// `{"type": "complete", ...}` or `{"type": "error", "message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Node { node: CrawlNode },
    Stats { stats: StreamStats },
    Complete { stats: StreamStats },
    Error { message: String },
}

/// Sends an event; false once the consumer is gone
async fn emit(tx: &Sender<ProgressEvent>, event: ProgressEvent) -> bool {
    tx.send(event).await.is_ok()
}

impl CrawlController {
    /// Crawls a site to completion, streaming progress to `tx`
    ///
    /// # Arguments
    ///
    /// * `request` - Start URL and limits
    /// * `save` - Store crawled documents in the document store
    /// * `tx` - Progress channel; closing it stops the crawl
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlJob)` - The final snapshot (completed, or pending if the consumer left)
    /// * `Err(SumiError)` - The start URL was invalid; an `error` event was sent
    pub async fn stream_crawl(
        &self,
        request: JobRequest,
        save: bool,
        tx: Sender<ProgressEvent>,
    ) -> Result<CrawlJob> {
        let mut job = match self.build_job(&request).await {
            Ok(job) => job,
            Err(e) => {
                emit(&tx, ProgressEvent::Error {
                    message: e.to_string(),
                })
                .await;
                return Err(e);
            }
        };

        let start = url::Url::parse(&job.start_url).map_err(SumiError::from)?;
        let mut session = self.session(&start, job.scope, save);
        let started = Instant::now();
        job.status = JobStatus::Running;
        info!("Streaming crawl of {} started", job.start_url);

        let mut connected = true;
        while connected && !job.page_limit_reached() {
            if tx.is_closed() {
                connected = false;
                break;
            }
            let Some(entry) = next_entry(&mut job) else {
                break;
            };

            let crawling = CrawlNode::crawling(&entry);
            if !emit(&tx, ProgressEvent::Node { node: crawling }).await {
                // Not visited yet; put it back so the snapshot stays resumable
                job.queue.push_front(entry);
                connected = false;
                break;
            }

            // Streaming sessions have no deadline, so nothing is deferred
            let Some(node) = session.crawl_entry(&mut job, entry).await else {
                break;
            };
            job.refresh_stats(std::time::Duration::ZERO);
            job.stats.duration_seconds = started.elapsed().as_secs_f64();

            connected = emit(&tx, ProgressEvent::Node { node }).await
                && emit(
                    &tx,
                    ProgressEvent::Stats {
                        stats: StreamStats::from_job(&job),
                    },
                )
                .await;
        }

        session.save(&mut job.hosts);
        if !connected {
            debug!("Streaming consumer disconnected from {}", job.start_url);
            job.refresh_stats(std::time::Duration::ZERO);
            job.stats.duration_seconds = started.elapsed().as_secs_f64();
            job.status = JobStatus::Pending;
            return Ok(job);
        }

        job.refresh_stats(std::time::Duration::ZERO);
        job.stats.duration_seconds = started.elapsed().as_secs_f64();
        job.settle_status();
        emit(
            &tx,
            ProgressEvent::Complete {
                stats: StreamStats::from_job(&job),
            },
        )
        .await;

        info!(
            "Streaming crawl of {} finished: {} pages",
            job.start_url, job.stats.total_pages
        );
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FrontierEntry;

    #[test]
    fn test_event_wire_format() {
        let entry = FrontierEntry::new("https://a.com/", 0, None);
        let event = ProgressEvent::Node {
            node: CrawlNode::crawling(&entry),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "node");
        assert_eq!(json["node"]["url"], "https://a.com/");
        assert_eq!(json["node"]["status"], "crawling");
        assert!(json["node"]["parent"].is_null());

        let event = ProgressEvent::Error {
            message: "bad url".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "bad url");
    }

    #[test]
    fn test_stats_wire_format() {
        let mut job = CrawlJob::new("j", "https://a.com/", 1, 5, crate::url::Scope::Host);
        job.status = JobStatus::Completed;
        job.stats.total_pages = 3;
        job.stats.duration_seconds = 1.5;

        let event = ProgressEvent::Complete {
            stats: StreamStats::from_job(&job),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "complete");
        assert_eq!(json["stats"]["totalPages"], 3);
        assert_eq!(json["stats"]["duration"], 1.5);
        assert_eq!(json["stats"]["status"], "completed");
    }
}
