//! State management for resumable crawls
//!
//! This module defines the crawl job snapshot, the per-origin state carried
//! between batches, and the status enums for jobs and crawled URLs.

mod job;

pub use job::{CrawlJob, CrawlNode, FrontierEntry, HostState, JobStats, JobStatus, NodeStatus};
