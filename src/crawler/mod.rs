//! Crawler module for resumable site crawls
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with redirect and content-type handling
//! - Per-origin politeness and robots.txt enforcement
//! - Time-sliced batch processing of persisted jobs
//! - Streaming crawls with live progress events
//! - Sitemap seeding

mod controller;
mod fetcher;
mod politeness;
mod session;
mod sitemap;
mod stream;

pub use controller::{CrawlController, JobRequest};
pub use fetcher::{build_http_client, fetch_url, is_html_content_type, FetchResult, MAX_REDIRECTS};
pub use politeness::{effective_delay, Politeness};
pub use session::{next_entry, CrawlSession, SessionLimits, VisitError, Visited};
pub use sitemap::{fetch_sitemap, parse_sitemap, MAX_SITEMAP_URLS};
pub use stream::{ProgressEvent, StreamStats};
