//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! Fetching is best-effort: any failure to obtain the file means everything is allowed.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::ParsedRobots;

use reqwest::Client;
use tracing::debug;
use url::Url;

/// Fetches robots.txt for the origin of `url`
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - Any URL on the origin
///
/// # Returns
///
/// The parsed rules; `ParsedRobots::allow_all()` on network errors,
/// non-success statuses or undecodable bodies
pub async fn fetch_robots(client: &Client, url: &Url) -> ParsedRobots {
    let Ok(robots_url) = url.join("/robots.txt") else {
        return ParsedRobots::allow_all();
    };

    let response = match client.get(robots_url.as_str()).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!("robots.txt fetch failed for {}: {}", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    if !response.status().is_success() {
        debug!(
            "robots.txt at {} returned {}, allowing all",
            robots_url,
            response.status()
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            debug!("robots.txt body unreadable at {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}

/// Cache key for robots.txt and politeness bookkeeping: scheme, host and port
pub fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}
