//! Robots.txt caching implementation
//!
//! Rules are cached per origin and considered stale after 24 hours. A crawl
//! job carries the cache between batches, so the window spans the whole job.

use crate::robots::ParsedRobots;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Cached robots.txt data for an origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt content
    pub content: ParsedRobots,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(content: ParsedRobots) -> Self {
        Self {
            content,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached robots.txt is older than 24 hours
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.fetched_at;
        age > Duration::hours(24)
    }
}

/// Per-origin robots.txt cache
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: HashMap<String, CachedRobots>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fresh cached rules for an origin, if any
    pub fn get(&self, origin: &str) -> Option<&ParsedRobots> {
        self.entries
            .get(origin)
            .filter(|cached| !cached.is_stale())
            .map(|cached| &cached.content)
    }

    pub fn insert(&mut self, origin: impl Into<String>, robots: ParsedRobots) {
        self.entries.insert(origin.into(), CachedRobots::new(robots));
    }

    /// Inserts rules fetched earlier, keeping their original fetch time
    pub fn restore(
        &mut self,
        origin: impl Into<String>,
        robots: ParsedRobots,
        fetched_at: DateTime<Utc>,
    ) {
        self.entries.insert(
            origin.into(),
            CachedRobots {
                content: robots,
                fetched_at,
            },
        );
    }

    /// All cached entries, stale ones included
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CachedRobots)> {
        self.entries.iter().map(|(origin, cached)| (origin.as_str(), cached))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cache_not_stale() {
        let cache = CachedRobots::new(ParsedRobots::allow_all());
        assert!(!cache.is_stale());
    }

    #[test]
    fn test_cache_is_stale() {
        let mut cache = CachedRobots::new(ParsedRobots::allow_all());

        // Manually set fetched_at to 25 hours ago
        cache.fetched_at = Utc::now() - Duration::hours(25);

        assert!(cache.is_stale());
    }

    #[test]
    fn test_cache_not_stale_at_23_hours() {
        let mut cache = CachedRobots::new(ParsedRobots::allow_all());
        cache.fetched_at = Utc::now() - Duration::hours(23);
        assert!(!cache.is_stale());
    }

    #[test]
    fn test_robots_cache_lookup() {
        let mut cache = RobotsCache::new();
        assert!(cache.get("https://example.com").is_none());

        cache.insert(
            "https://example.com",
            ParsedRobots::from_content("User-agent: *\nDisallow: /"),
        );
        let robots = cache.get("https://example.com").unwrap();
        assert!(!robots.is_allowed("https://example.com/x", "TestBot"));
        assert!(cache.get("https://other.com").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_restored_entry_keeps_fetch_time() {
        let mut cache = RobotsCache::new();
        let fetched_at = Utc::now() - Duration::hours(2);
        cache.restore(
            "https://example.com",
            ParsedRobots::from_content("User-agent: *\nDisallow: /a"),
            fetched_at,
        );

        assert!(cache.get("https://example.com").is_some());
        let (origin, cached) = cache.iter().next().unwrap();
        assert_eq!(origin, "https://example.com");
        assert_eq!(cached.fetched_at, fetched_at);
        assert_eq!(cached.content.content(), "User-agent: *\nDisallow: /a");

        cache.restore(
            "https://example.com",
            ParsedRobots::allow_all(),
            Utc::now() - Duration::hours(30),
        );
        assert!(cache.get("https://example.com").is_none());
    }

    #[test]
    fn test_stale_entries_are_not_served() {
        let mut cache = RobotsCache::new();
        cache.insert("https://example.com", ParsedRobots::allow_all());
        if let Some(entry) = cache.entries.get_mut("https://example.com") {
            entry.fetched_at = Utc::now() - Duration::hours(25);
        }
        assert!(cache.get("https://example.com").is_none());
    }
}
