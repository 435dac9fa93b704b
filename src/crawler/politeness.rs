//! Per-host request spacing
//!
//! The delay before a request is measured from the last page fetch to the
//! same origin, never from a global clock. Last-fetch times are wall-clock
//! timestamps so the next batch of a job can pick them up.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Calculates the effective delay for a host
///
/// This takes the maximum of:
/// - The configured politeness delay
/// - The robots.txt crawl delay (if specified), capped at `max_robots_delay`
pub fn effective_delay(
    configured: Duration,
    robots_delay_secs: Option<f64>,
    max_robots_delay: Duration,
) -> Duration {
    let robots_delay = robots_delay_secs
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(|secs| Duration::from_secs_f64(secs.min(max_robots_delay.as_secs_f64())))
        .unwrap_or(Duration::ZERO);

    configured.max(robots_delay)
}

/// Tracks the last fetch per origin and sleeps until the next one is allowed
#[derive(Debug)]
pub struct Politeness {
    delay: Duration,
    max_robots_delay: Duration,
    last_fetch: HashMap<String, DateTime<Utc>>,
}

impl Politeness {
    pub fn new(delay: Duration, max_robots_delay: Duration) -> Self {
        Self {
            delay,
            max_robots_delay,
            last_fetch: HashMap::new(),
        }
    }

    /// Seeds the clock of `origin` from a persisted timestamp
    pub fn restore(&mut self, origin: impl Into<String>, fetched_at: DateTime<Utc>) {
        self.last_fetch.insert(origin.into(), fetched_at);
    }

    /// Time of the last fetch to `origin`
    pub fn last_fetch(&self, origin: &str) -> Option<DateTime<Utc>> {
        self.last_fetch.get(origin).copied()
    }

    /// Origins with a recorded fetch
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.last_fetch.keys().map(String::as_str)
    }

    /// Time left before `origin` may be fetched again, if any
    pub fn time_until_allowed(
        &self,
        origin: &str,
        robots_delay_secs: Option<f64>,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        let last = self.last_fetch.get(origin)?;
        let delay = effective_delay(self.delay, robots_delay_secs, self.max_robots_delay);
        // A timestamp in the future counts as "just now"
        let elapsed = (now - *last).to_std().unwrap_or(Duration::ZERO);
        (elapsed < delay).then(|| delay - elapsed)
    }

    /// Sleeps until `origin` may be fetched, then records the fetch
    pub async fn acquire(&mut self, origin: &str, robots_delay_secs: Option<f64>) {
        if let Some(wait) = self.time_until_allowed(origin, robots_delay_secs, Utc::now()) {
            debug!("Waiting {:?} before next request to {}", wait, origin);
            tokio::time::sleep(wait).await;
        }
        self.last_fetch.insert(origin.to_string(), Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: Duration = Duration::from_secs(5);

    #[test]
    fn test_effective_delay_uses_config() {
        let delay = effective_delay(Duration::from_millis(1000), None, CAP);
        assert_eq!(delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_effective_delay_with_robots_delay() {
        // Should use the maximum of config (1 second) and robots (3 seconds)
        let delay = effective_delay(Duration::from_millis(1000), Some(3.0), CAP);
        assert_eq!(delay, Duration::from_secs(3));
    }

    #[test]
    fn test_effective_delay_robots_smaller_than_config() {
        let delay = effective_delay(Duration::from_millis(1000), Some(0.5), CAP);
        assert_eq!(delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_effective_delay_caps_robots_delay() {
        let delay = effective_delay(Duration::from_millis(750), Some(3600.0), CAP);
        assert_eq!(delay, CAP);
    }

    #[test]
    fn test_first_request_is_immediate() {
        let politeness = Politeness::new(Duration::from_millis(750), CAP);
        assert!(politeness
            .time_until_allowed("https://example.com", None, Utc::now())
            .is_none());
    }

    #[tokio::test]
    async fn test_second_request_waits() {
        let mut politeness = Politeness::new(Duration::from_millis(50), CAP);
        politeness.acquire("https://example.com", None).await;

        let wait = politeness.time_until_allowed("https://example.com", None, Utc::now());
        assert!(wait.is_some());
        assert!(politeness
            .time_until_allowed("https://other.com", None, Utc::now())
            .is_none());

        let started = std::time::Instant::now();
        politeness.acquire("https://example.com", None).await;
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_restored_clock_still_waits() {
        let mut politeness = Politeness::new(Duration::from_secs(2), CAP);
        politeness.restore("https://example.com", Utc::now() - chrono::Duration::milliseconds(500));

        let wait = politeness
            .time_until_allowed("https://example.com", None, Utc::now())
            .unwrap();
        assert!(wait > Duration::from_millis(1000));
        assert!(wait <= Duration::from_millis(1500));
    }

    #[test]
    fn test_old_fetch_does_not_wait() {
        let mut politeness = Politeness::new(Duration::from_secs(2), CAP);
        politeness.restore("https://example.com", Utc::now() - chrono::Duration::seconds(60));
        assert!(politeness
            .time_until_allowed("https://example.com", None, Utc::now())
            .is_none());
    }

    #[test]
    fn test_restore_records_origin() {
        let mut politeness = Politeness::new(Duration::from_secs(1), CAP);
        let at = Utc::now() - chrono::Duration::seconds(3);
        politeness.restore("https://example.com", at);

        assert_eq!(politeness.last_fetch("https://example.com"), Some(at));
        assert_eq!(politeness.origins().collect::<Vec<_>>(), vec!["https://example.com"]);
    }
}
