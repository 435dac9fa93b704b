//! Sitemap seeding
//!
//! Reads `<loc>` entries from the site's /sitemap.xml so a new job can start
//! with more than its start URL in the frontier.

use crate::url::{normalize_url, ScopeRule};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Maximum number of sitemap entries read
pub const MAX_SITEMAP_URLS: usize = 5000;

/// Extracts normalized, in-scope `<loc>` URLs from sitemap XML
pub fn parse_sitemap(xml: &str, scope: &ScopeRule) -> Vec<Url> {
    let document = Html::parse_document(xml);
    let Ok(selector) = Selector::parse("loc") else {
        return Vec::new();
    };

    let mut urls: Vec<Url> = Vec::new();
    for element in document.select(&selector).take(MAX_SITEMAP_URLS) {
        let text = element.text().collect::<String>();
        let Ok(url) = normalize_url(text.trim()) else {
            continue;
        };
        if scope.allows(&url) && !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

/// Fetches /sitemap.xml on the start URL's origin
///
/// Best-effort: any failure yields an empty list.
pub async fn fetch_sitemap(client: &Client, start_url: &Url, scope: &ScopeRule) -> Vec<Url> {
    let Ok(sitemap_url) = start_url.join("/sitemap.xml") else {
        return Vec::new();
    };

    let response = match client.get(sitemap_url.as_str()).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            debug!("No sitemap at {} ({})", sitemap_url, response.status());
            return Vec::new();
        }
        Err(e) => {
            debug!("Sitemap fetch failed for {}: {}", sitemap_url, e);
            return Vec::new();
        }
    };

    match response.text().await {
        Ok(body) => parse_sitemap(&body, scope),
        Err(e) => {
            debug!("Sitemap body unreadable at {}: {}", sitemap_url, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::Scope;

    #[test]
    fn test_parse_sitemap() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/a</loc></url>
  <url><loc> https://example.com/b#frag </loc></url>
  <url><loc>https://example.com/a</loc></url>
  <url><loc>https://elsewhere.org/c</loc></url>
  <url><loc>not a url</loc></url>
</urlset>"#;
        let start = Url::parse("https://example.com/").unwrap();
        let rule = ScopeRule::new(Scope::Host, &start);

        let urls: Vec<String> = parse_sitemap(xml, &rule)
            .into_iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
    }
}
