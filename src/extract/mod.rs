//! Content extraction from fetched HTML
//!
//! This module reduces an HTML page to the parts the index cares about:
//! - The page title (from the first `<title>` tag)
//! - Whitespace-normalized visible text, without script/style/noscript content
//! - A short snippet (meta description or the start of the text)
//! - Outbound links, resolved, normalized and filtered to the crawl scope

use crate::url::{normalize_url, ScopeRule};
use scraper::{Html, Node, Selector};
use url::Url;

/// Maximum number of characters of visible text kept per page
pub const MAX_TEXT_CHARS: usize = 5000;

/// Maximum number of characters in a snippet
pub const MAX_SNIPPET_CHARS: usize = 200;

/// Maximum number of anchors considered per page
pub const MAX_LINKS: usize = 20;

/// Elements whose text never counts as visible page text
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "title"];

/// The reduced form of an HTML page
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub title: String,
    pub text: String,
    pub snippet: String,
    /// Normalized, in-scope, deduplicated outbound links in document order
    pub links: Vec<Url>,
}

/// Extracts title, text, snippet and outbound links from an HTML page
///
/// # Arguments
///
/// * `html` - The decoded HTML content
/// * `base_url` - The final URL of the page, used to resolve relative links
/// * `scope` - The crawl scope; out-of-scope links are dropped
///
/// # Returns
///
/// * `Some(Extracted)` - The page has visible text
/// * `None` - Nothing worth indexing; the crawler treats this as a failed fetch
///
/// # Example
///
/// ```
/// use sumi_search::extract::extract;
/// use sumi_search::url::{Scope, ScopeRule};
/// use url::Url;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let rule = ScopeRule::new(Scope::Host, &base);
/// let html = r#"<html><head><title>Home</title></head><body><p>Hello</p><a href="/a">A</a></body></html>"#;
/// let page = extract(html, &base, &rule).unwrap();
/// assert_eq!(page.title, "Home");
/// assert_eq!(page.text, "Hello A");
/// assert_eq!(page.links[0].as_str(), "https://example.com/a");
/// ```
pub fn extract(html: &str, base_url: &Url, scope: &ScopeRule) -> Option<Extracted> {
    let document = Html::parse_document(html);

    let text = truncate_chars(&visible_text(&document), MAX_TEXT_CHARS);
    if text.is_empty() {
        return None;
    }

    let title = extract_title(&document).unwrap_or_else(|| base_url.to_string());

    let snippet = match meta_description(&document) {
        Some(description) => truncate_chars(&description, MAX_SNIPPET_CHARS),
        None => truncate_chars(&text, MAX_SNIPPET_CHARS),
    };

    let links = extract_links(&document, base_url, scope);

    Some(Extracted {
        title,
        text,
        snippet,
        links,
    })
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .find(|s| !s.is_empty())
}

/// Collects text nodes that are not inside a hidden element
fn visible_text(document: &Html) -> String {
    let mut pieces: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|element| HIDDEN_ELEMENTS.contains(&element.name()))
                .unwrap_or(false)
        });

        if !hidden {
            pieces.push(text);
        }
    }

    collapse_whitespace(&pieces.join(" "))
}

/// Resolves, normalizes and scope-filters the first anchors of the page
fn extract_links(document: &Html, base_url: &Url, scope: &ScopeRule) -> Vec<Url> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links: Vec<Url> = Vec::new();
    for element in document.select(&a_selector).take(MAX_LINKS) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(url) = resolve_link(href, base_url) else {
            continue;
        };
        if scope.allows(&url) && !links.contains(&url) {
            links.push(url);
        }
    }
    links
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid or non-HTTP(S) URLs
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    normalize_url(absolute.as_str()).ok()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::Scope;

    fn base_url() -> Url {
        Url::parse("https://example.com/docs/page").unwrap()
    }

    fn host_rule() -> ScopeRule {
        ScopeRule::new(Scope::Host, &base_url())
    }

    #[test]
    fn test_extract_title_and_text() {
        let html = r#"<html><head><title>  Test   Page </title></head>
            <body><h1>Heading</h1><p>Some   body
            text.</p></body></html>"#;
        let page = extract(html, &base_url(), &host_rule()).unwrap();
        assert_eq!(page.title, "Test Page");
        assert_eq!(page.text, "Heading Some body text.");
    }

    #[test]
    fn test_title_falls_back_to_url() {
        let html = r#"<html><body><p>content</p></body></html>"#;
        let page = extract(html, &base_url(), &host_rule()).unwrap();
        assert_eq!(page.title, "https://example.com/docs/page");
    }

    #[test]
    fn test_hidden_elements_are_stripped() {
        let html = r#"<html><head><style>body { color: red }</style>
            <script>var x = 1;</script></head>
            <body><noscript>enable js</noscript><p>visible</p>
            <script>alert("hi")</script></body></html>"#;
        let page = extract(html, &base_url(), &host_rule()).unwrap();
        assert_eq!(page.text, "visible");
    }

    #[test]
    fn test_empty_text_yields_no_document() {
        let html = r#"<html><head><title>Only a title</title></head><body>
            <script>var x = 1;</script></body></html>"#;
        assert!(extract(html, &base_url(), &host_rule()).is_none());
    }

    #[test]
    fn test_text_is_truncated() {
        let body = "word ".repeat(2000);
        let html = format!("<html><body><p>{}</p></body></html>", body);
        let page = extract(&html, &base_url(), &host_rule()).unwrap();
        assert_eq!(page.text.chars().count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn test_snippet_prefers_meta_description() {
        let html = r#"<html><head><meta name="description" content="A short summary">
            </head><body><p>Long body text</p></body></html>"#;
        let page = extract(html, &base_url(), &host_rule()).unwrap();
        assert_eq!(page.snippet, "A short summary");
    }

    #[test]
    fn test_snippet_falls_back_to_text() {
        let body = "x".repeat(500);
        let html = format!("<html><body><p>{}</p></body></html>", body);
        let page = extract(&html, &base_url(), &host_rule()).unwrap();
        assert_eq!(page.snippet.chars().count(), MAX_SNIPPET_CHARS);
    }

    #[test]
    fn test_links_resolved_normalized_and_scoped() {
        let html = r##"<html><body><p>links</p>
            <a href="other">Relative</a>
            <a href="/abs?b=2&amp;a=1#frag">Absolute</a>
            <a href="https://EXAMPLE.com:443/abs?a=1&amp;b=2">Duplicate</a>
            <a href="https://elsewhere.org/">Out of scope</a>
            <a href="mailto:me@example.com">Mail</a>
            <a href="javascript:void(0)">JS</a>
            <a href="#top">Anchor</a>
            </body></html>"##;
        let page = extract(html, &base_url(), &host_rule()).unwrap();
        let links: Vec<&str> = page.links.iter().map(|u| u.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/docs/other",
                "https://example.com/abs?a=1&b=2"
            ]
        );
    }

    #[test]
    fn test_only_first_anchors_considered() {
        let anchors: String = (0..30)
            .map(|i| format!(r#"<a href="/p{}">p</a>"#, i))
            .collect();
        let html = format!("<html><body>{}</body></html>", anchors);
        let page = extract(&html, &base_url(), &host_rule()).unwrap();
        assert_eq!(page.links.len(), MAX_LINKS);
        assert_eq!(page.links[0].as_str(), "https://example.com/p0");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
