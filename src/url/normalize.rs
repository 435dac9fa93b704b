use crate::UrlError;
use url::Url;

/// Normalizes a URL according to Sumi-Search's normalization rules
///
/// Every URL that crosses a crawl boundary (enqueue, fetch, store, link
/// resolution) goes through this function, so two URLs that differ only by
/// the features below end up as the same node.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Lowercase the scheme and host
/// 3. Strip the default port (80 for http, 443 for https)
/// 4. Normalize path:
///    - Remove dot segments (. and ..) as if resolved against `/`
///    - Keep repeated slashes as they are
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
/// 6. Sort query parameters, dropping empty ones
/// 7. Remove empty query string (trailing ?)
///
/// The function is idempotent: normalizing an already normalized URL returns
/// it unchanged.
///
/// # Examples
///
/// ```
/// use sumi_search::url::normalize_url;
///
/// let url = normalize_url("HTTP://Example.COM:80/a/../b?z=1&a=2#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/b?a=2&z=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    // The url crate already lowercases the scheme for us
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    if url.port().is_some() && url.port() == default_port(url.scheme()) {
        url.set_port(None)
            .map_err(|_| UrlError::Malformed("Failed to strip default port".to_string()))?;
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    let sorted_query = url.query().map(sort_query);
    match sorted_query {
        Some(query) if !query.is_empty() => url.set_query(Some(&query)),
        _ => url.set_query(None),
    }

    Ok(url)
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// Resolves a path against `/`, removing dot segments
///
/// Empty segments are kept: `/a//b` and `/a/b` may be different resources.
/// A trailing slash is significant on most servers and is kept too.
fn normalize_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }

    let parts: Vec<&str> = path.strip_prefix('/').unwrap_or(path).split('/').collect();
    let last = parts.len() - 1;
    let mut segments: Vec<&str> = Vec::with_capacity(parts.len());
    for (i, segment) in parts.into_iter().enumerate() {
        match segment {
            "." => {}
            ".." => {
                segments.pop();
            }
            _ => {
                segments.push(segment);
                continue;
            }
        }
        // A dot segment at the end leaves a directory path
        if i == last {
            segments.push("");
        }
    }

    format!("/{}", segments.join("/"))
}

/// Sorts the raw `key=value` pairs of a query string
///
/// Pairs are compared as raw (still percent-encoded) strings so that the
/// result never re-encodes anything and normalization stays idempotent.
fn sort_query(query: &str) -> String {
    let mut pairs: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
    pairs.sort_unstable();
    pairs.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_http_port_removed() {
        let a = normalize_url("http://a.com:80/x").unwrap();
        let b = normalize_url("http://a.com/x").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "http://a.com/x");
    }

    #[test]
    fn test_default_https_port_removed() {
        let result = normalize_url("https://a.com:443/x").unwrap();
        assert_eq!(result.as_str(), "https://a.com/x");
    }

    #[test]
    fn test_non_default_port_kept() {
        let result = normalize_url("http://a.com:8080/x").unwrap();
        assert_eq!(result.as_str(), "http://a.com:8080/x");
    }

    #[test]
    fn test_scheme_not_upgraded() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.scheme(), "http");
    }

    #[test]
    fn test_lowercase_host_keeps_path_case() {
        let result = normalize_url("HTTPS://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_sort_query_params() {
        let result = normalize_url("https://example.com/page?b=2&a=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?a=1&b=2");
    }

    #[test]
    fn test_empty_query_removed() {
        let result = normalize_url("https://example.com/page?").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");

        let result = normalize_url("https://example.com/page?&&").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_dot_segments() {
        let result = normalize_url("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_parent_directory_at_root() {
        let result = normalize_url("https://example.com/../page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_trailing_slash_kept() {
        let result = normalize_url("https://example.com/docs/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/docs/");
    }

    #[test]
    fn test_repeated_slashes_kept() {
        let result = normalize_url("https://example.com/a//b").unwrap();
        assert_eq!(result.as_str(), "https://example.com/a//b");
        assert_ne!(result, normalize_url("https://example.com/a/b").unwrap());

        assert_eq!(normalize_path("/a//../b"), "/a/b");
        assert_eq!(normalize_path("/a/b/.."), "/a/");
        assert_eq!(normalize_path("/.."), "/");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_url("not a url").is_err());
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "HTTP://WWW.Example.COM:80/a/./b/../c/?z=%26&a=1#frag",
            "https://example.com:443",
            "https://example.com/docs//guide/",
            "http://example.com:8080/x?b=&a=",
            "https://example.com/search?q=rust+lang&page=2",
            "https://example.com/%7Euser/",
        ];
        for input in inputs {
            let once = normalize_url(input).unwrap();
            let twice = normalize_url(once.as_str()).unwrap();
            assert_eq!(once, twice, "normalization not idempotent for {}", input);
        }
    }
}
