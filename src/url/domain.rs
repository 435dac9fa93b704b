use url::Url;

/// Extracts the host from a URL, lowercased and without port
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_search::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8080/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the naive registrable domain of a host: its last two DNS labels
///
/// This is deliberately simple and treats `docs.python.org` and
/// `www.python.org` as the same site. It is wrong for multi-label public
/// suffixes such as `co.uk`, which is acceptable for single-site crawls.
pub fn registrable_domain(host: &str) -> &str {
    let mut dots = host.rmatch_indices('.');
    match (dots.next(), dots.next()) {
        (Some(_), Some((idx, _))) => &host[idx + 1..],
        _ => host,
    }
}
