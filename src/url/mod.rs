//! URL handling module for Sumi-Search
//!
//! This module provides URL normalization, host extraction and the crawl
//! scope rules that decide whether a URL belongs to the site being crawled.

mod domain;
mod normalize;

use crate::UrlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

pub use domain::{extract_host, registrable_domain};
pub use normalize::normalize_url;

/// Crawl scope policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Only URLs on exactly the start host
    #[default]
    Host,
    /// URLs on the start host's registrable domain, subdomains included
    Domain,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Domain => "domain",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "host" => Ok(Self::Host),
            "domain" => Ok(Self::Domain),
            other => Err(UrlError::UnknownScope(other.to_string())),
        }
    }
}

/// A scope policy anchored at the crawl's start URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_search::url::{Scope, ScopeRule};
///
/// let start = Url::parse("https://www.python.org/").unwrap();
/// let rule = ScopeRule::new(Scope::Domain, &start);
/// assert!(rule.allows(&Url::parse("https://docs.python.org/3/").unwrap()));
/// assert!(!rule.allows(&Url::parse("https://pypi.org/").unwrap()));
/// ```
#[derive(Debug, Clone)]
pub struct ScopeRule {
    scope: Scope,
    anchor: String,
}

impl ScopeRule {
    pub fn new(scope: Scope, start_url: &Url) -> Self {
        let host = extract_host(start_url).unwrap_or_default();
        let anchor = match scope {
            Scope::Host => host,
            Scope::Domain => registrable_domain(&host).to_string(),
        };
        Self { scope, anchor }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns true if the URL is an HTTP(S) URL inside this scope
    pub fn allows(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }
        let Some(host) = extract_host(url) else {
            return false;
        };
        match self.scope {
            Scope::Host => host == self.anchor,
            Scope::Domain => registrable_domain(&host) == self.anchor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_host_scope_exact_match() {
        let rule = ScopeRule::new(Scope::Host, &url("https://example.com/"));
        assert!(rule.allows(&url("https://example.com/page")));
        assert!(rule.allows(&url("http://example.com/other")));
        assert!(!rule.allows(&url("https://blog.example.com/")));
        assert!(!rule.allows(&url("https://other.com/")));
    }

    #[test]
    fn test_host_scope_ignores_port() {
        let rule = ScopeRule::new(Scope::Host, &url("http://127.0.0.1:4000/"));
        assert!(rule.allows(&url("http://127.0.0.1:4000/a")));
        assert!(rule.allows(&url("http://127.0.0.1:5000/a")));
    }

    #[test]
    fn test_domain_scope_includes_subdomains() {
        let rule = ScopeRule::new(Scope::Domain, &url("https://www.example.com/"));
        assert!(rule.allows(&url("https://example.com/")));
        assert!(rule.allows(&url("https://blog.example.com/post")));
        assert!(!rule.allows(&url("https://example.org/")));
    }

    #[test]
    fn test_non_http_rejected() {
        let rule = ScopeRule::new(Scope::Host, &url("https://example.com/"));
        assert!(!rule.allows(&url("ftp://example.com/file")));
    }

    #[test]
    fn test_scope_from_str() {
        assert_eq!("host".parse::<Scope>().unwrap(), Scope::Host);
        assert_eq!("DOMAIN".parse::<Scope>().unwrap(), Scope::Domain);
        assert!(matches!(
            "planet".parse::<Scope>(),
            Err(UrlError::UnknownScope(_))
        ));
    }
}
