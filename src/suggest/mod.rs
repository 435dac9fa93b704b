//! Query suggestions
//!
//! Suggestions come from two sources:
//! - Document titles containing the typed prefix (shown first)
//! - Vocabulary terms, tiered from exact prefix match down to fuzzy
//!   in-order character match, common terms first within a tier

use crate::index::SearchIndex;
use std::cmp::Ordering;

/// Prefixes shorter than this produce no suggestions
pub const MIN_PREFIX_CHARS: usize = 2;

/// Minimum length of a prefix form before the looser tiers apply
const LOOSE_MATCH_CHARS: usize = 3;

/// How a vocabulary term matched the prefix; lower is better
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    /// Term starts with the prefix as typed
    Prefix = 0,
    /// Term starts with the prefix stripped to letters and digits
    SqueezedPrefix = 1,
    /// Term contains the prefix as typed
    Substring = 2,
    /// Term contains the squeezed prefix's characters in order
    Fuzzy = 3,
}

/// True if every char of `needle` appears in `haystack` in order
fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut rest = haystack.chars();
    needle.chars().all(|c| rest.any(|h| h == c))
}

fn squeeze(s: &str) -> String {
    s.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Best tier at which `term` matches, if any
pub fn match_tier(term: &str, raw: &str, squeezed: &str) -> Option<MatchTier> {
    let loose_squeezed = squeezed.chars().count() >= LOOSE_MATCH_CHARS;
    let loose_raw = raw.chars().count() >= LOOSE_MATCH_CHARS;

    if term.starts_with(raw) {
        Some(MatchTier::Prefix)
    } else if loose_squeezed && term.starts_with(squeezed) {
        Some(MatchTier::SqueezedPrefix)
    } else if loose_raw && term.contains(raw) {
        Some(MatchTier::Substring)
    } else if loose_squeezed && is_subsequence(squeezed, term) {
        Some(MatchTier::Fuzzy)
    } else {
        None
    }
}

/// Vocabulary terms matching the prefix, best first
fn matching_terms(index: &SearchIndex, raw: &str, squeezed: &str) -> Vec<String> {
    let mut matches: Vec<(MatchTier, f64, &str)> = index
        .idf
        .iter()
        .filter_map(|(term, &idf)| {
            match_tier(term, raw, squeezed).map(|tier| (tier, idf, term.as_str()))
        })
        .collect();

    matches.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            .then_with(|| a.2.cmp(b.2))
    });

    matches
        .into_iter()
        .map(|(_, _, term)| term.to_string())
        .collect()
}

/// Lowercased document titles containing the prefix, in doc id order
///
/// The cap is checked after a title is added, so a cap of 0 still yields the
/// first matching title.
fn matching_titles(index: &SearchIndex, raw: &str, squeezed: &str, cap: usize) -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();
    let loose_squeezed = squeezed.chars().count() >= LOOSE_MATCH_CHARS;
    for doc in &index.docs {
        let title = doc.title.to_lowercase();
        let matched =
            title.contains(raw) || (loose_squeezed && squeeze(&title).contains(squeezed));
        if matched && !titles.contains(&title) {
            titles.push(title);
            if titles.len() >= cap {
                break;
            }
        }
    }
    titles
}

/// Suggests completions for a partially typed query
///
/// # Arguments
///
/// * `index` - The current index
/// * `prefix` - What the user typed so far
/// * `limit` - Maximum number of suggestions
///
/// # Returns
///
/// Up to `limit / 2` matching titles (at least one when any title matches)
/// followed by vocabulary terms, deduplicated and capped at `limit`. Prefixes shorter than two characters
/// yield an empty list.
///
/// # Example
///
/// ```
/// use sumi_search::index::build_index;
/// use sumi_search::suggest::suggest;
///
/// let index = build_index(&[]);
/// assert!(suggest(&index, "f", 8).is_empty());
/// ```
pub fn suggest(index: &SearchIndex, prefix: &str, limit: usize) -> Vec<String> {
    let raw = prefix.trim().to_lowercase();
    if raw.chars().count() < MIN_PREFIX_CHARS || limit == 0 || index.is_empty() {
        return Vec::new();
    }
    let squeezed = squeeze(&raw);

    let mut terms = matching_terms(index, &raw, &squeezed);
    terms.truncate(limit * 2);
    let titles = matching_titles(index, &raw, &squeezed, limit / 2);

    let mut suggestions: Vec<String> = Vec::with_capacity(limit);
    for candidate in titles.into_iter().chain(terms) {
        if suggestions.len() >= limit {
            break;
        }
        if !suggestions.contains(&candidate) {
            suggestions.push(candidate);
        }
    }
    suggestions
}
