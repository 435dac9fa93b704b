//! Hybrid ranking: BM25 x (alpha + beta * PageRank + title boost)

use super::bm25::{score_documents, Bm25Params};
use crate::index::{query_terms, tokenize, SearchIndex};

/// Blend weights for the hybrid score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankWeights {
    /// Constant share of the BM25 score
    pub alpha: f64,
    /// Weight of the normalized PageRank
    pub beta: f64,
    /// Weight of the title/URL match
    pub title_boost: f64,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            beta: 0.8,
            title_boost: 0.5,
        }
    }
}

/// A ranked document reference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedDoc {
    pub doc_id: usize,
    pub score: f64,
}

/// Scales values into [0, 1]; a flat vector maps to all zeros
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range < 1e-12 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / range).collect()
}

/// Mean title/URL match strength of the query terms, in [0, 1]
///
/// Per term: 1.0 for an exact title token, 0.8 when it is part of a title
/// token, 0.6 when it appears in the URL.
pub fn title_match(terms: &[String], title: &str, url: &str) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }

    let title_tokens = tokenize(title);
    let url = url.to_lowercase();

    let total: f64 = terms
        .iter()
        .map(|term| {
            if title_tokens.iter().any(|t| t == term) {
                1.0
            } else if title_tokens.iter().any(|t| t.contains(term.as_str())) {
                0.8
            } else if url.contains(term.as_str()) {
                0.6
            } else {
                0.0
            }
        })
        .sum();

    total / terms.len() as f64
}

/// Ranks the corpus against a query
///
/// # Arguments
///
/// * `index` - The inverted index
/// * `ranks` - PageRank per doc id
/// * `query` - Raw query text
/// * `weights` - Blend weights
/// * `k` - Maximum number of results
///
/// # Returns
///
/// At most `k` documents with a positive BM25 score, best first; equal
/// scores keep doc id order.
pub fn rank(
    index: &SearchIndex,
    ranks: &[f64],
    query: &str,
    weights: &RankWeights,
    k: usize,
) -> Vec<RankedDoc> {
    let terms = query_terms(query);
    if terms.is_empty() || index.is_empty() || k == 0 {
        return Vec::new();
    }

    let bm25 = score_documents(index, &terms, &Bm25Params::default());
    let pr_norm = min_max_normalize(ranks);

    let mut results: Vec<RankedDoc> = bm25
        .iter()
        .enumerate()
        .filter(|(_, &score)| score > 0.0)
        .map(|(doc_id, &score)| {
            let doc = &index.docs[doc_id];
            let pr = pr_norm.get(doc_id).copied().unwrap_or(0.0);
            let boost = title_match(&terms, &doc.title, &doc.url) * weights.title_boost;
            RankedDoc {
                doc_id,
                score: score * (weights.alpha + weights.beta * pr + boost),
            }
        })
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(k);
    results
}
