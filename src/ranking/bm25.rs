//! BM25 term relevance

use crate::index::SearchIndex;

/// BM25 free parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term frequency saturation
    pub k1: f64,
    /// Length normalization strength
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Contribution of one term to one document's score
///
/// With an empty corpus average (`avgdl == 0`) every document counts as
/// average length.
pub fn term_score(idf: f64, tf: u32, doclen: usize, avgdl: f64, params: &Bm25Params) -> f64 {
    let tf = tf as f64;
    let length_ratio = if avgdl > 0.0 {
        doclen as f64 / avgdl
    } else {
        1.0
    };
    let norm = params.k1 * (1.0 - params.b + params.b * length_ratio);
    idf * tf * (params.k1 + 1.0) / (tf + norm)
}

/// Scores every document against the query terms
///
/// Returns one score per doc id; documents matching no term score 0.0.
pub fn score_documents(index: &SearchIndex, terms: &[String], params: &Bm25Params) -> Vec<f64> {
    let mut scores = vec![0.0; index.len()];

    for term in terms {
        let Some(postings) = index.postings.get(term) else {
            continue;
        };
        let idf = index.idf(term);
        for posting in postings {
            scores[posting.doc_id] += term_score(
                idf,
                posting.tf,
                index.doclen[posting.doc_id],
                index.avgdl,
                params,
            );
        }
    }

    scores
}
