//! Ranking module
//!
//! This module holds the scoring pieces combined at query time:
//! - PageRank authority over the crawled link graph
//! - BM25 term relevance
//! - The hybrid blend with the title/URL boost and top-k selection

mod bm25;
mod hybrid;
mod pagerank;

pub use bm25::{score_documents, term_score, Bm25Params};
pub use hybrid::{min_max_normalize, rank, title_match, RankWeights, RankedDoc};
pub use pagerank::{compute_ranks, PageRankConfig};
