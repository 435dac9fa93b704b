//! Query-time interface
//!
//! `SearchEngine` answers search, suggestion and statistics requests over the
//! document store. It keeps one cached index and rebuilds it whenever the
//! store's document count changes.

mod cache;

pub use cache::{Corpus, IndexCache};

use crate::config::SearchConfig;
use crate::ranking::{rank, PageRankConfig, RankWeights};
use crate::storage::{DocumentStore, StorageError};
use crate::suggest::suggest;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Errors returned by the query interface
///
/// A query matching nothing is not an error; it is an empty result.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search unavailable: {0}")]
    Unavailable(#[from] StorageError),
}

/// One ranked result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub score: f64,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub total: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total_docs: usize,
    pub avg_doc_length: f64,
    pub vocab_size: usize,
}

/// Search, suggest and stats over a document store
pub struct SearchEngine {
    store: Arc<dyn DocumentStore>,
    cache: IndexCache,
    defaults: SearchConfig,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, SearchConfig::default())
    }

    pub fn with_config(store: Arc<dyn DocumentStore>, defaults: SearchConfig) -> Self {
        Self {
            store,
            cache: IndexCache::new(PageRankConfig::default()),
            defaults,
        }
    }

    fn corpus(&self) -> Result<Arc<Corpus>, SearchError> {
        self.cache.get_or_build(self.store.as_ref()).map_err(|e| {
            warn!("Index unavailable: {}", e);
            SearchError::Unavailable(e)
        })
    }

    /// Searches with the configured weights and result count
    pub fn search(&self, query: &str) -> Result<SearchResponse, SearchError> {
        self.search_with(query, &self.defaults.weights(), self.defaults.k)
    }

    /// Searches with explicit weights and result count
    ///
    /// # Arguments
    ///
    /// * `query` - Raw query text
    /// * `weights` - alpha, beta and title boost of the hybrid score
    /// * `k` - Maximum number of results
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - Ranked results, possibly empty
    /// * `Err(SearchError::Unavailable)` - The document store failed
    pub fn search_with(
        &self,
        query: &str,
        weights: &RankWeights,
        k: usize,
    ) -> Result<SearchResponse, SearchError> {
        let corpus = self.corpus()?;
        let ranked = rank(&corpus.index, &corpus.ranks, query, weights, k);

        let results: Vec<SearchHit> = ranked
            .into_iter()
            .map(|hit| {
                let doc = &corpus.index.docs[hit.doc_id];
                SearchHit {
                    url: doc.url.clone(),
                    title: doc.title.clone(),
                    snippet: doc.snippet.clone(),
                    score: hit.score,
                    length: doc.length,
                }
            })
            .collect();

        Ok(SearchResponse {
            query: query.to_string(),
            total: results.len(),
            results,
        })
    }

    /// Suggests completions, at most `limit` (or the configured default)
    pub fn suggest(
        &self,
        prefix: &str,
        limit: Option<usize>,
    ) -> Result<SuggestResponse, SearchError> {
        let corpus = self.corpus()?;
        let limit = limit.unwrap_or(self.defaults.suggest_limit);
        Ok(SuggestResponse {
            suggestions: suggest(&corpus.index, prefix, limit),
        })
    }

    /// Size statistics of the current index
    pub fn stats(&self) -> Result<IndexStats, SearchError> {
        let corpus = self.corpus()?;
        Ok(IndexStats {
            total_docs: corpus.index.len(),
            avg_doc_length: corpus.index.avgdl,
            vocab_size: corpus.index.vocab_size(),
        })
    }
}
