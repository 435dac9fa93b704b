//! Count-invalidated index cache
//!
//! The cached index is rebuilt from scratch whenever the document store's
//! count differs from the number of documents the cached index was built
//! from. There are no incremental updates.

use crate::index::{build_index, SearchIndex};
use crate::ranking::{compute_ranks, PageRankConfig};
use crate::storage::{Document, DocumentFilter, DocumentStore, StorageError, StorageResult};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// An index together with the PageRank vector over the same documents
#[derive(Debug, Default)]
pub struct Corpus {
    pub index: SearchIndex,
    /// PageRank per doc id of `index`
    pub ranks: Vec<f64>,
}

impl Corpus {
    pub fn build(docs: &[Document], pagerank: &PageRankConfig) -> Self {
        Self {
            index: build_index(docs),
            ranks: compute_ranks(docs, pagerank),
        }
    }
}

struct CachedCorpus {
    doc_count: u64,
    corpus: Arc<Corpus>,
}

#[derive(Default)]
pub struct IndexCache {
    pagerank: PageRankConfig,
    slot: Mutex<Option<CachedCorpus>>,
}

impl IndexCache {
    pub fn new(pagerank: PageRankConfig) -> Self {
        Self {
            pagerank,
            slot: Mutex::new(None),
        }
    }

    /// Returns an index consistent with the store's current document count
    pub fn get_or_build(&self, store: &dyn DocumentStore) -> StorageResult<Arc<Corpus>> {
        let filter = DocumentFilter::all();
        let current = store.count(&filter)?;

        let mut slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        if let Some(cached) = slot.as_ref() {
            if cached.doc_count == current {
                debug!("Serving cached index ({} documents)", current);
                return Ok(Arc::clone(&cached.corpus));
            }
        }

        let docs = store.find_all(&filter)?;
        let corpus = Arc::new(Corpus::build(&docs, &self.pagerank));
        info!(
            "Rebuilt index: {} documents, {} terms",
            docs.len(),
            corpus.index.vocab_size()
        );

        *slot = Some(CachedCorpus {
            doc_count: docs.len() as u64,
            corpus: Arc::clone(&corpus),
        });
        Ok(corpus)
    }

    /// Drops the cached index so the next lookup rebuilds it
    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}
