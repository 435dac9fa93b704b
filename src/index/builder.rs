//! Inverted index construction
//!
//! The index is always rebuilt wholesale from the full document set.

use super::tokenize;
use crate::storage::Document;
use std::collections::HashMap;

/// One entry of a term's postings list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    /// Position of the document in `SearchIndex::docs`
    pub doc_id: usize,
    /// Occurrences of the term in the document
    pub tf: u32,
}

/// Postings, IDF table and length statistics over a document set
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    /// Indexed documents; a document's position is its doc id
    pub docs: Vec<Document>,
    /// term -> postings in ascending doc id order
    pub postings: HashMap<String, Vec<Posting>>,
    /// term -> inverse document frequency
    pub idf: HashMap<String, f64>,
    /// Token count per doc id
    pub doclen: Vec<usize>,
    /// Mean of `doclen`, 0.0 for an empty index
    pub avgdl: f64,
}

impl SearchIndex {
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Number of distinct terms
    pub fn vocab_size(&self) -> usize {
        self.postings.len()
    }

    pub fn idf(&self, term: &str) -> f64 {
        self.idf.get(term).copied().unwrap_or(0.0)
    }
}

/// Inverse document frequency with the +1 smoothing that keeps it positive
///
/// `ln((N - df + 0.5) / (df + 0.5) + 1)`
pub fn idf(total_docs: usize, doc_freq: usize) -> f64 {
    let n = total_docs as f64;
    let df = doc_freq as f64;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Tokens indexed for a document: title plus the text, or the snippet when
/// the text is empty
pub fn document_tokens(doc: &Document) -> Vec<String> {
    let body = if doc.text.is_empty() {
        &doc.snippet
    } else {
        &doc.text
    };
    let mut tokens = tokenize(&doc.title);
    tokens.extend(tokenize(body));
    tokens
}

/// Builds the inverted index over the given documents
///
/// Doc ids are positions in `docs`, so callers that keep insertion order get
/// stable ids and stable tie-breaking.
pub fn build_index(docs: &[Document]) -> SearchIndex {
    let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
    let mut doclen = Vec::with_capacity(docs.len());

    for (doc_id, doc) in docs.iter().enumerate() {
        let tokens = document_tokens(doc);
        doclen.push(tokens.len());

        let mut tf: HashMap<String, u32> = HashMap::new();
        for token in tokens {
            *tf.entry(token).or_insert(0) += 1;
        }
        for (term, count) in tf {
            postings
                .entry(term)
                .or_default()
                .push(Posting { doc_id, tf: count });
        }
    }

    let total_docs = docs.len();
    let idf_table = postings
        .iter()
        .map(|(term, list)| (term.clone(), idf(total_docs, list.len())))
        .collect();

    let avgdl = if total_docs == 0 {
        0.0
    } else {
        doclen.iter().sum::<usize>() as f64 / total_docs as f64
    };

    SearchIndex {
        docs: docs.to_vec(),
        postings,
        idf: idf_table,
        doclen,
        avgdl,
    }
}
