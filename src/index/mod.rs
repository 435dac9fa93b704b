//! Index builder
//!
//! This module turns the stored documents into the structures the ranker and
//! the suggestion engine read:
//! - Postings (term -> doc id, term frequency)
//! - The IDF table
//! - Per-document token counts and their average

mod builder;
mod tokenizer;

pub use builder::{build_index, document_tokens, idf, Posting, SearchIndex};
pub use tokenizer::{query_terms, tokenize};
