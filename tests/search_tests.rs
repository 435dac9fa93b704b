//! Integration tests for the query interface
//!
//! These tests run search, suggest and stats against real stores, and one
//! end-to-end crawl of a wiremock site followed by a query.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use sumi_search::config::{Config, SearchConfig};
use sumi_search::crawler::CrawlController;
use sumi_search::ranking::RankWeights;
use sumi_search::storage::{Document, DocumentStore, MemoryStorage, SqliteStorage};
use sumi_search::SearchEngine;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn document(url: &str, title: &str, text: &str, links: &[&str]) -> Document {
    Document {
        url: url.to_string(),
        title: title.to_string(),
        text: text.to_string(),
        snippet: text.to_string(),
        length: 0,
        depth: 0,
        parent_url: None,
        outbound_links: links.iter().map(|l| l.to_string()).collect(),
        crawled_at: Utc::now(),
    }
}

fn go_documents() -> Vec<Document> {
    vec![
        document(
            "https://go.dev/intro",
            "Intro to Go",
            "go channels goroutines",
            &["https://go.dev/channels"],
        ),
        document(
            "https://go.dev/channels",
            "Go Channels",
            "channels are great",
            &[],
        ),
    ]
}

#[test]
fn test_two_document_scenario_in_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SqliteStorage::new(&dir.path().join("search.db")).unwrap());
    for doc in go_documents() {
        assert!(storage.upsert_if_absent(&doc).unwrap());
    }

    let engine = SearchEngine::new(storage);
    let response = engine.search("go channels").unwrap();

    assert_eq!(response.query, "go channels");
    assert_eq!(response.total, 2);
    assert_eq!(response.results[0].url, "https://go.dev/channels");
    assert!(response.results[0].score >= response.results[1].score);
    assert_eq!(response.results[0].snippet, "channels are great");
}

#[test]
fn test_duplicate_upsert_keeps_first_document() {
    let store = Arc::new(MemoryStorage::new());
    let first = document("https://a.com/", "First", "original text", &[]);
    let second = document("https://a.com/", "Second", "replacement text", &[]);

    assert!(store.upsert_if_absent(&first).unwrap());
    assert!(!store.upsert_if_absent(&second).unwrap());

    let engine = SearchEngine::new(store);
    let response = engine.search("original").unwrap();
    assert_eq!(response.total, 1);
    assert_eq!(response.results[0].title, "First");
    assert_eq!(engine.search("replacement").unwrap().total, 0);
}

#[test]
fn test_search_with_custom_weights_and_k() {
    let store = Arc::new(MemoryStorage::new());
    for doc in go_documents() {
        store.upsert_if_absent(&doc).unwrap();
    }
    let engine = SearchEngine::new(store);

    let weights = RankWeights {
        alpha: 1.0,
        beta: 0.0,
        title_boost: 0.0,
    };
    let response = engine.search_with("channels", &weights, 1).unwrap();
    assert_eq!(response.total, 1);
    assert_eq!(response.results.len(), 1);
}

#[test]
fn test_configured_defaults_are_used() {
    let store = Arc::new(MemoryStorage::new());
    for doc in go_documents() {
        store.upsert_if_absent(&doc).unwrap();
    }
    let defaults = SearchConfig {
        k: 1,
        suggest_limit: 1,
        ..SearchConfig::default()
    };
    let engine = SearchEngine::with_config(store, defaults);

    assert_eq!(engine.search("go").unwrap().results.len(), 1);
    assert_eq!(engine.suggest("cha", None).unwrap().suggestions.len(), 1);
}

#[test]
fn test_suggestions_over_store() {
    let store = Arc::new(MemoryStorage::new());
    store
        .upsert_if_absent(&document("https://a.com/1", "Loops", "for format forloop", &[]))
        .unwrap();
    store
        .upsert_if_absent(&document("https://a.com/2", "Strings", "for format", &[]))
        .unwrap();
    store
        .upsert_if_absent(&document("https://a.com/3", "Misc", "for", &[]))
        .unwrap();

    let engine = SearchEngine::new(store);
    let suggestions = engine.suggest("for", Some(6)).unwrap().suggestions;
    assert_eq!(suggestions, vec!["for", "format", "forloop"]);

    assert!(engine.suggest("f", None).unwrap().suggestions.is_empty());
}

#[test]
fn test_stats_track_new_documents() {
    let store = Arc::new(MemoryStorage::new());
    let engine = SearchEngine::new(store.clone());

    let empty = engine.stats().unwrap();
    assert_eq!(empty.total_docs, 0);
    assert_eq!(empty.avg_doc_length, 0.0);
    assert_eq!(empty.vocab_size, 0);
    assert_eq!(engine.search("anything").unwrap().total, 0);

    store
        .upsert_if_absent(&document("https://a.com/", "Alpha", "beta gamma", &[]))
        .unwrap();

    // The index is rebuilt once the document count changes
    let stats = engine.stats().unwrap();
    assert_eq!(stats.total_docs, 1);
    assert_eq!(stats.vocab_size, 3);
    assert!((stats.avg_doc_length - 3.0).abs() < 1e-9);
    assert_eq!(engine.search("gamma").unwrap().total, 1);
}

#[tokio::test]
async fn test_crawl_then_search() {
    let server = MockServer::start().await;
    let pages = [
        (
            "/",
            "<html><head><title>Gardening</title></head><body><p>tomatoes and basil</p><a href=\"/soil\">soil</a></body></html>",
        ),
        (
            "/soil",
            "<html><head><title>Soil Guide</title><meta name=\"description\" content=\"All about compost\"></head><body><p>compost makes rich soil</p></body></html>",
        ),
    ];
    for (route, body) in pages {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
            .mount(&server)
            .await;
    }

    let mut config = Config::default();
    config.crawler.politeness_delay_ms = 10;
    let store = Arc::new(MemoryStorage::new());
    let controller = CrawlController::new(&config, store.clone(), store.clone()).unwrap();

    let id = controller
        .create_job(&format!("{}/", server.uri()), 2, 10)
        .await
        .unwrap();
    controller
        .process_batch(&id, 10, Duration::from_secs(8))
        .await
        .unwrap();

    let engine = SearchEngine::new(store);
    let response = engine.search("compost").unwrap();
    assert_eq!(response.total, 1);
    assert_eq!(response.results[0].title, "Soil Guide");
    assert_eq!(response.results[0].snippet, "All about compost");
    assert_eq!(response.results[0].url, format!("{}/soil", server.uri()));

    let stats = engine.stats().unwrap();
    assert_eq!(stats.total_docs, 2);
}
