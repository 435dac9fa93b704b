//! PageRank over the crawled link graph
//!
//! Nodes are stored documents; an edge A -> B exists when B's URL appears in
//! A's outbound links. Links to URLs that were never stored are ignored.

use crate::storage::Document;
use std::collections::HashMap;

/// Parameters of the power iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRankConfig {
    pub damping: f64,
    pub max_iterations: usize,
    /// Iteration stops once the summed absolute change drops below this
    pub tolerance: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

/// Builds the deduplicated, self-loop-free adjacency list over doc ids
fn build_graph(docs: &[Document]) -> Vec<Vec<usize>> {
    let ids: HashMap<&str, usize> = docs
        .iter()
        .enumerate()
        .map(|(id, doc)| (doc.url.as_str(), id))
        .collect();

    docs.iter()
        .enumerate()
        .map(|(source, doc)| {
            let mut targets: Vec<usize> = Vec::new();
            for link in &doc.outbound_links {
                if let Some(&target) = ids.get(link.as_str()) {
                    if target != source && !targets.contains(&target) {
                        targets.push(target);
                    }
                }
            }
            targets
        })
        .collect()
}

/// Computes an authority score per document, indexed by doc id
///
/// Sinks (documents without known outbound links) spread their rank evenly
/// over all documents, damped like any other link, so the vector keeps
/// summing to 1.
///
/// # Arguments
///
/// * `docs` - The documents in doc id order
/// * `config` - Damping factor and stopping criteria
///
/// # Returns
///
/// One score per document; empty for an empty corpus
pub fn compute_ranks(docs: &[Document], config: &PageRankConfig) -> Vec<f64> {
    let n = docs.len();
    if n == 0 {
        return Vec::new();
    }

    let graph = build_graph(docs);
    let n_f = n as f64;
    let d = config.damping;
    let mut ranks = vec![1.0 / n_f; n];

    for _ in 0..config.max_iterations {
        let sink_sum: f64 = graph
            .iter()
            .zip(&ranks)
            .filter(|(targets, _)| targets.is_empty())
            .map(|(_, rank)| rank)
            .sum();

        let base = (1.0 - d) / n_f + d * sink_sum / n_f;
        let mut next = vec![base; n];

        for (source, targets) in graph.iter().enumerate() {
            if targets.is_empty() {
                continue;
            }
            let share = d * ranks[source] / targets.len() as f64;
            for &target in targets {
                next[target] += share;
            }
        }

        let delta: f64 = next
            .iter()
            .zip(&ranks)
            .map(|(new, old)| (new - old).abs())
            .sum();
        ranks = next;

        if delta < config.tolerance {
            break;
        }
    }

    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(url: &str, links: &[&str]) -> Document {
        Document {
            url: url.to_string(),
            title: String::new(),
            text: String::new(),
            snippet: String::new(),
            length: 0,
            depth: 0,
            parent_url: None,
            outbound_links: links.iter().map(|l| l.to_string()).collect(),
            crawled_at: Utc::now(),
        }
    }

    fn total(ranks: &[f64]) -> f64 {
        ranks.iter().sum()
    }

    #[test]
    fn test_empty_corpus() {
        assert!(compute_ranks(&[], &PageRankConfig::default()).is_empty());
    }

    #[test]
    fn test_single_document() {
        let ranks = compute_ranks(&[doc("a", &[])], &PageRankConfig::default());
        assert_eq!(ranks.len(), 1);
        assert!((ranks[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ranks_sum_to_one() {
        let docs = vec![
            doc("a", &["b", "c"]),
            doc("b", &["c"]),
            doc("c", &["a"]),
            doc("d", &["c", "unknown"]),
            doc("e", &[]),
        ];
        let ranks = compute_ranks(&docs, &PageRankConfig::default());
        assert!((total(&ranks) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_linked_page_outranks_linker() {
        let docs = vec![doc("a", &["b"]), doc("b", &[])];
        let ranks = compute_ranks(&docs, &PageRankConfig::default());
        assert!(ranks[1] > ranks[0]);
        assert!((total(&ranks) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_self_loops_and_duplicates_ignored() {
        let plain = vec![doc("a", &["b"]), doc("b", &["a"])];
        let noisy = vec![doc("a", &["a", "b", "b"]), doc("b", &["a", "b"])];
        let config = PageRankConfig::default();
        assert_eq!(compute_ranks(&plain, &config), compute_ranks(&noisy, &config));
    }

    #[test]
    fn test_hub_collects_most_rank() {
        let docs = vec![
            doc("hub", &[]),
            doc("x", &["hub"]),
            doc("y", &["hub"]),
            doc("z", &["hub"]),
        ];
        let ranks = compute_ranks(&docs, &PageRankConfig::default());
        assert!(ranks[1..].iter().all(|&r| ranks[0] > r));
    }
}
