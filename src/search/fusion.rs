use std::collections::HashMap;

use crate::config::FusionConfig;
use crate::models::{FusedResult, RetrievalCandidate};

/// Weighted two-source fusion with an agreement bonus.
///
/// Pipeline:
/// 1. Key candidates by product id. Semantic candidates keep their best
///    similarity; graph candidates contribute the flat `graph_base_score`.
/// 2. `combined = semantic_weight * semantic + graph_weight * graph`, plus
///    `diversity_bonus` when both sources found the product.
/// 3. Drop products below the minimum semantic score, if one is set.
/// 4. Sort by combined score, then semantic score, then agreement, then the
///    order the semantic backend returned (graph-only products after, in graph order).
/// 5. Keep the top `limit`.
pub fn fuse(
    semantic: &[RetrievalCandidate],
    graph: &[RetrievalCandidate],
    config: &FusionConfig,
    min_semantic_score: Option<f64>,
    limit: usize,
) -> Vec<FusedResult> {
    struct Entry {
        semantic_score: f64,
        in_semantic: bool,
        in_graph: bool,
        // Position in semantic order, or after all semantic ids for graph-only products.
        order: usize,
    }

    let mut score_map: HashMap<&str, Entry> = HashMap::new();

    for (rank, candidate) in semantic.iter().enumerate() {
        let entry = score_map
            .entry(candidate.product_id.as_str())
            .or_insert(Entry {
                semantic_score: 0.0,
                in_semantic: false,
                in_graph: false,
                order: rank,
            });
        entry.semantic_score = if entry.in_semantic {
            entry.semantic_score.max(candidate.source_score)
        } else {
            candidate.source_score
        };
        entry.in_semantic = true;
    }

    for (rank, candidate) in graph.iter().enumerate() {
        let entry = score_map
            .entry(candidate.product_id.as_str())
            .or_insert(Entry {
                semantic_score: 0.0,
                in_semantic: false,
                in_graph: false,
                order: semantic.len() + rank,
            });
        entry.in_graph = true;
    }

    let mut ranked: Vec<(usize, FusedResult)> = score_map
        .into_iter()
        .filter(|(_, e)| min_semantic_score.map_or(true, |min| e.semantic_score >= min))
        .map(|(id, e)| {
            let graph_score = if e.in_graph { config.graph_base_score } else { 0.0 };
            let found_in_both = e.in_semantic && e.in_graph;
            let combined_score =
                combined_score(config, e.semantic_score, graph_score, found_in_both);
            (
                e.order,
                FusedResult {
                    product_id: id.to_string(),
                    semantic_score: e.semantic_score,
                    graph_score,
                    found_in_both,
                    combined_score,
                },
            )
        })
        .collect();

    ranked.sort_by(|(order_a, a), (order_b, b)| {
        b.combined_score
            .total_cmp(&a.combined_score)
            .then_with(|| b.semantic_score.total_cmp(&a.semantic_score))
            .then_with(|| b.found_in_both.cmp(&a.found_in_both))
            .then_with(|| order_a.cmp(order_b))
    });
    ranked.truncate(limit);
    ranked.into_iter().map(|(_, r)| r).collect()
}

/// Combined rank score for one product.
pub fn combined_score(
    config: &FusionConfig,
    semantic_score: f64,
    graph_score: f64,
    found_in_both: bool,
) -> f64 {
    let bonus = if found_in_both { config.diversity_bonus } else { 0.0 };
    config.semantic_weight * semantic_score + config.graph_weight * graph_score + bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn semantic(id: &str, score: f64) -> RetrievalCandidate {
        RetrievalCandidate {
            product_id: id.to_string(),
            source_score: score,
            source: Source::Semantic,
        }
    }

    fn graph(id: &str) -> RetrievalCandidate {
        RetrievalCandidate {
            product_id: id.to_string(),
            source_score: 1.0,
            source: Source::Graph,
        }
    }

    fn is_ranked(results: &[FusedResult]) -> bool {
        results
            .windows(2)
            .all(|w| w[0].combined_score >= w[1].combined_score)
    }

    fn ids(results: &[FusedResult]) -> Vec<&str> {
        results.iter().map(|r| r.product_id.as_str()).collect()
    }

    #[test]
    fn test_empty_inputs() {
        let results = fuse(&[], &[], &FusionConfig::default(), None, 10);
        assert!(results.is_empty());
    }

    #[test]
    fn test_found_in_both_gets_bonus() {
        let results = fuse(
            &[semantic("p1", 0.8)],
            &[graph("p1")],
            &FusionConfig::default(),
            None,
            10,
        );
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert!(r.found_in_both);
        assert_eq!(r.graph_score, 1.0);
        assert!((r.combined_score - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_graph_only_scores_half() {
        let results = fuse(&[], &[graph("g1")], &FusionConfig::default(), None, 10);
        let r = &results[0];
        assert_eq!(r.semantic_score, 0.0);
        assert!(!r.found_in_both);
        assert!((r.combined_score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_semantic_only_has_zero_graph_score() {
        let results = fuse(&[semantic("s1", 0.6)], &[], &FusionConfig::default(), None, 10);
        let r = &results[0];
        assert_eq!(r.graph_score, 0.0);
        assert!((r.combined_score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_sets_sort_by_combined_without_bonus() {
        let results = fuse(
            &[semantic("a", 0.9), semantic("b", 0.4)],
            &[graph("c"), graph("d")],
            &FusionConfig::default(),
            None,
            10,
        );
        assert!(results.iter().all(|r| !r.found_in_both));
        assert!(is_ranked(&results));
        // a: 0.45, c: 0.5, d: 0.5, b: 0.2; c before d by graph order
        assert_eq!(ids(&results), vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn test_tie_prefers_higher_semantic_score() {
        // x: semantic 1.0 only -> 0.5; y: graph only -> 0.5
        let results = fuse(
            &[semantic("x", 1.0)],
            &[graph("y")],
            &FusionConfig::default(),
            None,
            10,
        );
        assert_eq!(ids(&results), vec!["x", "y"]);
    }

    #[test]
    fn test_tie_prefers_found_in_both() {
        let config = FusionConfig {
            semantic_weight: 0.5,
            graph_weight: 0.0,
            diversity_bonus: 0.0,
            ..FusionConfig::default()
        };
        let results = fuse(
            &[semantic("solo", 0.7), semantic("both", 0.7)],
            &[graph("both")],
            &config,
            None,
            10,
        );
        assert_eq!(ids(&results), vec!["both", "solo"]);
    }

    #[test]
    fn test_full_tie_keeps_semantic_order() {
        let results = fuse(
            &[semantic("first", 0.5), semantic("second", 0.5), semantic("third", 0.5)],
            &[],
            &FusionConfig::default(),
            None,
            10,
        );
        assert_eq!(ids(&results), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_duplicate_semantic_ids_keep_max() {
        let results = fuse(
            &[semantic("p", 0.3), semantic("p", 0.9)],
            &[],
            &FusionConfig::default(),
            None,
            10,
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].semantic_score, 0.9);
    }

    #[test]
    fn test_duplicate_graph_ids_dedup() {
        let results = fuse(&[], &[graph("g"), graph("g")], &FusionConfig::default(), None, 10);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_min_semantic_score_excludes_before_ranking() {
        let results = fuse(
            &[semantic("strong", 0.8), semantic("weak", 0.2)],
            &[graph("weak"), graph("graph_only")],
            &FusionConfig::default(),
            Some(0.3),
            10,
        );
        // weak would score 0.65 but is filtered; graph_only has semantic 0.
        assert_eq!(ids(&results), vec!["strong"]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let results = fuse(&[semantic("edge", 0.3)], &[], &FusionConfig::default(), Some(0.3), 10);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_limit_respected() {
        let candidates: Vec<_> = (0..50)
            .map(|i| semantic(&format!("p{i}"), 1.0 - i as f64 * 0.01))
            .collect();
        let results = fuse(&candidates, &[], &FusionConfig::default(), None, 5);
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].product_id, "p0");
    }

    #[test]
    fn test_custom_weights() {
        let config = FusionConfig {
            semantic_weight: 0.8,
            graph_weight: 0.2,
            diversity_bonus: 0.1,
            graph_base_score: 1.0,
            min_semantic_score: None,
        };
        let results = fuse(&[semantic("p", 0.5)], &[graph("p")], &config, None, 10);
        assert!((results[0].combined_score - (0.4 + 0.2 + 0.1)).abs() < 1e-9);
    }

    #[test]
    fn test_fusion_is_deterministic() {
        let sem: Vec<_> = (0..20)
            .map(|i| semantic(&format!("s{i}"), if i % 3 == 0 { 0.5 } else { 0.7 }))
            .collect();
        let gr: Vec<_> = (0..20).step_by(2).map(|i| graph(&format!("s{i}"))).collect();
        let config = FusionConfig::default();

        let first = serde_json::to_string(&fuse(&sem, &gr, &config, None, 20)).unwrap();
        for _ in 0..10 {
            let again = serde_json::to_string(&fuse(&sem, &gr, &config, None, 20)).unwrap();
            assert_eq!(first, again);
        }
    }
}
