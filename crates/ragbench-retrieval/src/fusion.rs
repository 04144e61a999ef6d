//! Score fusion for hybrid search.

use std::cmp::Ordering;
use std::collections::HashMap;

use ragbench_protocols::SearchResult;

/// Sort by score descending. Ties keep their input order.
pub(crate) fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Weighted linear fusion keyed by result id.
///
/// Semantic scores are multiplied by `semantic_weight`, keyword scores by
/// `keyword_weight`. An id present in both lists gets the sum and keeps the
/// semantic hit's content and metadata. Scores are not renormalized.
pub fn weighted_fusion(
    semantic: Vec<SearchResult>,
    keyword: Vec<SearchResult>,
    semantic_weight: f32,
    keyword_weight: f32,
    top_k: usize,
) -> Vec<SearchResult> {
    let mut fused: Vec<SearchResult> = Vec::with_capacity(semantic.len() + keyword.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for mut result in semantic {
        // Duplicate ids within one list: keep the first
        if positions.contains_key(&result.id) {
            continue;
        }
        result.score *= semantic_weight;
        positions.insert(result.id.clone(), fused.len());
        fused.push(result);
    }

    for mut result in keyword {
        let weighted = result.score * keyword_weight;
        match positions.get(&result.id) {
            Some(&idx) => fused[idx].score += weighted,
            None => {
                result.score = weighted;
                positions.insert(result.id.clone(), fused.len());
                fused.push(result);
            }
        }
    }

    sort_by_score(&mut fused);
    fused.truncate(top_k);
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, score: f32, source: &str) -> SearchResult {
        SearchResult::new(id, score, format!("content {}", id), source)
    }

    #[test]
    fn test_overlapping_ids_sum() {
        let fused = weighted_fusion(
            vec![hit("a", 0.9, "vector")],
            vec![hit("a", 0.5, "chunks")],
            0.6,
            0.4,
            10,
        );
        assert_eq!(fused.len(), 1);
        assert!((fused[0].score - (0.6 * 0.9 + 0.4 * 0.5)).abs() < 1e-6);
        assert_eq!(fused[0].source, "vector");
    }

    #[test]
    fn test_single_side_gets_single_weight() {
        let fused = weighted_fusion(
            vec![hit("s", 1.0, "vector")],
            vec![hit("k", 1.0, "chunks")],
            0.6,
            0.4,
            10,
        );
        assert_eq!(fused[0].id, "s");
        assert!((fused[0].score - 0.6).abs() < 1e-6);
        assert_eq!(fused[1].id, "k");
        assert!((fused[1].score - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_sorted_and_truncated() {
        let fused = weighted_fusion(
            vec![hit("a", 0.1, "vector"), hit("b", 0.9, "vector")],
            vec![hit("c", 1.0, "chunks"), hit("d", 0.2, "chunks")],
            0.6,
            0.4,
            2,
        );
        let ids: Vec<_> = fused.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(weighted_fusion(vec![], vec![], 0.6, 0.4, 10).is_empty());
    }

    #[test]
    fn test_no_renormalization() {
        let fused = weighted_fusion(
            vec![hit("a", 1.0, "vector")],
            vec![hit("a", 1.0, "chunks")],
            0.6,
            0.4,
            10,
        );
        assert!((fused[0].score - 1.0).abs() < 1e-6);
    }
}
