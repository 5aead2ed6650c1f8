//! Cosine similarity over stored product embeddings.

use serde::Serialize;

use super::records::ProductEmbedding;

/// A candidate product and its similarity to the query embedding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityMatch {
    pub product_id: i64,
    pub score: f32,
}

/// Cosine similarity in `[-1, 1]`.
///
/// `None` when the vectors differ in length or either has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Rank candidates by similarity, best first, keeping at most `limit`.
///
/// Candidates with incomparable embeddings are skipped. Equal scores are
/// ordered by product id.
pub fn rank(query: &[f32], candidates: &[ProductEmbedding], limit: usize) -> Vec<SimilarityMatch> {
    let mut matches: Vec<SimilarityMatch> = candidates
        .iter()
        .filter_map(|c| {
            cosine_similarity(query, &c.embedding).map(|score| SimilarityMatch {
                product_id: c.product_id,
                score,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    matches.truncate(limit);
    matches
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn embedding(product_id: i64, values: &[f32]) -> ProductEmbedding {
        ProductEmbedding {
            product_id,
            embedding: values.to_vec(),
        }
    }

    #[test]
    fn identical_vectors_score_one() {
        let score = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let score = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(score.abs() < 1e-6);
    }

    #[test]
    fn mismatched_or_zero_vectors_are_incomparable() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[], &[]), None);
    }

    #[test]
    fn rank_orders_best_first_and_truncates() {
        let candidates = vec![
            embedding(1, &[0.0, 1.0]),
            embedding(2, &[1.0, 0.1]),
            embedding(3, &[1.0, 0.0]),
            embedding(4, &[1.0]),
        ];

        let ranked = rank(&[1.0, 0.0], &candidates, 2);
        let ids: Vec<i64> = ranked.iter().map(|m| m.product_id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn ties_break_by_product_id() {
        let candidates = vec![embedding(9, &[2.0, 0.0]), embedding(5, &[1.0, 0.0])];
        let ranked = rank(&[1.0, 0.0], &candidates, 10);
        assert_eq!(ranked[0].product_id, 5);
        assert_eq!(ranked[1].product_id, 9);
    }
}
