//! Vector similarity
//!
//! Accumulation is done in `f64` so that repeated runs over the same vectors
//! return bit-identical scores.

/// Calculate cosine similarity between two vectors
///
/// # Returns
///
/// `None` when the lengths differ, `Some(0.0)` when either vector has zero
/// magnitude, otherwise the cosine in [-1, 1].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }
    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Cosine similarity clamped to [0, 1]; mismatched lengths score 0
pub fn unit_similarity(a: &[f32], b: &[f32]) -> f64 {
    cosine_similarity(a, b)
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

/// Euclidean norm of a vector
pub fn norm(v: &[f32]) -> f64 {
    v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: unit similarity is in [0, 1] and symmetric
        #[test]
        fn test_unit_similarity_bounds(
            a in prop::collection::vec(-10.0f32..10.0, 4),
            b in prop::collection::vec(-10.0f32..10.0, 4),
        ) {
            let s = unit_similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
            prop_assert_eq!(s, unit_similarity(&b, &a));
        }
    }
}
