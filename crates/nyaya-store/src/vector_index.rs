//! Exact Vector Index for Semantic Search
//!
//! Brute-force cosine search over every stored vector. Knowledge bases hold
//! hundreds to low thousands of Articles, so an exact scan is cheap, and it
//! gives the deterministic ranking (score, then Article id) that approximate
//! indexes cannot.

use nyaya_domain::ArticleId;
use nyaya_embed::similarity::{cosine_similarity, norm};
use std::cmp::Ordering;
use thiserror::Error;

/// Errors that can occur during vector index operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Query or stored vector is empty, zero or not finite
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// `k` was zero
    #[error("Result count must be at least 1")]
    ZeroK,
}

/// Exact cosine index of Article vectors
///
/// # Examples
///
/// ```
/// use nyaya_domain::ArticleId;
/// use nyaya_store::VectorIndex;
///
/// let mut index = VectorIndex::new();
/// index.add(ArticleId::new("a"), vec![1.0, 0.0]).unwrap();
/// index.add(ArticleId::new("b"), vec![0.0, 1.0]).unwrap();
///
/// let results = index.search(&[1.0, 0.1], 1).unwrap();
/// assert_eq!(results[0].0, ArticleId::new("a"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    dimension: Option<usize>,
    entries: Vec<(ArticleId, Vec<f32>)>,
}

fn check_vector(v: &[f32]) -> Result<(), VectorIndexError> {
    if v.is_empty() {
        return Err(VectorIndexError::InvalidVector("empty vector".to_string()));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(VectorIndexError::InvalidVector("non-finite component".to_string()));
    }
    if norm(v) == 0.0 {
        return Err(VectorIndexError::InvalidVector("zero-norm vector".to_string()));
    }
    Ok(())
}

impl VectorIndex {
    /// Create an empty index; the first vector fixes the dimension
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimension of stored vectors, once known
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Add an Article vector
    ///
    /// Zero vectors are accepted and always score 0.
    pub fn add(&mut self, id: ArticleId, embedding: Vec<f32>) -> Result<(), VectorIndexError> {
        if embedding.is_empty() || embedding.iter().any(|x| !x.is_finite()) {
            return Err(VectorIndexError::InvalidVector(format!(
                "vector of '{}' is empty or not finite",
                id
            )));
        }
        match self.dimension {
            Some(expected) if expected != embedding.len() => {
                return Err(VectorIndexError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                })
            }
            None => self.dimension = Some(embedding.len()),
            _ => {}
        }
        self.entries.push((id, embedding));
        Ok(())
    }

    /// Search for the `k` most similar Articles
    ///
    /// Returns (id, similarity) pairs with similarity clamped to [0, 1],
    /// sorted by similarity descending, then id ascending.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(ArticleId, f64)>, VectorIndexError> {
        if k == 0 {
            return Err(VectorIndexError::ZeroK);
        }
        check_vector(query)?;
        let Some(expected) = self.dimension else {
            return Ok(Vec::new());
        };
        if expected != query.len() {
            return Err(VectorIndexError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(ArticleId, f64)> = self
            .entries
            .iter()
            .filter_map(|(id, v)| {
                cosine_similarity(query, v).map(|sim| (id.clone(), sim.clamp(0.0, 1.0)))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all vectors from the index
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dimension = None;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: results are sorted, bounded by k and clamped to [0, 1]
        #[test]
        fn test_search_sorted_and_bounded(
            vectors in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 3), 1..20),
            query in prop::collection::vec(0.1f32..1.0, 3),
            k in 1usize..10,
        ) {
            let mut index = VectorIndex::new();
            for (i, v) in vectors.into_iter().enumerate() {
                index.add(ArticleId::new(format!("a{:02}", i)), v).unwrap();
            }
            let results = index.search(&query, k).unwrap();
            prop_assert!(results.len() <= k);
            for pair in results.windows(2) {
                prop_assert!(pair[0].1 > pair[1].1 || (pair[0].1 == pair[1].1 && pair[0].0 < pair[1].0));
            }
            for (_, s) in &results {
                prop_assert!((0.0..=1.0).contains(s));
            }
        }
    }
}
