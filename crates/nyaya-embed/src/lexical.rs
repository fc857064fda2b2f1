//! Lexical embedder - hashed bag of stems
//!
//! Each stemmed token is hashed with FNV-1a (64-bit) into one of `dimension`
//! buckets; the bucket counts are L2-normalized. Two texts sharing stems get
//! a positive cosine, texts sharing nothing score zero (up to hash
//! collisions). The output depends only on the text, so this provider never
//! fails and needs no network, which makes it the default capability.

use crate::{EmbedError, EmbeddingProvider};
use async_trait::async_trait;
use nyaya_domain::text;

/// Default embedding dimension
pub const DEFAULT_DIMENSION: usize = 512;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Deterministic hashed bag-of-stems embedder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalEmbedder {
    dimension: usize,
    max_concurrency: usize,
}

impl LexicalEmbedder {
    /// Create an embedder with the given dimension (minimum 1)
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            max_concurrency: 16,
        }
    }

    /// The embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed synchronously
    ///
    /// A text without significant tokens embeds to the zero vector.
    pub fn embed_text(&self, input: &str) -> Vec<f32> {
        let mut counts = vec![0.0f64; self.dimension];
        for token in text::tokenize(input) {
            let bucket = (fnv1a(&token) % self.dimension as u64) as usize;
            counts[bucket] += 1.0;
        }

        let magnitude = counts.iter().map(|c| c * c).sum::<f64>().sqrt();
        if magnitude == 0.0 {
            return vec![0.0; self.dimension];
        }
        counts.iter().map(|c| (c / magnitude) as f32).collect()
    }
}

impl Default for LexicalEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for LexicalEmbedder {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(self.embed_text(input))
    }

    fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    fn name(&self) -> &str {
        "lexical"
    }
}
