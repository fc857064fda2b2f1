//! Nyaya Embedding Capability Layer
//!
//! Pluggable text-embedding providers behind a narrow interface: `embed`,
//! `similarity`, and a concurrency limit the engine sizes its worker pool to.
//!
//! # Architecture
//!
//! The reasoning core never depends on a provider being available. Every call
//! goes through [`embed_with_timeout`], and any error (including a timeout)
//! is answered by the engine with a keyword-only fallback.
//!
//! # Providers
//!
//! - `LexicalEmbedder`: Deterministic hashed bag-of-stems, the offline default
//! - `MockEmbedder`: Scripted vectors, failures and delays for testing
//! - `OllamaEmbedder`: Local Ollama embeddings API integration
//!
//! # Examples
//!
//! ```
//! use nyaya_embed::{EmbeddingProvider, LexicalEmbedder};
//!
//! let embedder = LexicalEmbedder::default();
//! let a = embedder.embed_text("processing of personal data requires consent");
//! let b = embedder.embed_text("consent for data processing");
//! assert!(embedder.similarity(&a, &b) > 0.7);
//! ```

#![warn(missing_docs)]

pub mod lexical;
pub mod mock;
pub mod ollama;
pub mod similarity;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use lexical::LexicalEmbedder;
pub use mock::MockEmbedder;
pub use ollama::OllamaEmbedder;
pub use similarity::{cosine_similarity, unit_similarity};

/// Errors that can occur during embedding operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbedError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The call exceeded its deadline
    #[error("Embedding call timed out after {0} ms")]
    Timeout(u64),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Vector length differs from what the caller expects
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Generic error
    #[error("Embedding error: {0}")]
    Other(String),
}

/// Default number of concurrent calls a provider accepts
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// A text-embedding capability
///
/// Implementations must be safe to share across tasks; the engine holds them
/// as `Arc<dyn EmbeddingProvider>`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a text into a vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Similarity of two vectors in [0, 1]
    ///
    /// Defaults to cosine similarity clamped at zero.
    fn similarity(&self, a: &[f32], b: &[f32]) -> f64 {
        unit_similarity(a, b)
    }

    /// Maximum number of concurrent `embed` calls the provider accepts
    fn max_concurrency(&self) -> usize {
        DEFAULT_MAX_CONCURRENCY
    }

    /// Provider name for logs and reports
    fn name(&self) -> &str;
}

/// Run `provider.embed(text)` under a deadline
///
/// A call that does not finish in time yields [`EmbedError::Timeout`].
pub async fn embed_with_timeout(
    provider: &dyn EmbeddingProvider,
    text: &str,
    timeout: Duration,
) -> Result<Vec<f32>, EmbedError> {
    match tokio::time::timeout(timeout, provider.embed(text)).await {
        Ok(result) => result,
        Err(_) => Err(EmbedError::Timeout(timeout.as_millis() as u64)),
    }
}
