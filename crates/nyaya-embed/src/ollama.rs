//! Ollama Embedder Implementation
//!
//! Provides integration with Ollama's local embeddings API
//! (`POST /api/embeddings`).
//!
//! # Features
//!
//! - Async HTTP communication with the Ollama API
//! - Configurable endpoint, model and concurrency limit
//! - Retry logic with exponential backoff
//!
//! # Examples
//!
//! ```no_run
//! use nyaya_embed::OllamaEmbedder;
//!
//! let embedder = OllamaEmbedder::new("http://localhost:11434", "nomic-embed-text")
//!     .with_max_retries(2)
//!     .with_max_concurrency(2);
//! ```

use crate::{EmbedError, EmbeddingProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default HTTP timeout for embedding requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts per call
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry
pub const DEFAULT_BACKOFF_MS: u64 = 250;

/// Ollama API embedding provider
pub struct OllamaEmbedder {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
    backoff: Duration,
    max_concurrency: usize,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Embedding model (e.g., "nomic-embed-text")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
            max_concurrency: crate::DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Create an embedder against `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the maximum number of attempts per call (minimum 1)
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the delay before the first retry; later retries double it
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the concurrency limit reported to the engine
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    async fn request(&self, url: &str, text: &str) -> Result<Vec<f32>, EmbedError> {
        let body = EmbeddingsRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbedError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(EmbedError::ModelNotAvailable(self.model.clone()));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EmbedError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let parsed = response
            .json::<EmbeddingsResponse>()
            .await
            .map_err(|e| EmbedError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        if parsed.embedding.is_empty() {
            return Err(EmbedError::InvalidResponse("Empty embedding".to_string()));
        }
        Ok(parsed.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let url = format!("{}/api/embeddings", self.endpoint);
        let mut attempt = 0;

        loop {
            match self.request(&url, text).await {
                Ok(vector) => return Ok(vector),
                // Retrying cannot fix these
                Err(e @ EmbedError::ModelNotAvailable(_)) | Err(e @ EmbedError::InvalidResponse(_)) => {
                    return Err(e)
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_retries {
                        return Err(e);
                    }
                    let delay = self.backoff * 2u32.saturating_pow(attempt - 1);
                    debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "Retrying embedding call");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    fn name(&self) -> &str {
        &self.model
    }
}
