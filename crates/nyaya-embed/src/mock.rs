//! Mock embedder for deterministic testing
//!
//! Returns scripted vectors for known texts and falls back to the lexical
//! embedder for everything else. Failures and delays can be injected per text
//! to exercise the engine's timeout and degraded paths.

use crate::{EmbedError, EmbeddingProvider, LexicalEmbedder};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct Script {
    vectors: HashMap<String, Vec<f32>>,
    failures: HashSet<String>,
    delays: HashMap<String, Duration>,
    fail_all: bool,
}

/// Mock embedding provider
///
/// Clones share their script and counters.
///
/// # Examples
///
/// ```
/// use nyaya_embed::{EmbeddingProvider, MockEmbedder};
///
/// let mock = MockEmbedder::new(4);
/// mock.add_vector("privacy", vec![1.0, 0.0, 0.0, 0.0]);
/// mock.add_failure("outage");
/// assert_eq!(mock.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    fallback: LexicalEmbedder,
    script: Arc<Mutex<Script>>,
    default_delay: Option<Duration>,
    max_concurrency: usize,
    call_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockEmbedder {
    /// Create a mock whose unscripted texts embed lexically at `dimension`
    pub fn new(dimension: usize) -> Self {
        Self {
            fallback: LexicalEmbedder::new(dimension),
            script: Arc::new(Mutex::new(Script::default())),
            default_delay: None,
            max_concurrency: crate::DEFAULT_MAX_CONCURRENCY,
            call_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Delay every call by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    /// Set the reported concurrency limit
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Return `vector` for exactly `text`
    pub fn add_vector(&self, text: impl Into<String>, vector: Vec<f32>) {
        self.script().vectors.insert(text.into(), vector);
    }

    /// Fail every call for exactly `text`
    pub fn add_failure(&self, text: impl Into<String>) {
        self.script().failures.insert(text.into());
    }

    /// Delay calls for exactly `text`
    pub fn add_delay(&self, text: impl Into<String>, delay: Duration) {
        self.script().delays.insert(text.into(), delay);
    }

    /// Fail every call, or stop doing so
    pub fn set_fail_all(&self, fail_all: bool) {
        self.script().fail_all = fail_all;
    }

    /// Number of `embed` calls started
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    /// Highest number of calls observed running at once
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(crate::lexical::DEFAULT_DIMENSION)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let (delay, fail, scripted) = {
            let script = self.script();
            (
                script.delays.get(text).copied().or(self.default_delay),
                script.fail_all || script.failures.contains(text),
                script.vectors.get(text).cloned(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(EmbedError::Other("Mock error".to_string()));
        }
        Ok(scripted.unwrap_or_else(|| self.fallback.embed_text(text)))
    }

    fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    fn name(&self) -> &str {
        "mock"
    }
}
