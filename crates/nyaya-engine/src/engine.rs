//! Compliance engine
//!
//! Drives one analysis run end to end:
//!
//! 1. Fill missing clause entities from citations in the text
//! 2. Classify the document and resolve weighted dimensions
//! 3. Embed clauses through a bounded, order-preserving pool
//! 4. Match clauses in document order, carrying graph locality forward
//! 5. Aggregate evidence into scores and cache the report
//!
//! An embedding failure or timeout only degrades the clause it belongs to.

use crate::aggregator::ScoringAggregator;
use crate::cancel::CancellationToken;
use crate::classifier::{DocumentClassifier, FrameworkMatch};
use crate::config::EngineConfig;
use crate::matcher::{ClauseMatcher, Locality};
use crate::report::AnalysisReport;
use crate::run::AnalysisRun;
use crate::selector;
use crate::{EngineError, Result};
use futures::stream::{self, StreamExt};
use nyaya_domain::text;
use nyaya_domain::{
    Article, Clause, ClauseId, ClauseMatch, ConflictFlag, Document, DocumentId, FrameworkId,
    KnowledgeGraph, RunState,
};
use nyaya_embed::{embed_with_timeout, EmbedError, EmbeddingProvider};
use nyaya_store::{KnowledgeBase, KnowledgeBaseSpec, KnowledgeSnapshot};
use std::collections::VecDeque;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

type Embedding = std::result::Result<Vec<f32>, EmbedError>;

/// Identity of a cached report
#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    document_id: DocumentId,
    content: u64,
    frameworks: Vec<FrameworkId>,
    version: u64,
}

impl CacheKey {
    fn new(document: &Document, clauses: &[Clause], frameworks: &[FrameworkMatch], version: u64) -> Self {
        let mut hasher = DefaultHasher::new();
        for clause in clauses {
            clause.id.hash(&mut hasher);
            clause.text.hash(&mut hasher);
            clause.entities.hash(&mut hasher);
        }
        let mut ids: Vec<FrameworkId> = frameworks.iter().map(|f| f.framework_id.clone()).collect();
        ids.sort();
        Self {
            document_id: document.id.clone(),
            content: hasher.finish(),
            frameworks: ids,
            version,
        }
    }
}

/// Bounded report cache, oldest entry evicted first
#[derive(Debug)]
struct ReportCache {
    capacity: usize,
    entries: VecDeque<(CacheKey, AnalysisReport)>,
}

impl ReportCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::new(),
        }
    }

    fn get(&self, key: &CacheKey) -> Option<&AnalysisReport> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, r)| r)
    }

    /// Store a report computed against `key.version`
    ///
    /// Reports of a version older than `current` are dropped: a run that
    /// started before a reload must not displace fresh entries.
    fn insert(&mut self, key: CacheKey, report: AnalysisReport, current: u64) {
        if self.capacity == 0 || key.version < current {
            return;
        }
        self.entries.retain(|(k, _)| k.version == key.version && *k != key);
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, report));
    }

    fn retain_version(&mut self, version: u64) {
        self.entries.retain(|(k, _)| k.version == version);
    }
}

/// Legal compliance reasoning engine
///
/// `Send + Sync`: share one engine across tasks behind an `Arc`. Every run
/// reads the snapshot that was current when it started.
pub struct ComplianceEngine {
    knowledge_base: Arc<KnowledgeBase>,
    provider: Arc<dyn EmbeddingProvider>,
    config: EngineConfig,
    cache: Mutex<ReportCache>,
}

impl ComplianceEngine {
    /// Create an engine
    ///
    /// # Errors
    ///
    /// `ConfigurationInvalid` when the configuration fails validation.
    pub fn new(
        knowledge_base: Arc<KnowledgeBase>,
        provider: Arc<dyn EmbeddingProvider>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let cache = Mutex::new(ReportCache::new(config.runtime.cache_capacity));
        Ok(Self {
            knowledge_base,
            provider,
            config,
            cache,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The knowledge base runs read from
    pub fn knowledge_base(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge_base
    }

    /// Embedding provider in use
    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Number of cached reports
    pub fn cache_len(&self) -> usize {
        self.lock_cache().entries.len()
    }

    fn lock_cache(&self) -> MutexGuard<'_, ReportCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the knowledge base, embedding new Articles with the engine's provider
    ///
    /// Cached reports of older versions are dropped. Nothing changes if the
    /// new knowledge base is invalid.
    pub async fn reload(&self, spec: KnowledgeBaseSpec) -> Result<u64> {
        let version = self
            .knowledge_base
            .reload_with_embeddings(spec, self.provider.as_ref())
            .await?;
        self.lock_cache().retain_version(version);
        Ok(version)
    }

    /// Clauses with entities filled in where the extraction service left none
    ///
    /// Filled entities are the "Article N" / "Section N" references in the
    /// text plus the Precedents the text names.
    fn prepare_clauses(snapshot: &KnowledgeSnapshot, document: &Document) -> Vec<Clause> {
        document
            .clauses
            .iter()
            .map(|clause| {
                let mut clause = clause.clone();
                if clause.entities.is_empty() {
                    clause.entities = text::extract_citations(&clause.text);
                    clause.entities.extend(
                        snapshot
                            .precedents()
                            .filter(|p| p.is_cited_by(&clause.text))
                            .map(|p| p.id.to_string()),
                    );
                }
                clause
            })
            .collect()
    }

    /// Frameworks applicable to a document, best first
    pub fn classify(&self, document: &Document) -> Vec<FrameworkMatch> {
        let snapshot = self.knowledge_base.snapshot();
        let clauses = Self::prepare_clauses(&snapshot, document);
        DocumentClassifier::new(self.config.classifier.clone()).classify(&snapshot, &clauses)
    }

    /// Every loaded Framework scored against a document, without thresholds
    pub fn classify_all(&self, document: &Document) -> Vec<FrameworkMatch> {
        let snapshot = self.knowledge_base.snapshot();
        let clauses = Self::prepare_clauses(&snapshot, document);
        DocumentClassifier::new(self.config.classifier.clone()).classify_all(&snapshot, &clauses)
    }

    /// Analyze a document
    pub async fn analyze(&self, document: &Document) -> Result<AnalysisReport> {
        self.analyze_with_cancel(document, &CancellationToken::new()).await
    }

    /// Analyze a document, stopping early when `token` is cancelled
    ///
    /// # Errors
    ///
    /// - `Cancelled` when the token fires before the run completes; nothing
    ///   is cached
    /// - `NotFound` when a dimension requires an Article the snapshot lacks
    pub async fn analyze_with_cancel(
        &self,
        document: &Document,
        token: &CancellationToken,
    ) -> Result<AnalysisReport> {
        let snapshot = self.knowledge_base.snapshot();
        let clauses = Self::prepare_clauses(&snapshot, document);

        let frameworks = DocumentClassifier::new(self.config.classifier.clone()).classify(&snapshot, &clauses);
        let mut run = AnalysisRun::new(document.id.clone(), snapshot.version());
        info!(
            run = %run.id(),
            document = %document.id,
            clauses = clauses.len(),
            frameworks = frameworks.len(),
            version = snapshot.version(),
            "Analysis started"
        );

        if token.is_cancelled() {
            return Err(EngineError::Cancelled(run.id()));
        }

        let key = CacheKey::new(document, &clauses, &frameworks, snapshot.version());
        let hit = self.lock_cache().get(&key).cloned();
        if let Some(mut report) = hit {
            debug!(run = %run.id(), document = %document.id, "Report served from cache");
            report.run_id = run.id();
            report.cached = true;
            return Ok(report);
        }

        let resolved = selector::resolve(&snapshot, &frameworks)?;
        run.advance(RunState::FrameworksResolved)?;

        let has_candidates = !resolved.candidates().is_empty();
        let vectors: Vec<Option<Embedding>> = if !has_candidates || snapshot.vector_dimension().is_none() {
            vec![None; clauses.len()]
        } else {
            let texts: Vec<String> = clauses.iter().map(|c| c.text.clone()).collect();
            let embedding = embed_clauses(
                Arc::clone(&self.provider),
                texts,
                self.embedding_limit(),
                self.config.runtime.embedding_timeout(),
            );
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    warn!(run = %run.id(), "Analysis cancelled during embedding");
                    return Err(EngineError::Cancelled(run.id()));
                }
                results = embedding => results.into_iter().map(Some).collect(),
            }
        };

        let candidates: Vec<&Article> = resolved
            .candidates()
            .into_iter()
            .map(|id| snapshot.get_article(id))
            .collect::<std::result::Result<_, _>>()?;

        let mut degraded_clauses: Vec<ClauseId> = Vec::new();
        let mut clause_vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(clauses.len());
        for (clause, result) in clauses.iter().zip(vectors) {
            let vector = match result {
                None => None,
                Some(Ok(vector)) if Some(vector.len()) == snapshot.vector_dimension() => Some(vector),
                Some(Ok(vector)) => {
                    warn!(
                        clause = %clause.id,
                        dimension = vector.len(),
                        "Embedding dimension differs from the knowledge base, using keywords only"
                    );
                    degraded_clauses.push(clause.id.clone());
                    None
                }
                Some(Err(e)) => {
                    warn!(clause = %clause.id, error = %e, "Embedding failed, using keywords only");
                    degraded_clauses.push(clause.id.clone());
                    None
                }
            };
            clause_vectors.push(vector);
        }

        let matcher = ClauseMatcher::new(&snapshot, self.provider.as_ref(), self.config.matcher.clone());
        let mut locality = Locality::new();
        let mut clause_matches: Vec<ClauseMatch> = Vec::with_capacity(clauses.len());
        let mut conflicts: Vec<ConflictFlag> = Vec::new();
        for (clause, vector) in clauses.iter().zip(&clause_vectors) {
            if token.is_cancelled() {
                warn!(run = %run.id(), "Analysis cancelled during matching");
                return Err(EngineError::Cancelled(run.id()));
            }
            let clause_match = matcher.match_clause(clause, &candidates, vector.as_deref(), &locality);
            locality.record(&clause_match);
            conflicts.extend(matcher.detect_conflicts(&clause_match));
            clause_matches.push(clause_match);
        }
        run.advance(RunState::Matched)?;

        let aggregation =
            ScoringAggregator::new(self.config.scoring.clone()).aggregate(&resolved, &clause_matches, &conflicts);
        run.advance(RunState::Aggregated)?;

        if token.is_cancelled() {
            return Err(EngineError::Cancelled(run.id()));
        }

        let report = AnalysisReport {
            run_id: run.id(),
            document_id: document.id.clone(),
            knowledge_base_version: snapshot.version(),
            provider: self.provider.name().to_string(),
            frameworks,
            records: aggregation.records,
            framework_composites: aggregation.framework_composites,
            overall: aggregation.overall,
            clause_matches,
            degraded_clauses,
            conflicts,
            cached: false,
        };
        run.advance(RunState::Final)?;

        info!(
            run = %run.id(),
            document = %document.id,
            overall = ?report.overall,
            degraded = report.degraded_clauses.len(),
            conflicts = report.conflicts.len(),
            "Analysis complete"
        );
        let current = self.knowledge_base.version();
        self.lock_cache().insert(key, report.clone(), current);
        Ok(report)
    }

    /// Embedding calls in flight at once: `min(config, provider)`, at least 1
    fn embedding_limit(&self) -> usize {
        self.config
            .runtime
            .max_concurrency
            .min(self.provider.max_concurrency())
            .max(1)
    }
}

/// Embed every text, at most `limit` calls at a time
///
/// Results come back in input order.
async fn embed_clauses(
    provider: Arc<dyn EmbeddingProvider>,
    texts: Vec<String>,
    limit: usize,
    timeout: Duration,
) -> Vec<Embedding> {
    stream::iter(texts)
        .map(move |text| {
            let provider = Arc::clone(&provider);
            async move { embed_with_timeout(provider.as_ref(), &text, timeout).await }
        })
        .buffered(limit)
        .collect()
        .await
}
