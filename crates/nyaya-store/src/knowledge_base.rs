//! Current-snapshot holder with atomic reload
//!
//! Readers clone the current `Arc<KnowledgeSnapshot>` and keep using it for as
//! long as they like. A reload builds and validates the replacement without
//! holding the lock, then swaps it in under the write lock. A failed reload
//! leaves the current snapshot untouched.

use crate::loader;
use crate::snapshot::KnowledgeSnapshot;
use crate::{KnowledgeBaseSpec, Result};
use nyaya_embed::EmbeddingProvider;
use std::sync::{Arc, RwLock};
use tracing::info;

/// The live knowledge base
#[derive(Debug)]
pub struct KnowledgeBase {
    current: RwLock<Arc<KnowledgeSnapshot>>,
}

impl KnowledgeBase {
    /// Build a knowledge base at version 1 without embedding missing vectors
    pub fn load(spec: KnowledgeBaseSpec) -> Result<Self> {
        let snapshot = loader::build(spec, 1)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Build a knowledge base at version 1, embedding Articles without vectors
    pub async fn load_with_embeddings(
        spec: KnowledgeBaseSpec,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Self> {
        let snapshot = loader::build_with_embeddings(spec, 1, embedder).await?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Wrap an already built snapshot
    pub fn from_snapshot(snapshot: KnowledgeSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<KnowledgeSnapshot> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Version of the current snapshot
    pub fn version(&self) -> u64 {
        self.snapshot().version()
    }

    fn swap(&self, mut snapshot: KnowledgeSnapshot) -> u64 {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let version = guard.version() + 1;
        snapshot.set_version(version);
        *guard = Arc::new(snapshot);
        version
    }

    /// Replace the graph with a new spec, returning the new version
    ///
    /// Nothing is applied if validation fails.
    pub fn reload(&self, spec: KnowledgeBaseSpec) -> Result<u64> {
        let snapshot = loader::build(spec, 0)?;
        let version = self.swap(snapshot);
        info!(version, "Knowledge base reloaded");
        Ok(version)
    }

    /// Like [`reload`](Self::reload), embedding Articles without vectors first
    pub async fn reload_with_embeddings(
        &self,
        spec: KnowledgeBaseSpec,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<u64> {
        let snapshot = loader::build_with_embeddings(spec, 0, embedder).await?;
        let version = self.swap(snapshot);
        info!(version, provider = embedder.name(), "Knowledge base reloaded");
        Ok(version)
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::from_snapshot(KnowledgeSnapshot::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;
    use nyaya_domain::{Article, ArticleId, ComplianceDimension, Framework, KnowledgeGraph};

    fn spec(text: &str, weight: f64) -> KnowledgeBaseSpec {
        KnowledgeBaseSpec {
            frameworks: vec![Framework {
                id: "f".into(),
                name: "F".to_string(),
                priority: 0,
                dimensions: vec![ComplianceDimension::new("d", "D", weight, vec!["a".into()])],
                indicators: vec![],
            }],
            articles: vec![Article::new("a", "f", text)],
            precedents: vec![],
            concepts: vec![],
        }
    }

    #[test]
    fn test_reload_bumps_version_and_swaps() {
        let kb = KnowledgeBase::load(spec("old text", 1.0)).unwrap();
        let before = kb.snapshot();
        assert_eq!(before.version(), 1);

        let version = kb.reload(spec("new text", 1.0)).unwrap();
        assert_eq!(version, 2);

        // a reader holding the old snapshot still sees the old graph
        assert_eq!(before.get_article(&ArticleId::new("a")).unwrap().text, "old text");
        assert_eq!(kb.snapshot().get_article(&ArticleId::new("a")).unwrap().text, "new text");
    }

    #[test]
    fn test_failed_reload_applies_nothing() {
        let kb = KnowledgeBase::load(spec("old text", 1.0)).unwrap();
        let result = kb.reload(spec("new text", 0.7));
        assert!(matches!(result, Err(StoreError::ConfigurationInvalid(_))));
        assert_eq!(kb.version(), 1);
        assert_eq!(kb.snapshot().get_article(&ArticleId::new("a")).unwrap().text, "old text");
    }

    #[test]
    fn test_load_rejects_bad_weights() {
        assert!(matches!(
            KnowledgeBase::load(spec("x", 0.999)),
            Err(StoreError::ConfigurationInvalid(_))
        ));
    }

    #[test]
    fn test_default_is_empty() {
        let kb = KnowledgeBase::default();
        assert_eq!(kb.version(), 0);
        assert_eq!(kb.snapshot().stats().articles, 0);
    }

    #[tokio::test]
    async fn test_reload_with_embeddings() {
        let kb = KnowledgeBase::default();
        let embedder = nyaya_embed::LexicalEmbedder::new(16);
        let version = kb.reload_with_embeddings(spec("text", 1.0), &embedder).await.unwrap();
        assert_eq!(version, 1);
        assert_eq!(kb.snapshot().vector_dimension(), Some(16));
    }
}
