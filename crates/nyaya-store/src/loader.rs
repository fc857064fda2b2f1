//! Knowledge-base validation and snapshot building
//!
//! Loading is all-or-nothing: every structural problem is collected and the
//! load is rejected with [`StoreError::ConfigurationInvalid`] before anything
//! is built.

use crate::snapshot::KnowledgeSnapshot;
use crate::{KnowledgeBaseSpec, Result, StoreError};
use nyaya_domain::ArticleId;
use nyaya_embed::EmbeddingProvider;
use std::collections::HashSet;
use std::hash::Hash;
use tracing::{debug, info};

fn duplicates<'a, T: Eq + Hash + 'a>(ids: impl IntoIterator<Item = &'a T>) -> Vec<&'a T> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| !seen.insert(*id)).collect()
}

/// Check every structural invariant of a knowledge base
///
/// - ids are unique per record kind
/// - every Article names a loaded Framework
/// - dimension weights of each Framework sum to 1.0
/// - dimension, relation, Precedent and Concept references resolve
/// - Precedent strengths are in [0, 1]
/// - Article vectors share one dimension and are finite
pub fn validate(spec: &KnowledgeBaseSpec) -> Result<()> {
    let mut errors = Vec::new();

    for id in duplicates(spec.frameworks.iter().map(|f| &f.id)) {
        errors.push(format!("duplicate framework id '{}'", id));
    }
    for id in duplicates(spec.articles.iter().map(|a| &a.id)) {
        errors.push(format!("duplicate article id '{}'", id));
    }
    for id in duplicates(spec.precedents.iter().map(|p| &p.id)) {
        errors.push(format!("duplicate precedent id '{}'", id));
    }
    for id in duplicates(spec.concepts.iter().map(|c| &c.id)) {
        errors.push(format!("duplicate concept id '{}'", id));
    }

    let framework_ids: HashSet<_> = spec.frameworks.iter().map(|f| &f.id).collect();
    let article_ids: HashSet<&ArticleId> = spec.articles.iter().map(|a| &a.id).collect();
    let precedent_ids: HashSet<_> = spec.precedents.iter().map(|p| &p.id).collect();

    for framework in &spec.frameworks {
        if let Err(e) = framework.validate_weights() {
            errors.push(e);
        }
        for dim in &framework.dimensions {
            for article in &dim.required_articles {
                if !article_ids.contains(article) {
                    errors.push(format!(
                        "dimension '{}.{}' requires unknown article '{}'",
                        framework.id, dim.id, article
                    ));
                }
            }
        }
    }

    let mut dimension = None;
    for article in &spec.articles {
        if !framework_ids.contains(&article.framework) {
            errors.push(format!(
                "article '{}' belongs to unknown framework '{}'",
                article.id, article.framework
            ));
        }
        for relation in &article.relations {
            if relation.target == article.id {
                errors.push(format!("article '{}' relates to itself", article.id));
            } else if !article_ids.contains(&relation.target) {
                errors.push(format!(
                    "article '{}' {} unknown article '{}'",
                    article.id, relation.relation_type, relation.target
                ));
            }
        }
        if let Some(vector) = &article.embedding {
            if vector.is_empty() || vector.iter().any(|x| !x.is_finite()) {
                errors.push(format!("article '{}' has an empty or non-finite vector", article.id));
            }
            match dimension {
                None => dimension = Some(vector.len()),
                Some(d) if d != vector.len() => errors.push(format!(
                    "article '{}' vector has dimension {}, expected {}",
                    article.id,
                    vector.len(),
                    d
                )),
                _ => {}
            }
        }
    }

    for precedent in &spec.precedents {
        if !precedent.strength.is_finite() || !(0.0..=1.0).contains(&precedent.strength) {
            errors.push(format!(
                "precedent '{}' has strength {} outside [0, 1]",
                precedent.id, precedent.strength
            ));
        }
        for article in &precedent.articles {
            if !article_ids.contains(article) {
                errors.push(format!(
                    "precedent '{}' interprets unknown article '{}'",
                    precedent.id, article
                ));
            }
        }
    }

    for concept in &spec.concepts {
        for article in &concept.articles {
            if !article_ids.contains(article) {
                errors.push(format!(
                    "concept '{}' links unknown article '{}'",
                    concept.id, article
                ));
            }
        }
        for precedent in &concept.precedents {
            if !precedent_ids.contains(precedent) {
                errors.push(format!(
                    "concept '{}' links unknown precedent '{}'",
                    concept.id, precedent
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(StoreError::ConfigurationInvalid(errors))
    }
}

/// Validate a knowledge base and build a snapshot without touching vectors
pub fn build(spec: KnowledgeBaseSpec, version: u64) -> Result<KnowledgeSnapshot> {
    validate(&spec)?;
    let snapshot = KnowledgeSnapshot::from_validated(spec, version)?;
    info!(
        version,
        articles = snapshot.stats().articles,
        frameworks = snapshot.stats().frameworks,
        "Built knowledge snapshot"
    );
    Ok(snapshot)
}

/// Validate a knowledge base, embed Articles that lack vectors, and build a snapshot
///
/// Embedding failures abort the load. When the file already carries vectors
/// of another dimension than the provider produces, the load is rejected by
/// the re-validation that follows embedding.
pub async fn build_with_embeddings(
    mut spec: KnowledgeBaseSpec,
    version: u64,
    embedder: &dyn EmbeddingProvider,
) -> Result<KnowledgeSnapshot> {
    validate(&spec)?;

    let mut embedded = 0usize;
    for article in spec.articles.iter_mut().filter(|a| a.embedding.is_none()) {
        let vector = embedder.embed(&article.embedding_text()).await?;
        article.embedding = Some(vector);
        embedded += 1;
    }
    debug!(embedded, provider = embedder.name(), "Embedded articles without vectors");

    build(spec, version)
}
