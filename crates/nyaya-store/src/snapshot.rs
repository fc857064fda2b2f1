//! Immutable, versioned knowledge-graph snapshot
//!
//! A snapshot is built once from a validated knowledge base and never mutated. Analysis
//! runs hold an `Arc<KnowledgeSnapshot>` for their whole duration, so a reload
//! never changes the graph under a running analysis.

use crate::keyword_index::KeywordIndex;
use crate::vector_index::VectorIndex;
use crate::{KnowledgeBaseSpec, Result, StoreError};
use nyaya_domain::{
    Article, ArticleId, Concept, ConceptId, Framework, FrameworkId, KnowledgeGraph, Neighbor,
    Precedent, PrecedentId, RelationType,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Counts describing a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    /// Snapshot version
    pub version: u64,
    /// Number of Articles
    pub articles: usize,
    /// Number of Frameworks
    pub frameworks: usize,
    /// Number of Precedents
    pub precedents: usize,
    /// Number of Concepts
    pub concepts: usize,
    /// Articles carrying a semantic vector
    pub articles_with_vectors: usize,
    /// `references` relations
    pub references: usize,
    /// `amends` relations
    pub amends: usize,
    /// `conflicts_with` relations
    pub conflicts: usize,
}

/// Parse relation type names for a traversal query
///
/// The result is deduplicated and in priority order. An empty list or an
/// unknown name is an invalid query.
pub fn parse_relation_types<S: AsRef<str>>(names: &[S]) -> Result<Vec<RelationType>> {
    if names.is_empty() {
        return Err(StoreError::InvalidQuery("no relation types given".to_string()));
    }
    let mut types = names
        .iter()
        .map(|n| {
            RelationType::parse(n.as_ref()).ok_or_else(|| {
                StoreError::InvalidQuery(format!("unknown relation type '{}'", n.as_ref()))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    types.sort();
    types.dedup();
    Ok(types)
}

/// A consistent, read-only view of the knowledge graph
#[derive(Debug, Clone)]
pub struct KnowledgeSnapshot {
    version: u64,
    articles: BTreeMap<ArticleId, Article>,
    frameworks: BTreeMap<FrameworkId, Framework>,
    precedents: BTreeMap<PrecedentId, Precedent>,
    concepts: BTreeMap<ConceptId, Concept>,
    precedents_by_article: BTreeMap<ArticleId, Vec<PrecedentId>>,
    /// Sources of the relations pointing at each Article
    incoming: BTreeMap<ArticleId, Vec<ArticleId>>,
    keyword_index: KeywordIndex,
    vector_index: VectorIndex,
}

impl KnowledgeSnapshot {
    /// Build from a knowledge base that already passed [`validate`](crate::loader::validate)
    pub(crate) fn from_validated(spec: KnowledgeBaseSpec, version: u64) -> Result<Self> {
        let keyword_index = KeywordIndex::build(&spec.articles);

        let mut vector_index = VectorIndex::new();
        for article in &spec.articles {
            if let Some(vector) = &article.embedding {
                vector_index.add(article.id.clone(), vector.clone())?;
            }
        }

        let mut precedents_by_article: BTreeMap<ArticleId, Vec<PrecedentId>> = BTreeMap::new();
        for precedent in &spec.precedents {
            for article in &precedent.articles {
                precedents_by_article
                    .entry(article.clone())
                    .or_default()
                    .push(precedent.id.clone());
            }
        }
        for list in precedents_by_article.values_mut() {
            list.sort();
            list.dedup();
        }

        let mut incoming: BTreeMap<ArticleId, Vec<ArticleId>> = BTreeMap::new();
        for article in &spec.articles {
            for relation in &article.relations {
                incoming
                    .entry(relation.target.clone())
                    .or_default()
                    .push(article.id.clone());
            }
        }
        for sources in incoming.values_mut() {
            sources.sort();
            sources.dedup();
        }

        Ok(Self {
            version,
            articles: spec.articles.into_iter().map(|a| (a.id.clone(), a)).collect(),
            frameworks: spec.frameworks.into_iter().map(|f| (f.id.clone(), f)).collect(),
            precedents: spec.precedents.into_iter().map(|p| (p.id.clone(), p)).collect(),
            concepts: spec.concepts.into_iter().map(|c| (c.id.clone(), c)).collect(),
            precedents_by_article,
            incoming,
            keyword_index,
            vector_index,
        })
    }

    /// An empty snapshot at version 0
    pub fn empty() -> Self {
        Self {
            version: 0,
            articles: BTreeMap::new(),
            frameworks: BTreeMap::new(),
            precedents: BTreeMap::new(),
            concepts: BTreeMap::new(),
            precedents_by_article: BTreeMap::new(),
            incoming: BTreeMap::new(),
            keyword_index: KeywordIndex::default(),
            vector_index: VectorIndex::new(),
        }
    }

    /// Monotonic version, bumped on every reload
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Dimension of Article vectors, if any Article carries one
    pub fn vector_dimension(&self) -> Option<usize> {
        self.vector_index.dimension()
    }

    /// All Articles in id order
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.articles.values()
    }

    /// All Frameworks in id order
    pub fn frameworks(&self) -> impl Iterator<Item = &Framework> {
        self.frameworks.values()
    }

    /// Get a Framework by id
    pub fn get_framework(&self, id: &FrameworkId) -> Result<&Framework> {
        self.frameworks
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("framework '{}'", id)))
    }

    /// Get a Precedent by id
    pub fn get_precedent(&self, id: &PrecedentId) -> Result<&Precedent> {
        self.precedents
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("precedent '{}'", id)))
    }

    /// Get a Concept by id
    pub fn get_concept(&self, id: &ConceptId) -> Result<&Concept> {
        self.concepts
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("concept '{}'", id)))
    }

    /// All Precedents in id order
    pub fn precedents(&self) -> impl Iterator<Item = &Precedent> {
        self.precedents.values()
    }

    /// Precedents interpreting an Article, in id order
    pub fn precedents_for_article(&self, id: &ArticleId) -> Vec<&Precedent> {
        self.precedents_by_article
            .get(id)
            .map(|ids| ids.iter().filter_map(|p| self.precedents.get(p)).collect())
            .unwrap_or_default()
    }

    /// Articles embodying a Concept, in the Concept's order
    pub fn articles_for_concept(&self, id: &ConceptId) -> Result<Vec<&Article>> {
        let concept = self.get_concept(id)?;
        Ok(concept
            .articles
            .iter()
            .filter_map(|a| self.articles.get(a))
            .collect())
    }

    /// Whether two Articles are related by `conflicts_with` in either direction
    pub fn conflicts_between(&self, a: &ArticleId, b: &ArticleId) -> bool {
        let declares = |from: &ArticleId, to: &ArticleId| {
            self.articles
                .get(from)
                .is_some_and(|art| art.relations_of(RelationType::ConflictsWith).any(|t| t == to))
        };
        declares(a, b) || declares(b, a)
    }

    /// Shortest relation distance from `from` to any Article in `targets`
    ///
    /// Follows relations of every type in both directions up to `max_depth`
    /// edges. Returns `Some(0)` when `from` is itself a target.
    pub fn distance_to_any(
        &self,
        from: &ArticleId,
        targets: &HashSet<ArticleId>,
        max_depth: usize,
    ) -> Option<usize> {
        if targets.contains(from) {
            return Some(0);
        }
        let mut visited: HashSet<&ArticleId> = HashSet::from([from]);
        let mut frontier: Vec<&ArticleId> = vec![from];
        for depth in 1..=max_depth {
            let mut next = Vec::new();
            for node in frontier {
                for adjacent in self.undirected_adjacent(node) {
                    if visited.insert(adjacent) {
                        if targets.contains(adjacent) {
                            return Some(depth);
                        }
                        next.push(adjacent);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        None
    }

    fn undirected_adjacent<'a>(&'a self, id: &'a ArticleId) -> impl Iterator<Item = &'a ArticleId> {
        let outgoing = self
            .articles
            .get(id)
            .into_iter()
            .flat_map(|a| a.relations.iter().map(|r| &r.target));
        let incoming = self.incoming.get(id).into_iter().flatten();
        outgoing.chain(incoming)
    }

    /// Counts describing the snapshot
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            version: self.version,
            articles: self.articles.len(),
            frameworks: self.frameworks.len(),
            precedents: self.precedents.len(),
            concepts: self.concepts.len(),
            articles_with_vectors: self.vector_index.len(),
            ..GraphStats::default()
        };
        for relation in self.articles.values().flat_map(|a| a.relations.iter()) {
            match relation.relation_type {
                RelationType::References => stats.references += 1,
                RelationType::Amends => stats.amends += 1,
                RelationType::ConflictsWith => stats.conflicts += 1,
            }
        }
        stats
    }
}

impl KnowledgeGraph for KnowledgeSnapshot {
    type Error = StoreError;

    fn get_article(&self, id: &ArticleId) -> Result<&Article> {
        self.articles
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("article '{}'", id)))
    }

    fn neighbors(
        &self,
        id: &ArticleId,
        relation_types: &[RelationType],
        max_depth: usize,
    ) -> Result<Vec<Neighbor<'_>>> {
        let start = self.get_article(id)?;
        if relation_types.is_empty() {
            return Err(StoreError::InvalidQuery("no relation types given".to_string()));
        }

        let mut visited: HashSet<&ArticleId> = HashSet::from([&start.id]);
        let mut frontier: Vec<(&Article, Vec<RelationType>)> = vec![(start, Vec::new())];
        let mut out = Vec::new();

        for depth in 1..=max_depth {
            let mut candidates: Vec<(RelationType, &ArticleId, &Vec<RelationType>)> = Vec::new();
            for (article, path) in &frontier {
                for relation in &article.relations {
                    if relation_types.contains(&relation.relation_type)
                        && !visited.contains(&relation.target)
                    {
                        candidates.push((relation.relation_type, &relation.target, path));
                    }
                }
            }
            candidates.sort_by(|a, b| {
                a.0.priority()
                    .cmp(&b.0.priority())
                    .then_with(|| a.1.cmp(b.1))
            });

            let mut next = Vec::new();
            for (relation_type, target, path) in candidates {
                // First occurrence wins: highest-priority edge, then lowest id
                if !visited.insert(target) {
                    continue;
                }
                let Some(article) = self.articles.get(target) else {
                    continue;
                };
                let mut relation_path = path.clone();
                relation_path.push(relation_type);
                out.push(Neighbor {
                    article,
                    depth,
                    relation_path: relation_path.clone(),
                });
                next.push((article, relation_path));
            }

            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        Ok(out)
    }

    fn search_by_keyword(&self, terms: &[&str]) -> Result<Vec<&Article>> {
        if terms.is_empty() {
            return Err(StoreError::InvalidQuery("no search terms given".to_string()));
        }
        Ok(self
            .keyword_index
            .search(terms)
            .into_iter()
            .filter_map(|(id, _)| self.articles.get(&id))
            .collect())
    }

    fn search_by_similarity(&self, vector: &[f32], top_k: usize) -> Result<Vec<(&Article, f64)>> {
        let hits = self.vector_index.search(vector, top_k)?;
        Ok(hits
            .into_iter()
            .filter_map(|(id, score)| self.articles.get(&id).map(|a| (a, score)))
            .collect())
    }
}
