//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{Article, ArticleId, RelationType};

/// An Article reached by graph traversal
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor<'a> {
    /// The reached Article
    pub article: &'a Article,

    /// Number of edges from the start Article (at least 1)
    pub depth: usize,

    /// Relation types along the path, starting at the start Article
    pub relation_path: Vec<RelationType>,
}

/// Read access to the Article graph
///
/// Implemented by the infrastructure layer (nyaya-store)
pub trait KnowledgeGraph {
    /// Error type for graph operations
    type Error;

    /// Get an Article by id
    fn get_article(&self, id: &ArticleId) -> Result<&Article, Self::Error>;

    /// Breadth-first neighbours of an Article up to `max_depth` edges away
    ///
    /// Within one depth, results are ordered by relation priority, then by
    /// Article id. No Article is emitted twice and the start Article is never
    /// emitted.
    fn neighbors(
        &self,
        id: &ArticleId,
        relation_types: &[RelationType],
        max_depth: usize,
    ) -> Result<Vec<Neighbor<'_>>, Self::Error>;

    /// Articles matching any of the terms, most distinct matches first
    fn search_by_keyword(&self, terms: &[&str]) -> Result<Vec<&Article>, Self::Error>;

    /// Articles closest to `vector`, best first, at most `top_k`
    fn search_by_similarity(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<(&Article, f64)>, Self::Error>;
}
