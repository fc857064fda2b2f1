//! Article module - the atomic provision node of the knowledge graph

use crate::{ArticleId, FrameworkId, Relation, RelationType};
use serde::{Deserialize, Serialize};

/// A single constitutional or statutory provision
///
/// Articles are created at knowledge-base build time and are immutable
/// afterwards; a reload replaces the whole snapshot instead of editing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: ArticleId,

    /// The Framework this Article belongs to (exactly one)
    pub framework: FrameworkId,

    /// Human-readable location, e.g. "Constitution Part III"
    #[serde(default)]
    pub reference: String,

    /// Short title, e.g. "Protection of life and personal liberty"
    #[serde(default)]
    pub title: String,

    /// Canonical text of the provision
    pub text: String,

    /// Ordered keyword phrases used for exact/stemmed matching
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Opaque semantic vector, filled at build time if absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Outgoing relations to other Articles
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Article {
    /// Create an Article with no keywords, vector or relations
    pub fn new(
        id: impl Into<ArticleId>,
        framework: impl Into<FrameworkId>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            framework: framework.into(),
            reference: String::new(),
            title: String::new(),
            text: text.into(),
            keywords: Vec::new(),
            embedding: None,
            relations: Vec::new(),
        }
    }

    /// Builder-style keyword setter
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style relation adder
    pub fn with_relation(mut self, target: impl Into<ArticleId>, relation_type: RelationType) -> Self {
        self.relations.push(Relation::new(target, relation_type));
        self
    }

    /// Builder-style embedding setter
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Text used when embedding this Article: title and body together
    pub fn embedding_text(&self) -> String {
        if self.title.is_empty() {
            self.text.clone()
        } else {
            format!("{}. {}", self.title, self.text)
        }
    }

    /// Relations of the given type, in declaration order
    pub fn relations_of(&self, relation_type: RelationType) -> impl Iterator<Item = &ArticleId> {
        self.relations
            .iter()
            .filter(move |r| r.relation_type == relation_type)
            .map(|r| &r.target)
    }
}
