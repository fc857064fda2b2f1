//! Concept module - named legal notions linking Articles and Precedents

use crate::{ArticleId, ConceptId, PrecedentId};
use serde::{Deserialize, Serialize};

/// A named legal notion (e.g. "due process", "informational privacy")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    /// Unique identifier
    pub id: ConceptId,

    /// Display name
    pub name: String,

    /// Articles that embody the concept
    #[serde(default)]
    pub articles: Vec<ArticleId>,

    /// Precedents that developed the concept
    #[serde(default)]
    pub precedents: Vec<PrecedentId>,
}
