//! Relationship module - typed, directed links between Articles
//!
//! Relations are stored as id pairs on the source Article. The graph may be
//! cyclic (Articles can reference each other), so traversal code must track
//! visited ids.

use crate::ArticleId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of relationship between two Articles
///
/// The declaration order is the traversal priority: when two neighbours sit
/// at the same depth, a `References` edge sorts before `Amends`, which sorts
/// before `ConflictsWith`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// One Article cites or relies on another
    References,

    /// One Article amends another
    Amends,

    /// Two Articles cannot both be satisfied by the same provision
    ConflictsWith,
}

impl RelationType {
    /// All relation types, in priority order
    pub const ALL: [RelationType; 3] = [
        RelationType::References,
        RelationType::Amends,
        RelationType::ConflictsWith,
    ];

    /// Get the relation name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::References => "references",
            RelationType::Amends => "amends",
            RelationType::ConflictsWith => "conflicts_with",
        }
    }

    /// Traversal priority (lower sorts first)
    pub fn priority(&self) -> u8 {
        match self {
            RelationType::References => 0,
            RelationType::Amends => 1,
            RelationType::ConflictsWith => 2,
        }
    }

    /// Parse a relation type from a string
    ///
    /// Accepts `conflicts` as a short form of `conflicts_with`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "references" => Some(RelationType::References),
            "amends" => Some(RelationType::Amends),
            "conflicts_with" | "conflicts" => Some(RelationType::ConflictsWith),
            _ => None,
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid relation type: {}", s))
    }
}

/// A directed relation from one Article to another
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// Target Article
    pub target: ArticleId,

    /// Type of relation
    #[serde(rename = "type")]
    pub relation_type: RelationType,
}

impl Relation {
    /// Create a new relation
    pub fn new(target: impl Into<ArticleId>, relation_type: RelationType) -> Self {
        Self {
            target: target.into(),
            relation_type,
        }
    }
}
