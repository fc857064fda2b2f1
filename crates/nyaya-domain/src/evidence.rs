//! Evidence module - scored links between clauses and Articles

use crate::{ArticleId, ClauseId, PrecedentId};
use serde::{Deserialize, Serialize};

/// How a match was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Keyword overlap carried at least as much of the score as semantics
    ExactKeyword,

    /// Semantic similarity dominated the score
    Semantic,

    /// The clause cites a Precedent interpreting the Article
    PrecedentLinked,
}

impl MatchKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::ExactKeyword => "exact_keyword",
            MatchKind::Semantic => "semantic",
            MatchKind::PrecedentLinked => "precedent_linked",
        }
    }
}

/// A scored link between a document clause and a graph Article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvidence {
    /// Clause the evidence came from
    pub clause_id: ClauseId,

    /// Matched Article
    pub article_id: ArticleId,

    /// Blended similarity [0.0, 1.0]
    pub similarity: f64,

    /// Keyword overlap component [0.0, 1.0]
    pub keyword_overlap: f64,

    /// Semantic component, absent in degraded mode
    pub semantic: Option<f64>,

    /// How the match was established
    pub kind: MatchKind,

    /// Linked Precedent, for `PrecedentLinked` evidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precedent: Option<PrecedentId>,

    /// Strength of the linked Precedent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precedent_strength: Option<f64>,

    /// True when the semantic signal was unavailable for this match
    #[serde(default)]
    pub degraded: bool,

    /// Graph distance to an Article matched by an earlier clause
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximity: Option<usize>,
}

impl MatchEvidence {
    /// Similarity after the precedent boost
    ///
    /// `min(1, similarity + boost * strength)` for precedent-linked evidence,
    /// otherwise the raw similarity.
    pub fn effective_score(&self, precedent_boost: f64) -> f64 {
        match (self.kind, self.precedent_strength) {
            (MatchKind::PrecedentLinked, Some(strength)) => {
                (self.similarity + precedent_boost * strength).min(1.0)
            }
            _ => self.similarity,
        }
    }
}

/// A clause for which no candidate cleared the similarity floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedClause {
    /// The clause
    pub clause_id: ClauseId,

    /// Best candidate below the floor, if any candidate was scored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_article: Option<ArticleId>,

    /// Score of the best sub-floor candidate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_score: Option<f64>,
}

/// Matcher outcome for one clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClauseMatch {
    /// At least one candidate qualified
    Matched {
        /// The clause
        clause_id: ClauseId,
        /// Ordered evidence, best first
        evidence: Vec<MatchEvidence>,
    },

    /// No candidate qualified
    Unmatched(UnmatchedClause),
}

impl ClauseMatch {
    /// The clause this outcome belongs to
    pub fn clause_id(&self) -> &ClauseId {
        match self {
            ClauseMatch::Matched { clause_id, .. } => clause_id,
            ClauseMatch::Unmatched(u) => &u.clause_id,
        }
    }

    /// Evidence of the clause (empty when unmatched)
    pub fn evidence(&self) -> &[MatchEvidence] {
        match self {
            ClauseMatch::Matched { evidence, .. } => evidence,
            ClauseMatch::Unmatched(_) => &[],
        }
    }

    /// Whether any candidate qualified
    pub fn is_matched(&self) -> bool {
        matches!(self, ClauseMatch::Matched { .. })
    }
}

/// Two strongly matched Articles related by `conflicts_with` in one clause
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictFlag {
    /// Clause where both Articles matched
    pub clause_id: ClauseId,

    /// Lower Article id of the pair
    pub first: ArticleId,

    /// Higher Article id of the pair
    pub second: ArticleId,
}

impl ConflictFlag {
    /// Create a flag; the pair is stored in id order
    pub fn new(clause_id: ClauseId, a: ArticleId, b: ArticleId) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            clause_id,
            first,
            second,
        }
    }

    /// Whether the flag involves the given Article
    pub fn involves(&self, article: &ArticleId) -> bool {
        &self.first == article || &self.second == article
    }
}
