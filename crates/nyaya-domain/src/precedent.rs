//! Precedent module - case-derived authority nodes

use crate::text;
use crate::{ArticleId, PrecedentId};
use serde::{Deserialize, Serialize};

/// A case reference that interprets one or more Articles
///
/// `strength` reflects the authority of the decision in [0.0, 1.0]
/// (a constitution bench ruling is stronger than a single-judge order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Precedent {
    /// Unique identifier
    pub id: PrecedentId,

    /// Case name, e.g. "Justice K.S. Puttaswamy v. Union of India"
    pub name: String,

    /// Reporter citation, e.g. "(2017) 10 SCC 1"
    #[serde(default)]
    pub citation: String,

    /// Year of decision
    #[serde(default)]
    pub year: Option<u16>,

    /// Articles interpreted by the decision
    #[serde(default)]
    pub articles: Vec<ArticleId>,

    /// Authority weight [0.0, 1.0]
    pub strength: f64,
}

impl Precedent {
    /// Whether the decision interprets the given Article
    pub fn interprets(&self, article: &ArticleId) -> bool {
        self.articles.iter().any(|a| a == article)
    }

    /// Whether a clause text mentions this case
    ///
    /// A mention is the case's citation verbatim, or every significant token
    /// of the first party's name (e.g. "Puttaswamy" for
    /// "Justice K.S. Puttaswamy v. Union of India").
    pub fn is_cited_by(&self, clause_text: &str) -> bool {
        let lowered = clause_text.to_lowercase();
        if !self.citation.is_empty() && lowered.contains(&self.citation.to_lowercase()) {
            return true;
        }

        let first_party = self
            .name
            .split(" v. ")
            .next()
            .unwrap_or(&self.name)
            .split(" v ")
            .next()
            .unwrap_or(&self.name);
        let party_tokens: Vec<String> = text::tokenize(first_party)
            .into_iter()
            .filter(|t| t.len() > 3 && t != "justic")
            .collect();
        if party_tokens.is_empty() {
            return false;
        }

        let clause_tokens = text::token_set(clause_text);
        party_tokens.iter().all(|t| clause_tokens.contains(t))
    }
}
