//! Document classifier
//!
//! Scores every loaded Framework independently against a document. Three
//! signal families contribute, each as a saturating coverage of distinct hits:
//!
//! - indicator phrases of the Framework found in some clause
//! - keywords of the Framework's Articles found in some clause
//! - clause entities citing one of its Articles or their Precedents
//!
//! Hits are distinct over the whole document, so adding a clause never lowers
//! a Framework's confidence.

use crate::config::ClassifierConfig;
use nyaya_domain::text;
use nyaya_domain::{Clause, ConfidenceLevel, Framework, FrameworkId};
use nyaya_store::KnowledgeSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Distinct hit counts behind a classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierSignals {
    /// Indicator phrases found
    pub indicator_hits: usize,
    /// Indicator phrases defined
    pub indicator_total: usize,
    /// Article keywords found
    pub keyword_hits: usize,
    /// Article keywords defined
    pub keyword_total: usize,
    /// Article and Precedent ids cited
    pub citation_hits: usize,
    /// Article and Precedent ids that could be cited
    pub citation_total: usize,
}

/// Confidence that a Framework applies to a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkMatch {
    /// The Framework
    pub framework_id: FrameworkId,
    /// Confidence [0.0, 1.0]
    pub confidence: f64,
    /// Hit counts the confidence was computed from
    #[serde(default)]
    pub signals: ClassifierSignals,
}

impl FrameworkMatch {
    /// Create a match without signal detail
    pub fn new(framework_id: impl Into<FrameworkId>, confidence: f64) -> Self {
        Self {
            framework_id: framework_id.into(),
            confidence,
            signals: ClassifierSignals::default(),
        }
    }

    /// Confidence band for display
    pub fn level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_confidence(self.confidence)
    }
}

/// Classifies documents into applicable Frameworks
#[derive(Debug, Clone, Default)]
pub struct DocumentClassifier {
    config: ClassifierConfig,
}

/// Distinct normalized phrases, skipping phrases without significant tokens
fn distinct_phrases<'a>(phrases: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    phrases
        .into_iter()
        .map(|p| text::tokenize(p).join(" "))
        .filter(|p| !p.is_empty() && seen.insert(p.clone()))
        .collect()
}

fn count_found(phrases: &[String], clause_tokens: &[HashSet<String>]) -> usize {
    phrases
        .iter()
        .filter(|phrase| {
            let stems: Vec<&str> = phrase.split(' ').collect();
            clause_tokens
                .iter()
                .any(|tokens| stems.iter().all(|s| tokens.contains(*s)))
        })
        .count()
}

impl DocumentClassifier {
    /// Create a classifier with the given settings
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    fn coverage(&self, hits: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let needed = total.min(self.config.saturation.max(1));
        (hits as f64 / needed as f64).min(1.0)
    }

    fn score_framework(
        &self,
        snapshot: &KnowledgeSnapshot,
        framework: &Framework,
        clauses: &[Clause],
        clause_tokens: &[HashSet<String>],
    ) -> FrameworkMatch {
        let indicators = distinct_phrases(&framework.indicators);
        let articles: Vec<_> = snapshot
            .articles()
            .filter(|a| a.framework == framework.id)
            .collect();
        let keywords = distinct_phrases(articles.iter().flat_map(|a| a.keywords.iter()));

        let mut citable: HashSet<&str> = articles.iter().map(|a| a.id.as_str()).collect();
        for precedent in snapshot.precedents() {
            if articles.iter().any(|a| precedent.interprets(&a.id)) {
                citable.insert(precedent.id.as_str());
            }
        }
        let citation_hits = citable
            .iter()
            .filter(|id| clauses.iter().any(|c| c.cites(id)))
            .count();

        let signals = ClassifierSignals {
            indicator_hits: count_found(&indicators, clause_tokens),
            indicator_total: indicators.len(),
            keyword_hits: count_found(&keywords, clause_tokens),
            keyword_total: keywords.len(),
            citation_hits,
            citation_total: citable.len(),
        };

        let confidence = self.config.indicator_weight
            * self.coverage(signals.indicator_hits, signals.indicator_total)
            + self.config.keyword_weight * self.coverage(signals.keyword_hits, signals.keyword_total)
            + self.config.citation_weight
                * self.coverage(signals.citation_hits, signals.citation_total);

        FrameworkMatch {
            framework_id: framework.id.clone(),
            confidence: confidence.clamp(0.0, 1.0),
            signals,
        }
    }

    /// Score every loaded Framework, best first, without thresholds
    pub fn classify_all(&self, snapshot: &KnowledgeSnapshot, clauses: &[Clause]) -> Vec<FrameworkMatch> {
        let clause_tokens: Vec<HashSet<String>> =
            clauses.iter().map(|c| text::token_set(&c.text)).collect();

        let mut matches: Vec<FrameworkMatch> = snapshot
            .frameworks()
            .map(|f| self.score_framework(snapshot, f, clauses, &clause_tokens))
            .collect();
        matches.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.framework_id.cmp(&b.framework_id))
        });
        matches
    }

    /// Frameworks applicable to a document
    ///
    /// Ordered by confidence descending, ties by Framework id. Frameworks
    /// below `min_confidence` are dropped and at most `max_frameworks` kept.
    pub fn classify(&self, snapshot: &KnowledgeSnapshot, clauses: &[Clause]) -> Vec<FrameworkMatch> {
        let mut matches: Vec<FrameworkMatch> = self
            .classify_all(snapshot, clauses)
            .into_iter()
            .filter(|m| m.confidence >= self.config.min_confidence)
            .collect();
        matches.truncate(self.config.max_frameworks);
        matches
    }
}
