//! Scoring aggregator
//!
//! Collapses clause evidence into per-dimension scores and composites.
//!
//! For each resolved dimension, the evidence that counts is the evidence whose
//! Article the dimension requires. Each required Article contributes once, at
//! its best effective score (similarity plus the precedent boost). The
//! dimension score is the plain mean of those Article scores: improving any
//! Article's best never lowers it, and neither does a new Article scoring at
//! least the current value.
//!
//! Dimensions without evidence are `InsufficientEvidence`: they are left out
//! of every composite and the remaining weights renormalize.

use crate::config::ScoringConfig;
use crate::selector::{ResolvedDimension, ResolvedDimensions};
use nyaya_domain::{
    round2, ArticleId, ClauseMatch, ConflictFlag, DimensionId, DimensionScore, FrameworkId,
    MatchEvidence, ScoreRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Composite score of one Framework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkComposite {
    /// The Framework
    pub framework_id: FrameworkId,
    /// Weighted mean over its scored dimensions; `None` when none was scored
    pub composite: Option<f64>,
    /// Dimensions with evidence
    pub scored_dimensions: usize,
    /// Dimensions resolved for the run
    pub total_dimensions: usize,
}

/// Share of one scored dimension in the overall composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// Framework of the dimension
    pub framework_id: FrameworkId,
    /// The dimension
    pub dimension_id: DimensionId,
    /// Weight after excluding dimensions without evidence
    pub weight: f64,
    /// Dimension score
    pub score: f64,
    /// `weight * score / overall`
    pub share: f64,
}

/// Scored records plus composites
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// One record per resolved dimension, in resolution order
    pub records: Vec<ScoreRecord>,
    /// One composite per active Framework
    pub framework_composites: Vec<FrameworkComposite>,
    /// Document composite over all scored dimensions
    pub overall: Option<f64>,
}

impl Aggregation {
    /// Overall composite rounded to two decimals
    pub fn rounded(&self) -> Option<f64> {
        self.overall.map(round2)
    }

    /// How each scored dimension adds up to the overall composite
    pub fn contributions(&self) -> Vec<Contribution> {
        let scored: Vec<(&ScoreRecord, f64)> = self
            .records
            .iter()
            .filter_map(|r| r.score.value().map(|v| (r, v)))
            .collect();
        let total_weight: f64 = scored.iter().map(|(r, _)| r.resolved_weight).sum();
        let overall = self.overall.unwrap_or(0.0);

        scored
            .into_iter()
            .map(|(record, score)| {
                let weight = if total_weight > 0.0 {
                    record.resolved_weight / total_weight
                } else {
                    0.0
                };
                let share = if overall > 0.0 {
                    weight * score / overall
                } else {
                    0.0
                };
                Contribution {
                    framework_id: record.framework_id.clone(),
                    dimension_id: record.dimension_id.clone(),
                    weight,
                    score,
                    share,
                }
            })
            .collect()
    }
}

fn weighted_mean(pairs: impl Iterator<Item = (f64, f64)>) -> Option<f64> {
    let mut weight_sum = 0.0;
    let mut total = 0.0;
    let mut any = false;
    for (weight, value) in pairs {
        any = true;
        weight_sum += weight;
        total += weight * value;
    }
    if !any || weight_sum <= 0.0 {
        return None;
    }
    Some(total / weight_sum)
}

/// Best evidence per required Article
struct ArticleBest<'e> {
    evidence: &'e MatchEvidence,
    effective: f64,
}

/// Aggregates matcher output into scores
#[derive(Debug, Clone, Default)]
pub struct ScoringAggregator {
    config: ScoringConfig,
}

impl ScoringAggregator {
    /// Create an aggregator with the given settings
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    fn score_dimension(
        &self,
        dimension: &ResolvedDimension,
        clause_matches: &[ClauseMatch],
        conflicts: &[ConflictFlag],
    ) -> ScoreRecord {
        let qualifying: Vec<&MatchEvidence> = clause_matches
            .iter()
            .flat_map(|m| m.evidence())
            .filter(|e| dimension.required_articles.contains(&e.article_id))
            .collect();

        let mut best: BTreeMap<&ArticleId, ArticleBest<'_>> = BTreeMap::new();
        for evidence in qualifying.iter().copied() {
            let effective = evidence.effective_score(self.config.precedent_boost);
            let replace = best
                .get(&evidence.article_id)
                .is_none_or(|current| effective > current.effective);
            if replace {
                best.insert(&evidence.article_id, ArticleBest { evidence, effective });
            }
        }

        let score = match weighted_mean(best.values().map(|b| (1.0, b.effective))) {
            Some(value) => DimensionScore::Scored { value },
            None => DimensionScore::InsufficientEvidence,
        };

        let required = dimension.required_articles.len();
        let confidence = if best.is_empty() || required == 0 {
            0.0
        } else {
            let degraded = best.values().filter(|b| b.evidence.degraded).count();
            let degraded_share = degraded as f64 / best.len() as f64;
            (best.len() as f64 / required as f64) * (1.0 - self.config.degraded_penalty * degraded_share)
        };

        let conflict = conflicts.iter().any(|flag| {
            qualifying
                .iter()
                .any(|e| e.clause_id == flag.clause_id && flag.involves(&e.article_id))
        });

        ScoreRecord {
            framework_id: dimension.framework_id.clone(),
            dimension_id: dimension.dimension_id.clone(),
            dimension_name: dimension.dimension_name.clone(),
            base_weight: dimension.base_weight,
            resolved_weight: dimension.weight,
            evidence: qualifying.into_iter().cloned().collect(),
            score,
            confidence: confidence.clamp(0.0, 1.0),
            matched_articles: best.len(),
            required_articles: required,
            conflict,
        }
    }

    /// Score every resolved dimension and compute composites
    pub fn aggregate(
        &self,
        resolved: &ResolvedDimensions,
        clause_matches: &[ClauseMatch],
        conflicts: &[ConflictFlag],
    ) -> Aggregation {
        let records: Vec<ScoreRecord> = resolved
            .iter()
            .map(|dim| self.score_dimension(dim, clause_matches, conflicts))
            .collect();

        let framework_composites = resolved
            .framework_ids()
            .into_iter()
            .map(|framework_id| {
                let own: Vec<&ScoreRecord> = records
                    .iter()
                    .filter(|r| &r.framework_id == framework_id)
                    .collect();
                FrameworkComposite {
                    framework_id: framework_id.clone(),
                    composite: weighted_mean(
                        own.iter()
                            .filter_map(|r| r.score.value().map(|v| (r.base_weight, v))),
                    ),
                    scored_dimensions: own.iter().filter(|r| r.score.is_scored()).count(),
                    total_dimensions: own.len(),
                }
            })
            .collect();

        let overall = weighted_mean(
            records
                .iter()
                .filter_map(|r| r.score.value().map(|v| (r.resolved_weight, v))),
        );

        Aggregation {
            records,
            framework_composites,
            overall,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use nyaya_domain::{ClauseId, MatchKind};
    use proptest::prelude::*;

    fn evidence(clause: usize, article: usize, similarity: f64) -> MatchEvidence {
        MatchEvidence {
            clause_id: ClauseId::new(format!("c{}", clause)),
            article_id: ArticleId::new(format!("a{}", article)),
            similarity,
            keyword_overlap: similarity,
            semantic: Some(similarity),
            kind: MatchKind::Semantic,
            precedent: None,
            precedent_strength: None,
            degraded: false,
            proximity: None,
        }
    }

    fn resolved() -> ResolvedDimensions {
        ResolvedDimensions::from_dimensions(vec![
            ResolvedDimension {
                framework_id: "f".into(),
                dimension_id: "x".into(),
                dimension_name: "X".to_string(),
                base_weight: 0.5,
                framework_confidence: 1.0,
                weight: 0.5,
                required_articles: (0..4).map(|i| ArticleId::new(format!("a{}", i))).collect(),
            },
            ResolvedDimension {
                framework_id: "f".into(),
                dimension_id: "y".into(),
                dimension_name: "Y".to_string(),
                base_weight: 0.5,
                framework_confidence: 1.0,
                weight: 0.5,
                required_articles: vec![ArticleId::new("a4")],
            },
        ])
    }

    fn clause_matches(raw: &[(usize, f64)]) -> Vec<ClauseMatch> {
        raw.iter()
            .enumerate()
            .map(|(i, (article, sim))| ClauseMatch::Matched {
                clause_id: ClauseId::new(format!("c{}", i)),
                evidence: vec![evidence(i, *article, *sim)],
            })
            .collect()
    }

    proptest! {
        #[test]
        fn prop_strong_evidence_never_lowers_score(
            raw in prop::collection::vec((0usize..5, 0.2f64..=1.0), 1..10),
            article in 0usize..4,
            margin in 0.0f64..=1.0,
        ) {
            let aggregator = ScoringAggregator::default();
            let mut matches = clause_matches(&raw);
            let before = aggregator.aggregate(&resolved(), &matches, &[]);

            let current = before.records[0].score.value().unwrap_or(0.2).max(0.2);
            let article_id = ArticleId::new(format!("a{}", article));
            let held = before.records[0]
                .evidence
                .iter()
                .filter(|e| e.article_id == article_id)
                .map(|e| e.similarity)
                .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));
            // improving an Article's own best counts, even below the current score
            let floor = held.unwrap_or(current);
            let strong = floor + (1.0 - floor) * margin;
            matches.push(ClauseMatch::Matched {
                clause_id: ClauseId::new("extra"),
                evidence: vec![evidence(99, article, strong)],
            });
            let after = aggregator.aggregate(&resolved(), &matches, &[]);

            let after_x = after.records[0].score.value().unwrap();
            if let Some(before_x) = before.records[0].score.value() {
                prop_assert!(after_x >= before_x - 1e-12);
            }
            // other dimensions are untouched
            prop_assert_eq!(&before.records[1], &after.records[1]);
        }

        #[test]
        fn prop_rescoring_is_bit_identical(raw in prop::collection::vec((0usize..5, 0.2f64..=1.0), 0..10)) {
            let aggregator = ScoringAggregator::default();
            let matches = clause_matches(&raw);
            let a = aggregator.aggregate(&resolved(), &matches, &[]);
            let b = aggregator.aggregate(&resolved(), &matches, &[]);
            prop_assert_eq!(a.overall.map(f64::to_bits), b.overall.map(f64::to_bits));
        }

        #[test]
        fn prop_scores_in_unit_range(raw in prop::collection::vec((0usize..5, 0.2f64..=1.0), 0..10)) {
            let result = ScoringAggregator::default().aggregate(&resolved(), &clause_matches(&raw), &[]);
            for record in &result.records {
                if let Some(v) = record.score.value() {
                    prop_assert!((0.0..=1.0 + 1e-12).contains(&v));
                }
                prop_assert!((0.0..=1.0).contains(&record.confidence));
            }
        }
    }
}
