//! Framework selector
//!
//! Turns classifier output into one weighted set of active dimensions. Each
//! Framework's dimension weights are scaled by its confidence and the union is
//! renormalized to sum to 1.

use crate::classifier::FrameworkMatch;
use crate::{EngineError, Result};
use nyaya_domain::{ArticleId, DimensionId, FrameworkId};
use nyaya_store::KnowledgeSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A dimension active for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDimension {
    /// Framework of the dimension
    pub framework_id: FrameworkId,
    /// The dimension
    pub dimension_id: DimensionId,
    /// Display name
    pub dimension_name: String,
    /// Weight within its own Framework
    pub base_weight: f64,
    /// Classifier confidence of the Framework
    pub framework_confidence: f64,
    /// Cross-framework weight; all resolved weights sum to 1
    pub weight: f64,
    /// Articles evidence must match to count for this dimension
    pub required_articles: Vec<ArticleId>,
}

/// Ordered set of active dimensions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDimensions {
    dimensions: Vec<ResolvedDimension>,
}

impl ResolvedDimensions {
    /// Wrap dimensions as given, without renormalizing
    pub fn from_dimensions(dimensions: Vec<ResolvedDimension>) -> Self {
        Self { dimensions }
    }

    /// Dimensions in Framework order, then definition order
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedDimension> {
        self.dimensions.iter()
    }

    /// Number of active dimensions
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    /// Whether no dimension is active
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Candidate Articles: the union of required Articles, first occurrence order
    pub fn candidates(&self) -> Vec<&ArticleId> {
        let mut seen = HashSet::new();
        self.dimensions
            .iter()
            .flat_map(|d| d.required_articles.iter())
            .filter(|a| seen.insert(*a))
            .collect()
    }

    /// Active Frameworks in order
    pub fn framework_ids(&self) -> Vec<&FrameworkId> {
        let mut ids: Vec<&FrameworkId> = Vec::new();
        for dim in &self.dimensions {
            if !ids.contains(&&dim.framework_id) {
                ids.push(&dim.framework_id);
            }
        }
        ids
    }
}

impl<'a> IntoIterator for &'a ResolvedDimensions {
    type Item = &'a ResolvedDimension;
    type IntoIter = std::slice::Iter<'a, ResolvedDimension>;

    fn into_iter(self) -> Self::IntoIter {
        self.dimensions.iter()
    }
}

/// Resolve classifier output into weighted dimensions
///
/// Frameworks with confidence 0 contribute nothing; resolving with or without
/// them gives the same result. When no Framework has positive confidence the
/// resolution is empty.
///
/// # Errors
///
/// - `NotFound` for an unknown Framework id
/// - `InvalidQuery` for a confidence outside [0, 1] or a Framework listed twice
pub fn resolve(snapshot: &KnowledgeSnapshot, matches: &[FrameworkMatch]) -> Result<ResolvedDimensions> {
    let mut seen = HashSet::new();
    let mut dimensions = Vec::new();

    for m in matches {
        if !(0.0..=1.0).contains(&m.confidence) {
            return Err(EngineError::InvalidQuery(format!(
                "confidence {} of framework '{}' is outside [0, 1]",
                m.confidence, m.framework_id
            )));
        }
        if !seen.insert(&m.framework_id) {
            return Err(EngineError::InvalidQuery(format!(
                "framework '{}' listed twice",
                m.framework_id
            )));
        }
        let framework = snapshot.get_framework(&m.framework_id)?;
        if m.confidence == 0.0 {
            continue;
        }
        for dim in &framework.dimensions {
            dimensions.push(ResolvedDimension {
                framework_id: framework.id.clone(),
                dimension_id: dim.id.clone(),
                dimension_name: dim.name.clone(),
                base_weight: dim.weight,
                framework_confidence: m.confidence,
                weight: dim.weight * m.confidence,
                required_articles: dim.required_articles.clone(),
            });
        }
    }

    let total: f64 = dimensions.iter().map(|d| d.weight).sum();
    if total <= 0.0 {
        return Ok(ResolvedDimensions::default());
    }
    for dim in &mut dimensions {
        dim.weight /= total;
    }
    Ok(ResolvedDimensions { dimensions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyaya_domain::{Article, ComplianceDimension, Framework};
    use nyaya_store::{KnowledgeBase, KnowledgeBaseSpec};

    fn kb() -> KnowledgeBase {
        KnowledgeBase::load(KnowledgeBaseSpec {
            frameworks: vec![
                Framework {
                    id: "constitutional".into(),
                    name: "Constitution".to_string(),
                    priority: 1,
                    dimensions: vec![
                        ComplianceDimension::new("rights", "Rights", 0.6, vec!["a21".into(), "a14".into()]),
                        ComplianceDimension::new("remedies", "Remedies", 0.4, vec!["a32".into()]),
                    ],
                    indicators: vec![],
                },
                Framework {
                    id: "privacy".into(),
                    name: "Privacy".to_string(),
                    priority: 2,
                    dimensions: vec![ComplianceDimension::new("consent", "Consent", 1.0, vec!["p1".into(), "a21".into()])],
                    indicators: vec![],
                },
            ],
            articles: vec![
                Article::new("a14", "constitutional", "equality"),
                Article::new("a21", "constitutional", "life and liberty"),
                Article::new("a32", "constitutional", "remedies"),
                Article::new("p1", "privacy", "consent"),
            ],
            precedents: vec![],
            concepts: vec![],
        })
        .unwrap()
    }

    #[test]
    fn test_weights_scaled_and_renormalized() {
        let kb = kb();
        let resolved = resolve(
            &kb.snapshot(),
            &[FrameworkMatch::new("privacy", 0.8), FrameworkMatch::new("constitutional", 0.4)],
        )
        .unwrap();

        let weights: Vec<(&str, f64)> = resolved
            .iter()
            .map(|d| (d.dimension_id.as_str(), d.weight))
            .collect();
        // raw: consent 0.8, rights 0.24, remedies 0.16, total 1.2
        assert_eq!(weights[0].0, "consent");
        assert!((weights[0].1 - 0.8 / 1.2).abs() < 1e-12);
        assert!((weights[1].1 - 0.24 / 1.2).abs() < 1e-12);
        assert!((weights[2].1 - 0.16 / 1.2).abs() < 1e-12);
        let sum: f64 = resolved.iter().map(|d| d.weight).sum();
        assert!((sum - 1.0).abs() < 1e-12);

        let candidates: Vec<&str> = resolved.candidates().iter().map(|a| a.as_str()).collect();
        assert_eq!(candidates, vec!["p1", "a21", "a14", "a32"]);
        let frameworks: Vec<&str> = resolved.framework_ids().iter().map(|f| f.as_str()).collect();
        assert_eq!(frameworks, vec!["privacy", "constitutional"]);
    }

    #[test]
    fn test_zero_confidence_is_noop() {
        let kb = kb();
        let snapshot = kb.snapshot();
        let with = resolve(
            &snapshot,
            &[FrameworkMatch::new("privacy", 0.7), FrameworkMatch::new("constitutional", 0.0)],
        )
        .unwrap();
        let without = resolve(&snapshot, &[FrameworkMatch::new("privacy", 0.7)]).unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_all_zero_is_empty() {
        let kb = kb();
        let resolved = resolve(&kb.snapshot(), &[FrameworkMatch::new("privacy", 0.0)]).unwrap();
        assert!(resolved.is_empty());
        assert!(resolve(&kb.snapshot(), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_errors() {
        let kb = kb();
        let snapshot = kb.snapshot();
        assert!(matches!(
            resolve(&snapshot, &[FrameworkMatch::new("tax", 0.5)]),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            resolve(&snapshot, &[FrameworkMatch::new("privacy", 1.5)]),
            Err(EngineError::InvalidQuery(_))
        ));
        assert!(matches!(
            resolve(&snapshot, &[FrameworkMatch::new("privacy", f64::NAN)]),
            Err(EngineError::InvalidQuery(_))
        ));
        assert!(matches!(
            resolve(
                &snapshot,
                &[FrameworkMatch::new("privacy", 0.5), FrameworkMatch::new("privacy", 0.4)]
            ),
            Err(EngineError::InvalidQuery(_))
        ));
    }
}
