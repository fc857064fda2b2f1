//! Framework module - legal domains as data
//!
//! A Framework is never a type-level variant: new legal domains are added by
//! loading new records, and the engine only ever sees "a set of weighted
//! dimensions with required-Article sets".

use crate::{ArticleId, DimensionId, FrameworkId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Allowed deviation of a Framework's dimension weight sum from 1.0
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// A weighted sub-aspect of compliance within a Framework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceDimension {
    /// Identifier, unique within the Framework
    pub id: DimensionId,

    /// Display name, e.g. "Privacy Protection"
    pub name: String,

    /// Weight within the Framework [0.0, 1.0]
    pub weight: f64,

    /// Articles this dimension is judged against
    #[serde(default)]
    pub required_articles: Vec<ArticleId>,
}

impl ComplianceDimension {
    /// Create a dimension
    pub fn new(
        id: impl Into<DimensionId>,
        name: impl Into<String>,
        weight: f64,
        required_articles: Vec<ArticleId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weight,
            required_articles,
        }
    }

    /// Whether `article` is one of this dimension's required Articles
    pub fn requires(&self, article: &ArticleId) -> bool {
        self.required_articles.iter().any(|a| a == article)
    }
}

/// A named legal domain with its own scoring dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Framework {
    /// Unique identifier
    pub id: FrameworkId,

    /// Display name, e.g. "Digital Personal Data Protection Act, 2023"
    pub name: String,

    /// Selection priority (lower is more important)
    #[serde(default)]
    pub priority: u32,

    /// Ordered compliance dimensions
    pub dimensions: Vec<ComplianceDimension>,

    /// Classifier indicator phrases
    #[serde(default)]
    pub indicators: Vec<String>,
}

impl Framework {
    /// Look up a dimension by id
    pub fn dimension(&self, id: &DimensionId) -> Option<&ComplianceDimension> {
        self.dimensions.iter().find(|d| &d.id == id)
    }

    /// Sum of the dimension weights
    pub fn weight_sum(&self) -> f64 {
        self.dimensions.iter().map(|d| d.weight).sum()
    }

    /// Union of required Articles across dimensions, in first-seen order
    pub fn required_articles(&self) -> Vec<&ArticleId> {
        let mut seen = HashSet::new();
        self.dimensions
            .iter()
            .flat_map(|d| d.required_articles.iter())
            .filter(|a| seen.insert(*a))
            .collect()
    }

    /// Check the structural invariants of the weight vector
    ///
    /// Every weight must be finite and in [0, 1], dimension ids must be
    /// unique, and the weights must sum to 1.0 within [`WEIGHT_TOLERANCE`].
    pub fn validate_weights(&self) -> Result<(), String> {
        if self.dimensions.is_empty() {
            return Err(format!("framework '{}' has no dimensions", self.id));
        }

        let mut ids = HashSet::new();
        for dim in &self.dimensions {
            if !ids.insert(&dim.id) {
                return Err(format!(
                    "framework '{}' defines dimension '{}' more than once",
                    self.id, dim.id
                ));
            }
            if !dim.weight.is_finite() || !(0.0..=1.0).contains(&dim.weight) {
                return Err(format!(
                    "dimension '{}.{}' has weight {} outside [0, 1]",
                    self.id, dim.id, dim.weight
                ));
            }
        }

        let sum = self.weight_sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(format!(
                "dimension weights of framework '{}' sum to {}, expected 1.0",
                self.id, sum
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framework(weights: &[f64]) -> Framework {
        Framework {
            id: FrameworkId::new("dpdpa"),
            name: "DPDPA".to_string(),
            priority: 2,
            dimensions: weights
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    ComplianceDimension::new(
                        format!("d{}", i),
                        format!("Dimension {}", i),
                        *w,
                        vec![ArticleId::new(format!("a{}", i))],
                    )
                })
                .collect(),
            indicators: vec!["personal data".to_string()],
        }
    }

    #[test]
    fn test_valid_weights() {
        assert!(framework(&[0.4, 0.35, 0.25]).validate_weights().is_ok());
        assert!(framework(&[1.0]).validate_weights().is_ok());
        // within tolerance
        assert!(framework(&[0.5, 0.5000005]).validate_weights().is_ok());
    }

    #[test]
    fn test_invalid_weights() {
        assert!(framework(&[0.5, 0.4]).validate_weights().is_err());
        assert!(framework(&[0.5, 0.51]).validate_weights().is_err());
        assert!(framework(&[1.5, -0.5]).validate_weights().is_err());
        assert!(framework(&[f64::NAN, 1.0]).validate_weights().is_err());
        assert!(framework(&[]).validate_weights().is_err());
    }

    #[test]
    fn test_duplicate_dimension_rejected() {
        let mut fw = framework(&[0.5, 0.5]);
        fw.dimensions[1].id = DimensionId::new("d0");
        let err = fw.validate_weights().unwrap_err();
        assert!(err.contains("more than once"));
    }

    #[test]
    fn test_required_articles_union() {
        let mut fw = framework(&[0.5, 0.5]);
        fw.dimensions[1].required_articles.push(ArticleId::new("a0"));
        let ids: Vec<&str> = fw.required_articles().iter().map(|a| a.as_str()).collect();
        assert_eq!(ids, vec!["a0", "a1"]);
    }
}
