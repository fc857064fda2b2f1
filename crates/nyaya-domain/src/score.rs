//! Score module - dimension outcomes and composite banding

use crate::{DimensionId, FrameworkId, MatchEvidence};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round a score to two decimals for display
///
/// The unrounded value is what the engine compares and caches.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Outcome of scoring one dimension
///
/// `InsufficientEvidence` is a first-class state, never a score of zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DimensionScore {
    /// At least one qualifying piece of evidence was found
    Scored {
        /// Weighted mean of effective evidence scores [0.0, 1.0]
        value: f64,
    },

    /// No qualifying evidence
    InsufficientEvidence,
}

impl DimensionScore {
    /// The score value, if scored
    pub fn value(&self) -> Option<f64> {
        match self {
            DimensionScore::Scored { value } => Some(*value),
            DimensionScore::InsufficientEvidence => None,
        }
    }

    /// Whether this dimension counts toward composites
    pub fn is_scored(&self) -> bool {
        matches!(self, DimensionScore::Scored { .. })
    }
}

impl fmt::Display for DimensionScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionScore::Scored { value } => write!(f, "{:.2}", value),
            DimensionScore::InsufficientEvidence => f.write_str("insufficient evidence"),
        }
    }
}

/// Per-dimension result of an analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Framework of the dimension
    pub framework_id: FrameworkId,

    /// The dimension
    pub dimension_id: DimensionId,

    /// Display name of the dimension
    pub dimension_name: String,

    /// Weight within the Framework, as defined
    pub base_weight: f64,

    /// Cross-framework weight after confidence scaling and renormalization
    pub resolved_weight: f64,

    /// Qualifying evidence, in clause order
    pub evidence: Vec<MatchEvidence>,

    /// The dimension score
    pub score: DimensionScore,

    /// Confidence in the score [0.0, 1.0]
    pub confidence: f64,

    /// Required Articles with at least one piece of evidence
    pub matched_articles: usize,

    /// Number of required Articles
    pub required_articles: usize,

    /// True when the evidence contains an Article of a conflicting pair
    pub conflict: bool,
}

/// Compliance banding of a composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceLevel {
    /// Below 0.60
    Poor,
    /// 0.60 to 0.70
    NeedsImprovement,
    /// 0.70 to 0.80
    Satisfactory,
    /// 0.80 to 0.90
    Good,
    /// 0.90 and above
    Excellent,
}

impl ComplianceLevel {
    /// Band a score
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            ComplianceLevel::Excellent
        } else if score >= 0.8 {
            ComplianceLevel::Good
        } else if score >= 0.7 {
            ComplianceLevel::Satisfactory
        } else if score >= 0.6 {
            ComplianceLevel::NeedsImprovement
        } else {
            ComplianceLevel::Poor
        }
    }

    /// Get the level name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceLevel::Poor => "poor",
            ComplianceLevel::NeedsImprovement => "needs_improvement",
            ComplianceLevel::Satisfactory => "satisfactory",
            ComplianceLevel::Good => "good",
            ComplianceLevel::Excellent => "excellent",
        }
    }
}

/// Risk banding of a composite score (higher score, lower risk)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// 0.87 and above
    VeryLow,
    /// 0.72 to 0.87
    Low,
    /// 0.57 to 0.72
    Medium,
    /// 0.37 to 0.57
    High,
    /// Below 0.37
    VeryHigh,
}

impl RiskLevel {
    /// Band a score
    pub fn from_score(score: f64) -> Self {
        if score >= 0.87 {
            RiskLevel::VeryLow
        } else if score >= 0.72 {
            RiskLevel::Low
        } else if score >= 0.57 {
            RiskLevel::Medium
        } else if score >= 0.37 {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }

    /// Get the level name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "very_low",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
        }
    }
}

/// Label for a classifier confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// Below 0.3
    VeryLow,
    /// 0.3 to 0.5
    Low,
    /// 0.5 to 0.7
    Medium,
    /// 0.7 to 0.9
    High,
    /// 0.9 and above
    VeryHigh,
}

impl ConfidenceLevel {
    /// Label a confidence value
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.9 {
            ConfidenceLevel::VeryHigh
        } else if confidence >= 0.7 {
            ConfidenceLevel::High
        } else if confidence >= 0.5 {
            ConfidenceLevel::Medium
        } else if confidence >= 0.3 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }

    /// Get the label as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryLow => "very_low",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
            ConfidenceLevel::VeryHigh => "very_high",
        }
    }
}
