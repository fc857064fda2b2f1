//! Analysis report handed to report and chat consumers

use crate::aggregator::{Aggregation, Contribution, FrameworkComposite};
use crate::classifier::FrameworkMatch;
use nyaya_domain::{
    round2, ClauseId, ClauseMatch, ComplianceLevel, ConflictFlag, DocumentId, RiskLevel, RunId,
    ScoreRecord, UnmatchedClause,
};
use serde::{Deserialize, Serialize};

/// Result of one completed analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Run that produced (or re-served) the report
    pub run_id: RunId,
    /// Analyzed document
    pub document_id: DocumentId,
    /// Snapshot version the run read
    pub knowledge_base_version: u64,
    /// Embedding provider name
    pub provider: String,
    /// Frameworks selected by the classifier
    pub frameworks: Vec<FrameworkMatch>,
    /// One record per resolved dimension
    pub records: Vec<ScoreRecord>,
    /// Composite per active Framework
    pub framework_composites: Vec<FrameworkComposite>,
    /// Document composite; `None` when no dimension had evidence
    pub overall: Option<f64>,
    /// Match outcome per clause, in document order
    pub clause_matches: Vec<ClauseMatch>,
    /// Clauses scored on keywords only because embedding failed or timed out
    pub degraded_clauses: Vec<ClauseId>,
    /// Conflicting Article pairs found within single clauses
    pub conflicts: Vec<ConflictFlag>,
    /// Whether the report came from the result cache
    #[serde(default)]
    pub cached: bool,
}

impl AnalysisReport {
    /// Scores and composites as an [`Aggregation`]
    pub fn aggregation(&self) -> Aggregation {
        Aggregation {
            records: self.records.clone(),
            framework_composites: self.framework_composites.clone(),
            overall: self.overall,
        }
    }

    /// How each scored dimension adds up to the overall composite
    pub fn contributions(&self) -> Vec<Contribution> {
        self.aggregation().contributions()
    }

    /// Overall composite rounded to two decimals
    pub fn rounded(&self) -> Option<f64> {
        self.overall.map(round2)
    }

    /// Compliance band of the overall composite
    pub fn compliance_level(&self) -> Option<ComplianceLevel> {
        self.overall.map(ComplianceLevel::from_score)
    }

    /// Risk band of the overall composite
    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.overall.map(RiskLevel::from_score)
    }

    /// Clauses no candidate Article matched
    pub fn unmatched_clauses(&self) -> Vec<&UnmatchedClause> {
        self.clause_matches
            .iter()
            .filter_map(|m| match m {
                ClauseMatch::Unmatched(u) => Some(u),
                ClauseMatch::Matched { .. } => None,
            })
            .collect()
    }

    /// Records flagged with a conflict
    pub fn conflicting_records(&self) -> impl Iterator<Item = &ScoreRecord> {
        self.records.iter().filter(|r| r.conflict)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
