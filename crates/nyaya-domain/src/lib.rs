//! Nyaya Domain Layer
//!
//! This crate contains the data model of the compliance reasoning engine:
//! knowledge-graph records, document clauses, match evidence and score
//! records, plus the trait boundary to the knowledge graph store.
//!
//! ## Key Concepts
//!
//! - **Article**: An atomic provision node in the knowledge graph
//! - **Framework**: A named legal domain with weighted compliance dimensions
//! - **Precedent**: A case-derived authority that strengthens Article matches
//! - **MatchEvidence**: A scored link between a document clause and an Article
//! - **ScoreRecord**: The per-dimension outcome of one analysis run
//!
//! ## Architecture
//!
//! - No infrastructure code (no I/O, no async)
//! - Records are plain data, immutable once the knowledge base is built
//! - Relationships are stored as id pairs, never as embedded references
//! - Trait definitions for the graph store live in [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod article;
pub mod concept;
pub mod document;
pub mod evidence;
pub mod framework;
pub mod ids;
pub mod precedent;
pub mod relationship;
pub mod run;
pub mod score;
pub mod text;
pub mod traits;

// Re-exports for convenience
pub use article::Article;
pub use concept::Concept;
pub use document::{Clause, Document};
pub use evidence::{ClauseMatch, ConflictFlag, MatchEvidence, MatchKind, UnmatchedClause};
pub use framework::{ComplianceDimension, Framework, WEIGHT_TOLERANCE};
pub use ids::{ArticleId, ClauseId, ConceptId, DimensionId, DocumentId, FrameworkId, PrecedentId};
pub use precedent::Precedent;
pub use relationship::{Relation, RelationType};
pub use run::{RunId, RunState};
pub use score::{round2, ComplianceLevel, ConfidenceLevel, DimensionScore, RiskLevel, ScoreRecord};
pub use traits::{KnowledgeGraph, Neighbor};
