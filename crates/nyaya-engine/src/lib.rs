//! Nyaya Compliance Engine
//!
//! Scores a document's compliance against the legal Frameworks of a knowledge
//! graph and explains every score with clause-level evidence.
//!
//! # Overview
//!
//! A document arrives as cleaned clauses from the extraction service. The
//! engine decides which Frameworks apply, maps clauses to the Articles those
//! Frameworks care about, and aggregates the evidence into per-dimension
//! scores and weighted composites. Unavailable embeddings never fail a run:
//! the affected clause falls back to keyword matching and is flagged
//! degraded.
//!
//! # Architecture
//!
//! ```text
//! Document → DocumentClassifier → resolve → ClauseMatcher → ScoringAggregator → AnalysisReport
//!                                               ↑
//!                                   EmbeddingProvider (bounded pool)
//! ```
//!
//! # Key Features
//!
//! - **Framework classification**: Indicator, keyword and citation signals
//! - **Cross-framework weighting**: Dimension weights scaled by confidence and renormalized
//! - **Explainable matching**: Keyword and semantic blend, precedent linkage, graph locality
//! - **Conflict surfacing**: `conflicts_with` Articles matched by one clause are flagged
//! - **Cancellation**: A run-scoped token stops a run without producing a report
//! - **Result cache**: Bounded, keyed by document, Framework set and snapshot version
//!
//! # Example Usage
//!
//! ```no_run
//! use nyaya_domain::Document;
//! use nyaya_embed::LexicalEmbedder;
//! use nyaya_engine::{ComplianceEngine, EngineConfig};
//! use nyaya_store::{KnowledgeBase, KnowledgeBaseSpec};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = Arc::new(LexicalEmbedder::default());
//! let spec = KnowledgeBaseSpec::from_file("data/knowledge_base.toml")?;
//! let kb = KnowledgeBase::load_with_embeddings(spec, embedder.as_ref()).await?;
//!
//! let engine = ComplianceEngine::new(Arc::new(kb), embedder, EngineConfig::default())?;
//! let document = Document::from_texts(
//!     "policy-7",
//!     ["We process personal data only with the consent of the data principal."],
//! );
//!
//! let report = engine.analyze(&document).await?;
//! println!("Overall: {:?}", report.rounded());
//! for contribution in report.contributions() {
//!     println!("{}: {:.2}", contribution.dimension_id, contribution.score);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod cancel;
mod config;
mod engine;
mod error;
mod report;
mod run;

pub mod aggregator;
pub mod classifier;
pub mod matcher;
pub mod selector;

pub use aggregator::{Aggregation, Contribution, FrameworkComposite, ScoringAggregator};
pub use cancel::CancellationToken;
pub use classifier::{ClassifierSignals, DocumentClassifier, FrameworkMatch};
pub use config::{ClassifierConfig, EngineConfig, MatcherConfig, RuntimeConfig, ScoringConfig};
pub use engine::ComplianceEngine;
pub use error::{EngineError, Result};
pub use matcher::{ClauseMatcher, Locality};
pub use report::AnalysisReport;
pub use run::AnalysisRun;
pub use selector::{resolve, ResolvedDimension, ResolvedDimensions};
