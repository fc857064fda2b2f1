//! Nyaya Knowledge Graph Store
//!
//! Implements the [`KnowledgeGraph`](nyaya_domain::KnowledgeGraph) trait over
//! an immutable, versioned, in-memory snapshot.
//!
//! # Architecture
//!
//! - Arena of Articles keyed by id; relations are id pairs on the source
//! - Keyword index (stem to Article posting lists) for keyword search
//! - Exact cosine vector index for similarity search
//! - [`KnowledgeBase`] holds the current snapshot behind a lock and swaps in
//!   a fully validated replacement on reload, so readers observe either the
//!   old graph or the new one
//!
//! # Examples
//!
//! ```
//! use nyaya_domain::{ArticleId, KnowledgeGraph};
//! use nyaya_store::{KnowledgeBase, KnowledgeBaseSpec};
//!
//! let spec = KnowledgeBaseSpec::from_toml_str(r#"
//! [[frameworks]]
//! id = "privacy"
//! name = "Privacy"
//! [[frameworks.dimensions]]
//! id = "consent"
//! name = "Consent"
//! weight = 1.0
//! required_articles = ["p1"]
//!
//! [[articles]]
//! id = "p1"
//! framework = "privacy"
//! text = "consent for data processing"
//! keywords = ["consent"]
//! "#).unwrap();
//!
//! let kb = KnowledgeBase::load(spec).unwrap();
//! let snapshot = kb.snapshot();
//! assert_eq!(snapshot.get_article(&ArticleId::new("p1")).unwrap().text, "consent for data processing");
//! ```

#![warn(missing_docs)]

pub mod keyword_index;
pub mod knowledge_base;
pub mod loader;
pub mod snapshot;
pub mod spec;
pub mod vector_index;

use nyaya_embed::EmbedError;
use thiserror::Error;

pub use knowledge_base::KnowledgeBase;
pub use snapshot::{GraphStats, KnowledgeSnapshot};
pub use spec::KnowledgeBaseSpec;
pub use vector_index::{VectorIndex, VectorIndexError};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Unknown id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed query parameters
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Knowledge-base structure violates an invariant
    #[error("Invalid knowledge base: {}", .0.join("; "))]
    ConfigurationInvalid(Vec<String>),

    /// Knowledge-base file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding missing Article vectors failed
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbedError),
}

impl From<VectorIndexError> for StoreError {
    fn from(err: VectorIndexError) -> Self {
        StoreError::InvalidQuery(err.to_string())
    }
}

/// Result alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
