//! Identifier newtypes for knowledge-graph and document records
//!
//! Identifiers are opaque strings assigned at knowledge-base build time
//! (or by the extraction service, for documents and clauses). They order
//! lexicographically, which is the tie-break order used throughout the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from any string-like value
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of an Article (e.g. `article_21`, `dpdpa_s6`)
    ArticleId
);
string_id!(
    /// Identifier of a Framework (e.g. `constitutional`, `dpdpa`)
    FrameworkId
);
string_id!(
    /// Identifier of a compliance dimension, unique within its Framework
    DimensionId
);
string_id!(
    /// Identifier of a Concept (e.g. `due_process`)
    ConceptId
);
string_id!(
    /// Identifier of a Precedent (e.g. `puttaswamy_2017`)
    PrecedentId
);
string_id!(
    /// Identifier of a Document, assigned by the extraction service
    DocumentId
);
string_id!(
    /// Identifier of a Clause, unique within its Document
    ClauseId
);
