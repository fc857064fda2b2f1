//! Document module - cleaned clauses supplied by the extraction service

use crate::{ClauseId, DocumentId};
use serde::{Deserialize, Serialize};

/// A single clause of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Identifier, unique within the document
    pub id: ClauseId,

    /// Cleaned clause text
    pub text: String,

    /// Position in the document (0-based)
    #[serde(default)]
    pub position: usize,

    /// Pre-extracted entities: cited Article or Precedent ids
    #[serde(default)]
    pub entities: Vec<String>,
}

impl Clause {
    /// Create a clause without entities
    pub fn new(id: impl Into<ClauseId>, text: impl Into<String>, position: usize) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            position,
            entities: Vec::new(),
        }
    }

    /// Whether the clause cites the given entity id
    pub fn cites(&self, entity: &str) -> bool {
        self.entities.iter().any(|e| e == entity)
    }
}

/// A document as an ordered sequence of clauses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier assigned by the extraction service
    pub id: DocumentId,

    /// Clauses in document order
    pub clauses: Vec<Clause>,
}

impl Document {
    /// Create a document
    pub fn new(id: impl Into<DocumentId>, clauses: Vec<Clause>) -> Self {
        Self {
            id: id.into(),
            clauses,
        }
    }

    /// Build a document from plain clause texts, numbering clauses `c1..cN`
    pub fn from_texts<I, S>(id: impl Into<DocumentId>, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let clauses = texts
            .into_iter()
            .enumerate()
            .map(|(i, t)| Clause::new(format!("c{}", i + 1), t, i))
            .collect();
        Self::new(id, clauses)
    }

    /// Whether the document has no clauses
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_texts_numbers_clauses() {
        let doc = Document::from_texts("doc-1", ["first", "second"]);
        assert_eq!(doc.clauses.len(), 2);
        assert_eq!(doc.clauses[1].id, ClauseId::new("c2"));
        assert_eq!(doc.clauses[1].position, 1);
    }

    #[test]
    fn test_deserialize_minimal_json() {
        let json = r#"{"id":"d","clauses":[{"id":"c1","text":"hello"}]}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.clauses[0].position, 0);
        assert!(doc.clauses[0].entities.is_empty());
        assert!(!doc.clauses[0].cites("article_21"));
    }
}
