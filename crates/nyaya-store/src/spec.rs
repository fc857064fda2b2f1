//! Knowledge-base file format
//!
//! A knowledge base is a flat list of Frameworks, Articles, Precedents and
//! Concepts, read from TOML or JSON. Parsing does not validate; see
//! [`loader::validate`](crate::loader::validate).

use crate::{Result, StoreError};
use nyaya_domain::{Article, Concept, Framework, Precedent};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bulk-load input for a knowledge base
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseSpec {
    /// Framework definitions
    #[serde(default)]
    pub frameworks: Vec<Framework>,

    /// Article records
    #[serde(default)]
    pub articles: Vec<Article>,

    /// Precedent records
    #[serde(default)]
    pub precedents: Vec<Precedent>,

    /// Concept records
    #[serde(default)]
    pub concepts: Vec<Concept>,
}

impl KnowledgeBaseSpec {
    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| StoreError::Parse(format!("TOML: {}", e)))
    }

    /// Parse a JSON document
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| StoreError::Parse(format!("JSON: {}", e)))
    }

    /// Read a knowledge base file; `.json` files are JSON, anything else TOML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::Parse(e.to_string()))
    }
}
