//! Configuration for analysis runs
//!
//! Blend weights, thresholds and runtime limits. All of them are defaults,
//! not fixed constants; deployments tune them through a TOML file.

use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const SUM_TOLERANCE: f64 = 1e-6;

/// Document classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Weight of indicator-phrase coverage
    /// Default: 0.5
    pub indicator_weight: f64,

    /// Weight of Article keyword coverage
    /// Default: 0.3
    pub keyword_weight: f64,

    /// Weight of explicit citation coverage
    /// Default: 0.2
    pub citation_weight: f64,

    /// Distinct hits needed for full coverage of one signal family
    /// Default: 3
    pub saturation: usize,

    /// Frameworks below this confidence are not applied
    /// Default: 0.15
    pub min_confidence: f64,

    /// Maximum number of frameworks applied to one document
    /// Default: 4
    pub max_frameworks: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            indicator_weight: 0.5,
            keyword_weight: 0.3,
            citation_weight: 0.2,
            saturation: 3,
            min_confidence: 0.15,
            max_frameworks: 4,
        }
    }
}

/// Clause-to-Article matcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Weight of keyword overlap in the blended score
    /// Default: 0.4
    pub keyword_weight: f64,

    /// Weight of semantic similarity in the blended score
    /// Default: 0.6
    pub semantic_weight: f64,

    /// Candidates scoring below this are discarded
    /// Default: 0.2
    pub similarity_floor: f64,

    /// Maximum evidence kept per clause
    /// Default: 5
    pub top_k: usize,

    /// Maximum relation distance considered when breaking score ties
    /// Default: 2
    pub locality_depth: usize,

    /// Both Articles of a `conflicts_with` pair must reach this to be flagged
    /// Default: 0.6
    pub conflict_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            keyword_weight: 0.4,
            semantic_weight: 0.6,
            similarity_floor: 0.2,
            top_k: 5,
            locality_depth: 2,
            conflict_threshold: 0.6,
        }
    }
}

/// Scoring aggregator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Added per unit of precedent strength to precedent-linked evidence
    /// Default: 0.1
    pub precedent_boost: f64,

    /// Confidence lost when every matched Article came from degraded evidence
    /// Default: 0.5
    pub degraded_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            precedent_boost: 0.1,
            degraded_penalty: 0.5,
        }
    }
}

/// Concurrency, timeout and cache limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Upper bound on concurrent embedding calls per run; the provider's own
    /// limit applies when lower
    /// Default: 8
    pub max_concurrency: usize,

    /// Deadline for one embedding call (in milliseconds)
    /// Default: 2000
    pub embedding_timeout_ms: u64,

    /// Number of reports kept in the result cache (0 disables caching)
    /// Default: 64
    pub cache_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            embedding_timeout_ms: 2000,
            cache_capacity: 64,
        }
    }
}

impl RuntimeConfig {
    /// Get the embedding timeout as a Duration
    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }
}

/// Configuration for the compliance engine
///
/// # Examples
///
/// ```
/// use nyaya_engine::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.matcher.similarity_floor, 0.2);
/// assert!(config.validate().is_ok());
///
/// let strict = EngineConfig::strict();
/// assert!(strict.matcher.similarity_floor > config.matcher.similarity_floor);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Classifier settings
    pub classifier: ClassifierConfig,

    /// Matcher settings
    pub matcher: MatcherConfig,

    /// Aggregator settings
    pub scoring: ScoringConfig,

    /// Runtime limits
    pub runtime: RuntimeConfig,
}

fn check_unit(errors: &mut Vec<String>, name: &str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(format!("{} must be in [0, 1], got {}", name, value));
    }
}

impl EngineConfig {
    /// Strict preset: fewer frameworks, higher floors, weaker fallback
    ///
    /// - Minimum framework confidence: 0.25
    /// - Similarity floor: 0.3
    /// - Conflict threshold: 0.5
    /// - Degraded penalty: 0.75
    pub fn strict() -> Self {
        Self {
            classifier: ClassifierConfig {
                min_confidence: 0.25,
                max_frameworks: 3,
                ..ClassifierConfig::default()
            },
            matcher: MatcherConfig {
                similarity_floor: 0.3,
                top_k: 3,
                conflict_threshold: 0.5,
                ..MatcherConfig::default()
            },
            scoring: ScoringConfig {
                precedent_boost: 0.05,
                degraded_penalty: 0.75,
            },
            runtime: RuntimeConfig {
                embedding_timeout_ms: 1000,
                ..RuntimeConfig::default()
            },
        }
    }

    /// Lenient preset: more frameworks and evidence, longer deadlines
    ///
    /// - Minimum framework confidence: 0.05
    /// - Similarity floor: 0.1
    /// - Evidence per clause: 10
    pub fn lenient() -> Self {
        Self {
            classifier: ClassifierConfig {
                min_confidence: 0.05,
                max_frameworks: 8,
                ..ClassifierConfig::default()
            },
            matcher: MatcherConfig {
                similarity_floor: 0.1,
                top_k: 10,
                locality_depth: 3,
                conflict_threshold: 0.7,
                ..MatcherConfig::default()
            },
            scoring: ScoringConfig {
                precedent_boost: 0.15,
                degraded_penalty: 0.25,
            },
            runtime: RuntimeConfig {
                embedding_timeout_ms: 5000,
                ..RuntimeConfig::default()
            },
        }
    }

    /// Validate the configuration, reporting every problem at once
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let c = &self.classifier;
        check_unit(&mut errors, "classifier.indicator_weight", c.indicator_weight);
        check_unit(&mut errors, "classifier.keyword_weight", c.keyword_weight);
        check_unit(&mut errors, "classifier.citation_weight", c.citation_weight);
        let sum = c.indicator_weight + c.keyword_weight + c.citation_weight;
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            errors.push(format!("classifier weights must sum to 1.0, got {}", sum));
        }
        if c.saturation == 0 {
            errors.push("classifier.saturation must be greater than 0".to_string());
        }
        check_unit(&mut errors, "classifier.min_confidence", c.min_confidence);
        if c.max_frameworks == 0 {
            errors.push("classifier.max_frameworks must be greater than 0".to_string());
        }

        let m = &self.matcher;
        check_unit(&mut errors, "matcher.keyword_weight", m.keyword_weight);
        check_unit(&mut errors, "matcher.semantic_weight", m.semantic_weight);
        let sum = m.keyword_weight + m.semantic_weight;
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            errors.push(format!("matcher weights must sum to 1.0, got {}", sum));
        }
        if !(m.similarity_floor > 0.0 && m.similarity_floor <= 1.0) {
            errors.push(format!(
                "matcher.similarity_floor must be in (0, 1], got {}",
                m.similarity_floor
            ));
        }
        if m.top_k == 0 {
            errors.push("matcher.top_k must be greater than 0".to_string());
        }
        check_unit(&mut errors, "matcher.conflict_threshold", m.conflict_threshold);

        check_unit(&mut errors, "scoring.precedent_boost", self.scoring.precedent_boost);
        check_unit(&mut errors, "scoring.degraded_penalty", self.scoring.degraded_penalty);

        if self.runtime.max_concurrency == 0 {
            errors.push("runtime.max_concurrency must be greater than 0".to_string());
        }
        if self.runtime.embedding_timeout_ms == 0 {
            errors.push("runtime.embedding_timeout_ms must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::ConfigurationInvalid(errors))
        }
    }

    /// Load and validate configuration from a TOML string
    ///
    /// Missing sections and fields take their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| EngineError::Parse(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| EngineError::Parse(format!("Failed to serialize to TOML: {}", e)))
    }

    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn errors_of(config: &EngineConfig) -> Vec<String> {
        match config.validate() {
            Err(EngineError::ConfigurationInvalid(errors)) => errors,
            other => panic!("expected ConfigurationInvalid, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.classifier.indicator_weight, 0.5);
        assert_eq!(config.classifier.saturation, 3);
        assert_eq!(config.classifier.max_frameworks, 4);
        assert_eq!(config.matcher.keyword_weight, 0.4);
        assert_eq!(config.matcher.semantic_weight, 0.6);
        assert_eq!(config.matcher.top_k, 5);
        assert_eq!(config.scoring.precedent_boost, 0.1);
        assert_eq!(config.runtime.embedding_timeout(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(EngineConfig::strict().validate().is_ok());
        assert!(EngineConfig::lenient().validate().is_ok());
        assert!(EngineConfig::lenient().matcher.top_k > EngineConfig::default().matcher.top_k);
    }

    #[test]
    fn test_blend_weights_must_sum_to_one() {
        let mut config = EngineConfig::default();
        config.matcher.semantic_weight = 0.5;
        let errors = errors_of(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("matcher weights"));
    }

    #[test]
    fn test_every_problem_reported() {
        let mut config = EngineConfig::default();
        config.matcher.similarity_floor = 0.0;
        config.matcher.top_k = 0;
        config.classifier.saturation = 0;
        config.runtime.max_concurrency = 0;
        config.scoring.precedent_boost = 1.5;
        assert_eq!(errors_of(&config).len(), 5);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml(
            r#"
[matcher]
similarity_floor = 0.35

[runtime]
cache_capacity = 0
"#,
        )
        .unwrap();
        assert_eq!(config.matcher.similarity_floor, 0.35);
        assert_eq!(config.matcher.top_k, 5);
        assert_eq!(config.runtime.cache_capacity, 0);
        assert_eq!(config.classifier, ClassifierConfig::default());
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(matches!(
            EngineConfig::from_toml("[matcher]\nkeyword_weight = 0.9"),
            Err(EngineError::ConfigurationInvalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml("[matcher]\ntop_k = \"five\""),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn test_toml_roundtrip_via_file() {
        let config = EngineConfig::strict();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_toml().unwrap().as_bytes()).unwrap();
        assert_eq!(EngineConfig::from_file(file.path()).unwrap(), config);
    }
}
