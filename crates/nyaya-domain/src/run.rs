//! Run module - identity and lifecycle of one analysis run

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of an analysis run, based on UUIDv7
///
/// Every run gets a fresh id, including a re-run of the same document, and
/// ids sort chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u128);

impl RunId {
    /// Generate a new UUIDv7-based RunId
    ///
    /// # Examples
    ///
    /// ```
    /// use nyaya_domain::RunId;
    ///
    /// let a = RunId::new();
    /// let b = RunId::new();
    /// assert_ne!(a, b);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a RunId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a RunId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid run id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl Serialize for RunId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RunId::from_string(&s).map_err(serde::de::Error::custom)
    }
}

/// Stage of an analysis run
///
/// Runs move strictly forward through
/// `Classified -> FrameworksResolved -> Matched -> Aggregated -> Final`.
/// `Final` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Applicable frameworks have been identified
    Classified,

    /// Cross-framework dimension weights have been resolved
    FrameworksResolved,

    /// Every clause has a match outcome
    Matched,

    /// Score records and composites have been computed
    Aggregated,

    /// The report is sealed
    Final,
}

impl RunState {
    /// Get the state name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Classified => "classified",
            RunState::FrameworksResolved => "frameworks_resolved",
            RunState::Matched => "matched",
            RunState::Aggregated => "aggregated",
            RunState::Final => "final",
        }
    }

    /// The only state this one may move to
    pub fn next(&self) -> Option<Self> {
        match self {
            RunState::Classified => Some(RunState::FrameworksResolved),
            RunState::FrameworksResolved => Some(RunState::Matched),
            RunState::Matched => Some(RunState::Aggregated),
            RunState::Aggregated => Some(RunState::Final),
            RunState::Final => None,
        }
    }

    /// Whether moving to `to` is a legal transition
    pub fn can_transition_to(&self, to: RunState) -> bool {
        self.next() == Some(to)
    }

    /// Whether the state is terminal
    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
