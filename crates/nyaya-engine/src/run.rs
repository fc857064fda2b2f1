//! Analysis run lifecycle
//!
//! A run moves `Classified → FrameworksResolved → Matched → Aggregated →
//! Final` one step at a time. Any other move is rejected with
//! `InvalidTransition` and leaves the run unchanged.

use crate::{EngineError, Result};
use nyaya_domain::{DocumentId, RunId, RunState};
use tracing::debug;

/// One analysis of one document against one knowledge-base snapshot
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    id: RunId,
    document_id: DocumentId,
    snapshot_version: u64,
    state: RunState,
    history: Vec<RunState>,
}

impl AnalysisRun {
    /// Start a run; every run gets a fresh id, including re-runs
    pub fn new(document_id: DocumentId, snapshot_version: u64) -> Self {
        Self {
            id: RunId::new(),
            document_id,
            snapshot_version,
            state: RunState::Classified,
            history: vec![RunState::Classified],
        }
    }

    /// Run id
    pub fn id(&self) -> RunId {
        self.id
    }

    /// Document under analysis
    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    /// Version of the snapshot the run reads
    pub fn snapshot_version(&self) -> u64 {
        self.snapshot_version
    }

    /// Current state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// States visited so far, oldest first
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    /// Whether the run reached `Final`
    pub fn is_final(&self) -> bool {
        self.state.is_terminal()
    }

    /// Move to `to`
    pub fn advance(&mut self, to: RunState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(EngineError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        debug!(run = %self.id, from = %self.state, to = %to, "Run state transition");
        self.state = to;
        self.history.push(to);
        Ok(())
    }
}
