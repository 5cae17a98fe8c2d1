//! Single-in-flight guard for aggregation runs

use serde::Serialize;
use tracing::debug;

/// Aggregation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationState {
    /// Gate open, ready for a run
    Idle,
    /// A run is in flight; further triggers are rejected
    Resolving,
    /// The run's set is being handed to the presenter
    Published,
}

/// Admits at most one aggregation run at a time
///
/// `IDLE --try_open--> RESOLVING --mark_published--> PUBLISHED --close--> IDLE`
#[derive(Debug)]
pub struct SubmissionGate {
    state: AggregationState,
}

impl SubmissionGate {
    pub fn new() -> Self {
        Self {
            state: AggregationState::Idle,
        }
    }

    pub fn state(&self) -> AggregationState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == AggregationState::Idle
    }

    /// Admit a run and close the gate behind it
    ///
    /// Returns false, changing nothing, if a run is already admitted.
    pub fn try_open(&mut self) -> bool {
        if self.state != AggregationState::Idle {
            debug!(state = ?self.state, "Gate closed, rejecting aggregation");
            return false;
        }
        self.state = AggregationState::Resolving;
        true
    }

    /// The admitted run settled and its output is being published
    pub fn mark_published(&mut self) {
        if self.state == AggregationState::Resolving {
            self.state = AggregationState::Published;
        }
    }

    /// Reopen after the admitted run was published or discarded
    pub fn close(&mut self) {
        self.state = AggregationState::Idle;
    }

    /// Force the gate open for a new batch
    pub fn reset(&mut self) {
        if self.state != AggregationState::Idle {
            debug!(state = ?self.state, "Resetting gate for new batch");
        }
        self.state = AggregationState::Idle;
    }
}

impl Default for SubmissionGate {
    fn default() -> Self {
        Self::new()
    }
}
