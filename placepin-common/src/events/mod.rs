//! Event types for the placepin event system
//!
//! Provides the pipeline event definitions and the EventBus the presentation
//! layer subscribes to.

mod place_types;

pub use place_types::{
    LatLng, ResolvedLocation, ResolvedLocationSet, SearchStatus, Suggestion, SuggestionBatch,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Pipeline event types
///
/// Everything the presentation layer can observe is emitted as one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// Debounced query settled and is about to be searched
    QueryChanged {
        query: String,
        timestamp: DateTime<Utc>,
    },

    /// Suggestion fetch status changed
    StatusChanged {
        status: SearchStatus,
        timestamp: DateTime<Utc>,
    },

    /// Current suggestion batch replaced (possibly with an empty batch)
    BatchChanged {
        batch: SuggestionBatch,
        timestamp: DateTime<Utc>,
    },

    /// Non-empty batch applied; drives the "N results found" notification
    SuggestionsFound {
        query: String,
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Aggregation run settled and published its locations
    ResultSetPublished {
        set: ResolvedLocationSet,
        timestamp: DateTime<Utc>,
    },

    /// Previously published locations no longer apply (new query)
    ResultsCleared { timestamp: DateTime<Utc> },

    /// Aggregation trigger ignored
    AggregationRejected {
        reason: RejectReason,
        timestamp: DateTime<Utc>,
    },
}

/// Why an aggregation trigger was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// A run is already in flight for this batch
    InFlight,
    /// Status is not OK, so there is no batch to resolve
    NoBatch,
}

impl PipelineEvent {
    pub fn query_changed(query: impl Into<String>) -> Self {
        Self::QueryChanged {
            query: query.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn status_changed(status: SearchStatus) -> Self {
        Self::StatusChanged {
            status,
            timestamp: Utc::now(),
        }
    }

    pub fn batch_changed(batch: SuggestionBatch) -> Self {
        Self::BatchChanged {
            batch,
            timestamp: Utc::now(),
        }
    }

    pub fn suggestions_found(query: impl Into<String>, count: usize) -> Self {
        Self::SuggestionsFound {
            query: query.into(),
            count,
            timestamp: Utc::now(),
        }
    }

    pub fn result_set_published(set: ResolvedLocationSet) -> Self {
        Self::ResultSetPublished {
            set,
            timestamp: Utc::now(),
        }
    }

    pub fn results_cleared() -> Self {
        Self::ResultsCleared {
            timestamp: Utc::now(),
        }
    }

    pub fn aggregation_rejected(reason: RejectReason) -> Self {
        Self::AggregationRejected {
            reason,
            timestamp: Utc::now(),
        }
    }

    /// Variant name, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QueryChanged { .. } => "QueryChanged",
            Self::StatusChanged { .. } => "StatusChanged",
            Self::BatchChanged { .. } => "BatchChanged",
            Self::SuggestionsFound { .. } => "SuggestionsFound",
            Self::ResultSetPublished { .. } => "ResultSetPublished",
            Self::ResultsCleared { .. } => "ResultsCleared",
            Self::AggregationRejected { .. } => "AggregationRejected",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Distribution bus for pipeline events
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block the pipeline)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use placepin_common::events::{EventBus, PipelineEvent, SearchStatus};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(PipelineEvent::status_changed(SearchStatus::Loading));
///
/// match rx.try_recv().unwrap() {
///     PipelineEvent::StatusChanged { status, .. } => assert_eq!(status, SearchStatus::Loading),
///     other => panic!("unexpected event: {:?}", other),
/// }
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PipelineEvent,
    ) -> Result<usize, broadcast::error::SendError<PipelineEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PipelineEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No subscribers for pipeline event");
        }
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
