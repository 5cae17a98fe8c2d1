//! Debounced search → geocode aggregation pipeline
//!
//! keystroke → [`QueryDebouncer`] → [`SuggestionFetcher`] → (on trigger)
//! [`GeocodeAggregator`], gated by [`SubmissionGate`] → ordered locations.
//!
//! The components are plain state machines; [`Pipeline`] wires them into a
//! single controller task.

pub mod aggregator;
pub mod controller;
pub mod debouncer;
pub mod fetcher;
pub mod gate;

pub use aggregator::{resolve_batch, AggregationRun, GeocodeAggregator, SettledRun};
pub use controller::{Pipeline, PipelineHandle, PipelineSettings, PipelineSnapshot};
pub use debouncer::{DebouncedQuery, QueryDebouncer};
pub use fetcher::{FetchOutcome, FetchReply, FetchRequest, FetchStart, SuggestionFetcher};
pub use gate::{AggregationState, SubmissionGate};
