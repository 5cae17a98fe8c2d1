//! Suggestion fetching with latest-request-wins semantics
//!
//! Every settled query gets a new sequence number. A reply is applied only
//! if its sequence is still the latest issued; anything older is superseded
//! and dropped without touching state.

use crate::error::FetchError;
use crate::types::{PlacesSearch, SearchOptions, SearchStatus, SuggestionBatch};
use placepin_common::events::{EventBus, PipelineEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of handling a settled query
pub enum FetchStart {
    /// Query was empty; batch cleared, nothing to request
    Cleared,
    /// Request must be run and its reply handed back to [`SuggestionFetcher::apply`]
    Issued(FetchRequest),
}

/// One outstanding places-search request
pub struct FetchRequest {
    seq: u64,
    query: String,
    provider: Arc<dyn PlacesSearch>,
    options: SearchOptions,
}

impl FetchRequest {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Perform the provider round trip
    pub async fn run(self) -> FetchReply {
        let result = self.provider.search(&self.query, &self.options).await;
        FetchReply {
            seq: self.seq,
            query: self.query,
            result,
        }
    }
}

/// Completed places-search request
#[derive(Debug)]
pub struct FetchReply {
    pub seq: u64,
    pub query: String,
    pub result: Result<SuggestionBatch, FetchError>,
}

/// What `apply` did with a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Reply was current; state now reflects it
    Applied(SearchStatus),
    /// A newer request was issued after this one
    Superseded,
}

/// Owns suggestion status and the current batch
pub struct SuggestionFetcher {
    provider: Arc<dyn PlacesSearch>,
    options: SearchOptions,
    events: EventBus,
    latest_seq: u64,
    query: String,
    status: SearchStatus,
    batch: SuggestionBatch,
}

impl SuggestionFetcher {
    pub fn new(provider: Arc<dyn PlacesSearch>, options: SearchOptions, events: EventBus) -> Self {
        Self {
            provider,
            options,
            events,
            latest_seq: 0,
            query: String::new(),
            status: SearchStatus::Empty,
            batch: SuggestionBatch::empty(),
        }
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn batch(&self) -> &SuggestionBatch {
        &self.batch
    }

    /// Query of the latest issued (or cleared) request
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Handle a settled query
    ///
    /// Always supersedes any request still in flight, including when the new
    /// query is empty.
    pub fn on_query_changed(&mut self, text: &str) -> FetchStart {
        self.latest_seq += 1;
        self.query = text.to_string();

        if text.is_empty() {
            debug!(seq = self.latest_seq, "Empty query, clearing suggestions");
            self.replace_batch(SuggestionBatch::empty());
            self.set_status(SearchStatus::Empty);
            return FetchStart::Cleared;
        }

        self.set_status(SearchStatus::Loading);
        debug!(seq = self.latest_seq, query = %text, provider = self.provider.name(), "Issuing suggestion request");

        FetchStart::Issued(FetchRequest {
            seq: self.latest_seq,
            query: self.query.clone(),
            provider: Arc::clone(&self.provider),
            options: self.options.clone(),
        })
    }

    /// Apply a completed request if it is still the latest one
    pub fn apply(&mut self, reply: FetchReply) -> FetchOutcome {
        if reply.seq != self.latest_seq || reply.query != self.query {
            debug!(
                seq = reply.seq,
                latest = self.latest_seq,
                query = %reply.query,
                "Discarding superseded suggestion reply"
            );
            return FetchOutcome::Superseded;
        }

        match reply.result {
            Ok(batch) => {
                let count = batch.len();
                info!(seq = reply.seq, query = %reply.query, count, "Suggestions applied");
                self.replace_batch(batch);
                self.set_status(SearchStatus::Ok);
                if count > 0 {
                    self.events
                        .emit_lossy(PipelineEvent::suggestions_found(reply.query, count));
                }
                FetchOutcome::Applied(SearchStatus::Ok)
            }
            Err(e) => {
                warn!(seq = reply.seq, query = %reply.query, error = %e, "Suggestion request failed");
                self.replace_batch(SuggestionBatch::empty());
                self.set_status(SearchStatus::Error);
                FetchOutcome::Applied(SearchStatus::Error)
            }
        }
    }

    fn set_status(&mut self, status: SearchStatus) {
        if self.status != status {
            self.status = status;
            self.events.emit_lossy(PipelineEvent::status_changed(status));
        }
    }

    fn replace_batch(&mut self, batch: SuggestionBatch) {
        if self.batch != batch {
            self.batch = batch;
            self.events
                .emit_lossy(PipelineEvent::batch_changed(self.batch.clone()));
        }
    }
}
