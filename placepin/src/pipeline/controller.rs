//! Pipeline controller
//!
//! One task owns every piece of mutable pipeline state. Commands from the
//! handle and completions from spawned provider calls reach it as messages
//! and are handled one at a time, so nothing here is shared or locked.
//! Stale completions are recognised by their sequence/generation stamps.

use super::aggregator::{GeocodeAggregator, SettledRun};
use super::debouncer::{DebouncedQuery, QueryDebouncer};
use super::fetcher::{FetchReply, FetchStart, SuggestionFetcher};
use super::gate::{AggregationState, SubmissionGate};
use crate::error::PipelineError;
use crate::types::{
    Geocoder, PlacesSearch, ResolvedLocationSet, SearchOptions, SearchStatus, SuggestionBatch,
};
use placepin_common::config::TomlConfig;
use placepin_common::events::{EventBus, PipelineEvent, RejectReason};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Runtime settings for one pipeline
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Quiet interval before a query is searched
    pub debounce: Duration,
    /// Scoping for every suggestion request
    pub search: SearchOptions,
    /// Handle → controller command queue depth
    pub command_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&TomlConfig::default())
    }
}

impl From<&TomlConfig> for PipelineSettings {
    fn from(config: &TomlConfig) -> Self {
        Self {
            debounce: config.debounce(),
            search: SearchOptions::from(&config.search),
            command_capacity: 64,
        }
    }
}

/// Point-in-time copy of the controller state
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSnapshot {
    /// Latest text typed (may not be searched yet)
    pub query: String,
    pub status: SearchStatus,
    pub batch: SuggestionBatch,
    pub result_set: ResolvedLocationSet,
    pub aggregation: AggregationState,
    /// Sequence of the latest issued suggestion request
    pub fetch_seq: u64,
}

enum Command {
    QueryText(String),
    TriggerAggregation,
    Snapshot(oneshot::Sender<PipelineSnapshot>),
}

/// Entry point for starting a pipeline
pub struct Pipeline;

impl Pipeline {
    /// Spawn the controller task and return its handle
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        settings: PipelineSettings,
        places: Arc<dyn PlacesSearch>,
        geocoder: Arc<dyn Geocoder>,
        events: EventBus,
    ) -> PipelineHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(settings.command_capacity.max(1));
        let cancel = CancellationToken::new();

        let controller = Controller::new(settings, places, geocoder, events.clone());
        tokio::spawn(controller.run(cmd_rx, cancel.clone()));

        PipelineHandle {
            tx: cmd_tx,
            events,
            cancel,
        }
    }
}

/// Cloneable handle to a running pipeline
///
/// Dropping every handle stops the controller; so does [`PipelineHandle::shutdown`].
#[derive(Clone)]
pub struct PipelineHandle {
    tx: mpsc::Sender<Command>,
    events: EventBus,
    cancel: CancellationToken,
}

impl PipelineHandle {
    /// Keystroke input: replaces the query text and restarts the debounce timer
    pub async fn on_query_text(&self, text: impl Into<String>) -> Result<(), PipelineError> {
        self.tx.send(Command::QueryText(text.into())).await?;
        Ok(())
    }

    /// Resolve the current batch to coordinates ("show markers")
    ///
    /// Ignored while a run is in flight or when there is no OK batch.
    pub async fn trigger_aggregation(&self) -> Result<(), PipelineError> {
        self.tx.send(Command::TriggerAggregation).await?;
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<PipelineSnapshot, PipelineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(Command::Snapshot(reply_tx)).await?;
        Ok(reply_rx.await?)
    }

    /// Subscribe to pipeline events
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    /// Stop the controller; pending timers and in-flight replies are dropped
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

struct Controller {
    query: String,
    debouncer: QueryDebouncer,
    fetcher: SuggestionFetcher,
    aggregator: GeocodeAggregator,
    gate: SubmissionGate,
    result_set: ResolvedLocationSet,
    events: EventBus,
    debounce_rx: mpsc::UnboundedReceiver<DebouncedQuery>,
    fetch_tx: mpsc::UnboundedSender<FetchReply>,
    fetch_rx: mpsc::UnboundedReceiver<FetchReply>,
    settle_tx: mpsc::UnboundedSender<SettledRun>,
    settle_rx: mpsc::UnboundedReceiver<SettledRun>,
}

impl Controller {
    fn new(
        settings: PipelineSettings,
        places: Arc<dyn PlacesSearch>,
        geocoder: Arc<dyn Geocoder>,
        events: EventBus,
    ) -> Self {
        let (debounce_tx, debounce_rx) = mpsc::unbounded_channel();
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (settle_tx, settle_rx) = mpsc::unbounded_channel();

        Self {
            query: String::new(),
            debouncer: QueryDebouncer::new(settings.debounce, debounce_tx),
            fetcher: SuggestionFetcher::new(places, settings.search, events.clone()),
            aggregator: GeocodeAggregator::new(geocoder),
            gate: SubmissionGate::new(),
            result_set: ResolvedLocationSet::empty(),
            events,
            debounce_rx,
            fetch_tx,
            fetch_rx,
            settle_tx,
            settle_rx,
        }
    }

    async fn run(mut self, mut cmd_rx: mpsc::Receiver<Command>, cancel: CancellationToken) {
        info!(debounce = ?self.debouncer.delay(), "Pipeline started");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },

                Some(emitted) = self.debounce_rx.recv() => self.handle_debounced(emitted),

                Some(reply) = self.fetch_rx.recv() => {
                    self.fetcher.apply(reply);
                }

                Some(settled) = self.settle_rx.recv() => self.handle_settled(settled),
            }
        }

        self.debouncer.cancel();
        info!("Pipeline stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::QueryText(text) => {
                self.query = text.clone();
                self.debouncer.submit(text);
            }
            Command::TriggerAggregation => self.trigger_aggregation(),
            Command::Snapshot(reply) => {
                // Requester may have given up waiting
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn handle_debounced(&mut self, emitted: DebouncedQuery) {
        let Some(text) = self.debouncer.accept(emitted) else {
            return;
        };

        info!(query = %text, "Query settled");
        self.events.emit_lossy(PipelineEvent::query_changed(text.clone()));

        // The batch is about to be replaced: earlier runs no longer apply
        self.aggregator.invalidate();
        self.gate.reset();
        if !self.result_set.is_empty() {
            self.result_set = ResolvedLocationSet::empty();
            self.events.emit_lossy(PipelineEvent::results_cleared());
        }

        if let FetchStart::Issued(request) = self.fetcher.on_query_changed(&text) {
            let tx = self.fetch_tx.clone();
            tokio::spawn(async move {
                let reply = request.run().await;
                let _ = tx.send(reply);
            });
        }
    }

    fn trigger_aggregation(&mut self) {
        if self.fetcher.status() != SearchStatus::Ok {
            debug!(status = %self.fetcher.status(), "No batch to aggregate");
            self.events
                .emit_lossy(PipelineEvent::aggregation_rejected(RejectReason::NoBatch));
            return;
        }

        if !self.gate.try_open() {
            self.events
                .emit_lossy(PipelineEvent::aggregation_rejected(RejectReason::InFlight));
            return;
        }

        let run = self.aggregator.resolve_all(self.fetcher.batch());
        info!(generation = run.generation(), size = run.len(), "Aggregation triggered");

        if run.is_empty() {
            let generation = run.generation();
            self.handle_settled(SettledRun {
                generation,
                set: ResolvedLocationSet::empty(),
                failed: 0,
            });
            return;
        }

        let tx = self.settle_tx.clone();
        tokio::spawn(async move {
            let settled = run.settle().await;
            let _ = tx.send(settled);
        });
    }

    fn handle_settled(&mut self, settled: SettledRun) {
        // Stale runs leave the gate alone: it was reset for the newer batch
        let Some(set) = self.aggregator.accept(settled) else {
            return;
        };

        self.gate.mark_published();
        self.result_set = set.clone();
        self.events.emit_lossy(PipelineEvent::result_set_published(set));
        self.gate.close();
    }

    fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            query: self.query.clone(),
            status: self.fetcher.status(),
            batch: self.fetcher.batch().clone(),
            result_set: self.result_set.clone(),
            aggregation: self.gate.state(),
            fetch_seq: self.fetcher.latest_seq(),
        }
    }
}
