//! Presentation boundary
//!
//! A [`ResultPresenter`] turns pipeline events into something a user sees.
//! The pipeline never calls presenters directly; [`run_presenter`] drains an
//! event subscription into one.

use crate::types::{ResolvedLocationSet, SearchStatus, SuggestionBatch};
use placepin_common::events::{PipelineEvent, RejectReason};
use std::io::{self, Write};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Sink for pipeline output
pub trait ResultPresenter {
    fn on_status(&mut self, status: SearchStatus) -> io::Result<()>;

    fn on_batch(&mut self, batch: &SuggestionBatch) -> io::Result<()>;

    fn on_result_set(&mut self, set: &ResolvedLocationSet) -> io::Result<()>;

    /// Transient user notification (toast)
    fn on_notification(&mut self, message: &str) -> io::Result<()>;

    /// Dispatch one event to the matching callback
    fn present(&mut self, event: &PipelineEvent) -> io::Result<()> {
        match event {
            PipelineEvent::StatusChanged { status, .. } => self.on_status(*status),
            PipelineEvent::BatchChanged { batch, .. } => self.on_batch(batch),
            PipelineEvent::ResultSetPublished { set, .. } => self.on_result_set(set),
            PipelineEvent::ResultsCleared { .. } => {
                self.on_result_set(&ResolvedLocationSet::empty())
            }
            PipelineEvent::SuggestionsFound { query, count, .. } => {
                self.on_notification(&found_message(*count, query))
            }
            PipelineEvent::AggregationRejected { reason, .. } => {
                self.on_notification(rejected_message(*reason))
            }
            PipelineEvent::QueryChanged { .. } => Ok(()),
        }
    }
}

pub fn found_message(count: usize, query: &str) -> String {
    format!("{} results found for query: {}", count, query)
}

fn rejected_message(reason: RejectReason) -> &'static str {
    match reason {
        RejectReason::InFlight => "Markers are already loading",
        RejectReason::NoBatch => "No suggestions to show on the map",
    }
}

/// Line-oriented presenter for terminals and tests
///
/// Remembers the last batch so markers can be labelled with place names.
pub struct ConsolePresenter<W: Write> {
    out: W,
    batch: SuggestionBatch,
}

impl ConsolePresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            batch: SuggestionBatch::empty(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultPresenter for ConsolePresenter<W> {
    fn on_status(&mut self, status: SearchStatus) -> io::Result<()> {
        match status {
            SearchStatus::Loading => writeln!(self.out, "searching..."),
            SearchStatus::Error => writeln!(self.out, "search failed"),
            SearchStatus::Empty | SearchStatus::Ok => Ok(()),
        }
    }

    fn on_batch(&mut self, batch: &SuggestionBatch) -> io::Result<()> {
        self.batch = batch.clone();
        for (rank, s) in batch.iter().enumerate() {
            writeln!(
                self.out,
                "{:>2}. {} | {} / {}",
                rank + 1,
                s.category,
                s.primary_text,
                s.secondary_text
            )?;
        }
        self.out.flush()
    }

    fn on_result_set(&mut self, set: &ResolvedLocationSet) -> io::Result<()> {
        if set.is_empty() {
            return writeln!(self.out, "markers cleared");
        }
        for location in set {
            let label = self
                .batch
                .get(&location.id)
                .map(|s| s.primary_text.as_str())
                .unwrap_or(location.id.as_str());
            writeln!(
                self.out,
                "marker {} @ {:.5},{:.5}",
                label, location.lat, location.lng
            )?;
        }
        self.out.flush()
    }

    fn on_notification(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, ">> {}", message)?;
        self.out.flush()
    }
}

/// Forward events to `presenter` until the bus closes
pub async fn run_presenter<P: ResultPresenter>(
    mut rx: broadcast::Receiver<PipelineEvent>,
    mut presenter: P,
) -> P {
    loop {
        match rx.recv().await {
            Ok(event) => {
                debug!(kind = event.kind(), "Presenting event");
                if let Err(e) = presenter.present(&event) {
                    warn!(error = %e, "Presenter write failed");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Presenter lagging, events dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
    presenter
}
