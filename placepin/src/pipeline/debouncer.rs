//! Keystroke debouncing
//!
//! A single cancellable timer task: every `submit` aborts the pending timer
//! and schedules a fresh one carrying the new text.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Query text emitted once its quiet interval elapsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebouncedQuery {
    /// Submission this emission belongs to
    pub seq: u64,
    pub text: String,
}

/// Collapses bursts of `submit` calls into one delayed emission
pub struct QueryDebouncer {
    delay: Duration,
    tx: mpsc::UnboundedSender<DebouncedQuery>,
    seq: u64,
    pending: Option<JoinHandle<()>>,
}

impl QueryDebouncer {
    /// Emissions are delivered on `tx`
    pub fn new(delay: Duration, tx: mpsc::UnboundedSender<DebouncedQuery>) -> Self {
        Self {
            delay,
            tx,
            seq: 0,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record `text` and restart the quiet interval
    ///
    /// Returns the submission sequence number.
    pub fn submit(&mut self, text: impl Into<String>) -> u64 {
        self.cancel();

        self.seq += 1;
        let seq = self.seq;
        let text = text.into();
        let tx = self.tx.clone();
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the pipeline is shutting down
            let _ = tx.send(DebouncedQuery { seq, text });
        }));

        seq
    }

    /// Drop the pending emission, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// True while a timer is armed and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Accept an emission only if it belongs to the latest submission
    ///
    /// An emission can already sit in the channel when a newer `submit`
    /// arrives; that one is rejected here.
    pub fn accept(&mut self, emitted: DebouncedQuery) -> Option<String> {
        if emitted.seq != self.seq {
            debug!(seq = emitted.seq, latest = self.seq, "Dropping superseded debounce emission");
            return None;
        }
        self.pending = None;
        Some(emitted.text)
    }
}

impl Drop for QueryDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
