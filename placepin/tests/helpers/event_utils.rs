//! Event and timing utilities

use placepin::types::{ResolvedLocationSet, SearchOptions};
use placepin::PipelineSettings;
use placepin_common::events::PipelineEvent;
use std::time::Duration;
use tokio::sync::broadcast;

/// Debounce used by the pipeline tests
pub const TEST_DEBOUNCE: Duration = Duration::from_millis(200);

pub fn test_settings() -> PipelineSettings {
    PipelineSettings {
        debounce: TEST_DEBOUNCE,
        search: SearchOptions::default(),
        command_capacity: 16,
    }
}

/// Let every pending timer and provider call run to completion
///
/// Only meaningful under paused time, where the sleep auto-advances.
pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(60)).await;
}

/// Everything received so far, without waiting
pub fn drain(rx: &mut broadcast::Receiver<PipelineEvent>) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn kinds(events: &[PipelineEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.kind()).collect()
}

pub fn published_sets(events: &[PipelineEvent]) -> Vec<ResolvedLocationSet> {
    events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::ResultSetPublished { set, .. } => Some(set.clone()),
            _ => None,
        })
        .collect()
}
