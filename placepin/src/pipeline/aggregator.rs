//! Batch geocoding
//!
//! All suggestions in a batch are geocoded concurrently and joined behind a
//! single barrier, so a result set is only ever seen complete. Output order
//! is batch order regardless of which request finished first. Failed
//! suggestions are logged and left out (per-suggestion error isolation).
//!
//! Each run is stamped with a generation. Starting a run or invalidating the
//! aggregator bumps the generation; a run that settles under an older
//! generation is discarded.

use crate::types::{Geocoder, ResolvedLocation, ResolvedLocationSet, SuggestionBatch};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Geocode every suggestion concurrently and keep the successes in order
///
/// Returns the set and the number of failed suggestions.
pub async fn resolve_batch(
    geocoder: Arc<dyn Geocoder>,
    batch: SuggestionBatch,
) -> (ResolvedLocationSet, usize) {
    let futures: Vec<_> = batch
        .into_iter()
        .map(|suggestion| {
            let geocoder = Arc::clone(&geocoder);
            async move {
                match geocoder.geocode(&suggestion.description).await {
                    Ok(location) => {
                        debug!(id = %suggestion.id, lat = location.lat, lng = location.lng, "Geocoded suggestion");
                        Some(ResolvedLocation {
                            id: suggestion.id,
                            lat: location.lat,
                            lng: location.lng,
                        })
                    }
                    Err(e) => {
                        warn!(
                            id = %suggestion.id,
                            address = %suggestion.description,
                            geocoder = geocoder.name(),
                            error = %e,
                            "Geocoding failed, omitting suggestion"
                        );
                        None
                    }
                }
            }
        })
        .collect();

    // join_all yields outputs in input order
    let outcomes = join_all(futures).await;
    let failed = outcomes.iter().filter(|o| o.is_none()).count();
    let entries = outcomes.into_iter().flatten().collect();

    (ResolvedLocationSet::new(entries), failed)
}

/// A started aggregation run, not yet settled
pub struct AggregationRun {
    generation: u64,
    geocoder: Arc<dyn Geocoder>,
    batch: SuggestionBatch,
}

impl AggregationRun {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Wait for every geocode request in the run to settle
    pub async fn settle(self) -> SettledRun {
        let (set, failed) = resolve_batch(self.geocoder, self.batch).await;
        SettledRun {
            generation: self.generation,
            set,
            failed,
        }
    }
}

/// Output of a run, before the staleness check
#[derive(Debug, Clone)]
pub struct SettledRun {
    pub generation: u64,
    pub set: ResolvedLocationSet,
    pub failed: usize,
}

/// Starts aggregation runs and decides which settled runs may be published
pub struct GeocodeAggregator {
    geocoder: Arc<dyn Geocoder>,
    generation: u64,
}

impl GeocodeAggregator {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            geocoder,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start resolving `batch`; supersedes any earlier run
    pub fn resolve_all(&mut self, batch: &SuggestionBatch) -> AggregationRun {
        self.generation += 1;
        debug!(generation = self.generation, size = batch.len(), "Starting aggregation run");
        AggregationRun {
            generation: self.generation,
            geocoder: Arc::clone(&self.geocoder),
            batch: batch.clone(),
        }
    }

    /// Make every outstanding run stale
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Return the set if the run is still current, otherwise discard it
    pub fn accept(&self, settled: SettledRun) -> Option<ResolvedLocationSet> {
        if !self.is_current(settled.generation) {
            debug!(
                generation = settled.generation,
                current = self.generation,
                "Discarding stale aggregation run"
            );
            return None;
        }

        info!(
            generation = settled.generation,
            resolved = settled.set.len(),
            failed = settled.failed,
            "Aggregation run settled"
        );
        Some(settled.set)
    }
}
