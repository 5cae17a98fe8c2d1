//! Scripted providers
//!
//! Each query/address is scripted with a delay and a response. Delays are
//! driven by tokio time, so tests run under `start_paused = true` finish
//! instantly while preserving completion order.

use async_trait::async_trait;
use placepin::types::{
    Geocoder, LatLng, PlacesSearch, SearchOptions, Suggestion, SuggestionBatch,
};
use placepin::{FetchError, GeocodeError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Suggestion whose description (the geocoding address) equals its id
pub fn suggestion(id: &str) -> Suggestion {
    Suggestion {
        id: id.to_string(),
        category: "establishment".to_string(),
        primary_text: format!("{} place", id),
        secondary_text: "London, UK".to_string(),
        description: id.to_string(),
    }
}

struct PlacesScript {
    delay: Duration,
    response: Result<SuggestionBatch, FetchError>,
}

/// Places provider answering from a per-query script
///
/// Unscripted queries answer with a `ZERO_RESULTS` provider status.
#[derive(Default)]
pub struct ScriptedPlaces {
    scripts: HashMap<String, PlacesScript>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedPlaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` after `delay_ms` with suggestions for `ids`
    pub fn respond(mut self, query: &str, delay_ms: u64, ids: &[&str]) -> Self {
        let batch = SuggestionBatch::from_ranked(ids.iter().map(|id| suggestion(id)).collect());
        self.scripts.insert(
            query.to_string(),
            PlacesScript {
                delay: Duration::from_millis(delay_ms),
                response: Ok(batch),
            },
        );
        self
    }

    /// Fail `query` after `delay_ms`
    pub fn fail(mut self, query: &str, delay_ms: u64, error: FetchError) -> Self {
        self.scripts.insert(
            query.to_string(),
            PlacesScript {
                delay: Duration::from_millis(delay_ms),
                response: Err(error),
            },
        );
        self
    }

    /// Queries searched so far, in call order
    pub fn queries(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(query, _)| query.clone())
            .collect()
    }

    /// Category filters received so far
    pub fn categories(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, category)| category.clone())
            .collect()
    }
}

#[async_trait]
impl PlacesSearch for ScriptedPlaces {
    fn name(&self) -> &'static str {
        "scripted-places"
    }

    async fn search(
        &self,
        text: &str,
        options: &SearchOptions,
    ) -> Result<SuggestionBatch, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), options.category_filter.clone()));

        match self.scripts.get(text) {
            Some(script) => {
                tokio::time::sleep(script.delay).await;
                script.response.clone()
            }
            None => Err(FetchError::ProviderStatus {
                status: "ZERO_RESULTS".to_string(),
                message: String::new(),
            }),
        }
    }
}

/// Geocoder answering from a per-address script
///
/// Unscripted addresses fail with `NoResults`.
#[derive(Default)]
pub struct ScriptedGeocoder {
    scripts: HashMap<String, (Duration, LatLng)>,
    calls: AtomicUsize,
}

impl ScriptedGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `address` to `(lat, lng)` after `delay_ms`
    pub fn resolve(mut self, address: &str, delay_ms: u64, lat: f64, lng: f64) -> Self {
        self.scripts.insert(
            address.to_string(),
            (Duration::from_millis(delay_ms), LatLng::new(lat, lng)),
        );
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for ScriptedGeocoder {
    fn name(&self) -> &'static str {
        "scripted-geocoder"
    }

    async fn geocode(&self, address: &str) -> Result<LatLng, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.scripts.get(address) {
            Some((delay, location)) => {
                tokio::time::sleep(*delay).await;
                Ok(*location)
            }
            None => Err(GeocodeError::NoResults(address.to_string())),
        }
    }
}
