//! Google Geocoding client
//!
//! Resolves an address to the location of its first geocoding result.

use super::places_client::USER_AGENT;
use crate::error::GeocodeError;
use crate::types::{Geocoder, LatLng};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::Quota;
use serde::Deserialize;
use std::time::Duration;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

type DirectRateLimiter = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

fn parse_geocode(address: &str, body: &str) -> Result<LatLng, GeocodeError> {
    let response: GeocodeResponse =
        serde_json::from_str(body).map_err(|e| GeocodeError::ParseError(e.to_string()))?;

    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Err(GeocodeError::NoResults(address.to_string())),
        _ => {
            return Err(GeocodeError::ProviderStatus {
                status: response.status,
                message: response.error_message.unwrap_or_default(),
            })
        }
    }

    response
        .results
        .into_iter()
        .next()
        .map(|r| LatLng::new(r.geometry.location.lat, r.geometry.location.lng))
        .ok_or_else(|| GeocodeError::NoResults(address.to_string()))
}

/// Google Geocoding API client
pub struct GoogleGeocodeClient {
    http_client: reqwest::Client,
    /// `None` when requests are not spaced
    rate_limiter: Option<DirectRateLimiter>,
    api_key: String,
    base_url: String,
}

impl GoogleGeocodeClient {
    /// Requests are released at most one per `min_interval`; zero disables spacing
    pub fn new(
        api_key: String,
        timeout: Duration,
        min_interval: Duration,
    ) -> Result<Self, GeocodeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GeocodeError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Quota::with_period(min_interval).map(governor::RateLimiter::direct),
            api_key,
            base_url: GEOCODE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait::async_trait]
impl Geocoder for GoogleGeocodeClient {
    fn name(&self) -> &'static str {
        "google-geocode"
    }

    async fn geocode(&self, address: &str) -> Result<LatLng, GeocodeError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        tracing::debug!(address = %address, "Querying Geocoding API");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GeocodeError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeocodeError::ApiError(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodeError::NetworkError(e.to_string()))?;

        parse_geocode(address, &body)
    }
}
