//! Core types and provider traits
//!
//! The pipeline talks to its two external providers only through
//! [`PlacesSearch`] and [`Geocoder`]; HTTP implementations live in
//! [`crate::services`], scripted ones in the integration test helpers.

use crate::error::{FetchError, GeocodeError};
use placepin_common::config::SearchConfig;

pub use placepin_common::events::{
    LatLng, ResolvedLocation, ResolvedLocationSet, SearchStatus, Suggestion, SuggestionBatch,
};

// ============================================================================
// Search Options
// ============================================================================

/// Fixed scoping applied to every suggestion request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Place type filter (e.g. "establishment")
    pub category_filter: String,
    /// Origin the provider ranks results around
    pub origin_bias: LatLng,
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            category_filter: config.category.clone(),
            origin_bias: LatLng::new(config.origin.lat, config.origin.lng),
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

// ============================================================================
// Provider Traits
// ============================================================================

/// Places-search provider
///
/// One round trip per call. Returns suggestions in provider rank order.
///
/// # Example
/// ```rust,ignore
/// struct FixedPlaces;
///
/// #[async_trait::async_trait]
/// impl PlacesSearch for FixedPlaces {
///     fn name(&self) -> &'static str { "fixed" }
///
///     async fn search(&self, text: &str, options: &SearchOptions) -> Result<SuggestionBatch, FetchError> {
///         Ok(SuggestionBatch::empty())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait PlacesSearch: Send + Sync {
    /// Provider name for log fields
    fn name(&self) -> &'static str;

    async fn search(
        &self,
        text: &str,
        options: &SearchOptions,
    ) -> Result<SuggestionBatch, FetchError>;
}

/// Geocoding provider
///
/// Resolves a free-text address to the coordinates of its best match.
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    fn name(&self) -> &'static str;

    async fn geocode(&self, address: &str) -> Result<LatLng, GeocodeError>;
}
