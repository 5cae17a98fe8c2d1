//! HTTP provider clients
//!
//! - **places_client** - place suggestions for a text query
//! - **geocode_client** - address → coordinates, rate limited

pub mod geocode_client;
pub mod places_client;

#[cfg(test)]
mod stub_server;

pub use geocode_client::GoogleGeocodeClient;
pub use places_client::GooglePlacesClient;
