//! Google Places Autocomplete client
//!
//! Issues one autocomplete request per query, scoped by place type and
//! ranked around an origin.

use crate::error::FetchError;
use crate::types::{PlacesSearch, SearchOptions, Suggestion, SuggestionBatch};
use serde::Deserialize;
use std::time::Duration;

const PLACES_AUTOCOMPLETE_URL: &str =
    "https://maps.googleapis.com/maps/api/place/autocomplete/json";
pub(crate) const USER_AGENT: &str = concat!("placepin/", env!("CARGO_PKG_VERSION"));

/// Autocomplete response envelope
#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<Prediction>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    place_id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    structured_formatting: Option<StructuredFormatting>,
}

#[derive(Debug, Deserialize)]
struct StructuredFormatting {
    #[serde(default)]
    main_text: String,
    #[serde(default)]
    secondary_text: Option<String>,
}

impl From<Prediction> for Suggestion {
    fn from(p: Prediction) -> Self {
        let (primary_text, secondary_text) = match p.structured_formatting {
            Some(f) => (f.main_text, f.secondary_text.unwrap_or_default()),
            None => (p.description.clone(), String::new()),
        };

        Suggestion {
            id: p.place_id,
            category: p.types.into_iter().next().unwrap_or_default(),
            primary_text,
            secondary_text,
            description: p.description,
        }
    }
}

/// Map a raw autocomplete body to a batch
///
/// Any status other than `OK` (including `ZERO_RESULTS`) is a fetch failure.
fn parse_autocomplete(body: &str) -> Result<SuggestionBatch, FetchError> {
    let response: AutocompleteResponse =
        serde_json::from_str(body).map_err(|e| FetchError::ParseError(e.to_string()))?;

    if response.status != "OK" {
        return Err(FetchError::ProviderStatus {
            status: response.status,
            message: response.error_message.unwrap_or_default(),
        });
    }

    Ok(SuggestionBatch::from_ranked(
        response.predictions.into_iter().map(Suggestion::from).collect(),
    ))
}

/// Google Places Autocomplete client
pub struct GooglePlacesClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GooglePlacesClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: PLACES_AUTOCOMPLETE_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (proxies, local stubs)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait::async_trait]
impl PlacesSearch for GooglePlacesClient {
    fn name(&self) -> &'static str {
        "google-places"
    }

    async fn search(
        &self,
        text: &str,
        options: &SearchOptions,
    ) -> Result<SuggestionBatch, FetchError> {
        let origin = format!("{},{}", options.origin_bias.lat, options.origin_bias.lng);
        let params = [
            ("input", text),
            ("types", options.category_filter.as_str()),
            ("origin", origin.as_str()),
            ("key", self.api_key.as_str()),
        ];

        tracing::debug!(query = %text, types = %options.category_filter, "Querying Places Autocomplete");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::ApiError(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        let batch = parse_autocomplete(&body)?;
        tracing::debug!(query = %text, count = batch.len(), "Places Autocomplete returned");
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stub_server::{response, serve, truncated_response};

    const OK_BODY: &str = r#"{
        "status": "OK",
        "predictions": [
            {
                "place_id": "ChIJ-british-museum",
                "description": "British Museum, Great Russell Street, London, UK",
                "types": ["museum", "tourist_attraction", "establishment"],
                "structured_formatting": {
                    "main_text": "British Museum",
                    "secondary_text": "Great Russell Street, London, UK"
                }
            },
            {
                "place_id": "ChIJ-london-eye",
                "description": "London Eye, London, UK",
                "types": [],
                "structured_formatting": { "main_text": "London Eye" }
            }
        ]
    }"#;

    #[test]
    fn test_parse_ok_maps_fields_in_rank_order() {
        let batch = parse_autocomplete(OK_BODY).unwrap();
        assert_eq!(batch.len(), 2);

        let first = &batch.as_slice()[0];
        assert_eq!(first.id, "ChIJ-british-museum");
        assert_eq!(first.category, "museum");
        assert_eq!(first.primary_text, "British Museum");
        assert_eq!(first.secondary_text, "Great Russell Street, London, UK");
        assert_eq!(first.description, "British Museum, Great Russell Street, London, UK");

        let second = &batch.as_slice()[1];
        assert_eq!(second.category, "");
        assert_eq!(second.secondary_text, "");
    }

    #[test]
    fn test_parse_zero_results_is_error() {
        let body = r#"{"status": "ZERO_RESULTS", "predictions": []}"#;
        match parse_autocomplete(body) {
            Err(FetchError::ProviderStatus { status, .. }) => assert_eq!(status, "ZERO_RESULTS"),
            other => panic!("expected provider status error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_denied_carries_message() {
        let body = r#"{"status": "REQUEST_DENIED", "error_message": "The provided API key is invalid."}"#;
        let err = parse_autocomplete(body).unwrap_err();
        assert!(err.to_string().contains("API key is invalid"));
    }

    #[test]
    fn test_parse_garbage_is_parse_error() {
        assert!(matches!(parse_autocomplete("<html>"), Err(FetchError::ParseError(_))));
    }

    #[test]
    fn test_prediction_without_formatting_falls_back_to_description() {
        let body = r#"{"status":"OK","predictions":[{"place_id":"p1","description":"Somewhere"}]}"#;
        let batch = parse_autocomplete(body).unwrap();
        assert_eq!(batch.as_slice()[0].primary_text, "Somewhere");
    }

    #[test]
    fn test_client_creation() {
        let client = GooglePlacesClient::new("key".to_string(), Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://127.0.0.1:9/autocomplete");
        assert_eq!(client.base_url, "http://127.0.0.1:9/autocomplete");
        assert_eq!(client.name(), "google-places");
    }

    fn stub_client(base_url: String) -> GooglePlacesClient {
        GooglePlacesClient::new("key".to_string(), Duration::from_secs(5))
            .unwrap()
            .with_base_url(base_url)
    }

    #[tokio::test]
    async fn test_search_sends_scoping_params() {
        let (base_url, server) = serve(vec![response("200 OK", OK_BODY)]).await;

        let batch = stub_client(base_url)
            .search("British", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(batch.len(), 2);

        let request_lines = server.await.unwrap();
        let line = &request_lines[0];
        assert!(line.contains("input=British"), "{}", line);
        assert!(line.contains("types=establishment"), "{}", line);
        assert!(line.contains("origin=51.51753%2C-0.11213"), "{}", line);
        assert!(line.contains("key=key"), "{}", line);
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let (base_url, _server) = serve(vec![response("403 Forbidden", "denied")]).await;

        let result = stub_client(base_url)
            .search("London", &SearchOptions::default())
            .await;
        match result {
            Err(FetchError::ApiError(code, text)) => {
                assert_eq!(code, 403);
                assert_eq!(text, "denied");
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_truncated_body_is_network_error() {
        let (base_url, _server) = serve(vec![truncated_response(r#"{"status":"OK","pred"#)]).await;

        let result = stub_client(base_url)
            .search("London", &SearchOptions::default())
            .await;
        assert!(matches!(result, Err(FetchError::NetworkError(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = stub_client(format!("http://{}/json", addr))
            .search("London", &SearchOptions::default())
            .await;
        assert!(matches!(result, Err(FetchError::NetworkError(_))), "{:?}", result);
    }
}
