//! Place and location types carried by pipeline events

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Suggestion fetch status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchStatus {
    /// Query is empty, no suggestions
    Empty,
    /// A suggestion request is outstanding
    Loading,
    /// Latest request succeeded
    Ok,
    /// Latest request failed
    Error,
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchStatus::Empty => "EMPTY",
            SearchStatus::Loading => "LOADING",
            SearchStatus::Ok => "OK",
            SearchStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// One ranked place suggestion from the places-search provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Provider place identifier
    pub id: String,
    /// First place type reported by the provider (e.g. "restaurant")
    pub category: String,
    /// Main line (place name)
    pub primary_text: String,
    /// Secondary line (locality, address)
    pub secondary_text: String,
    /// Full text, used as the geocoding address
    pub description: String,
}

/// Ordered suggestions for one completed query; index is provider rank
///
/// Ids are unique within a batch, including batches read back from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Suggestion>", into = "Vec<Suggestion>")]
pub struct SuggestionBatch(Vec<Suggestion>);

impl SuggestionBatch {
    /// Build a batch from provider-ranked suggestions
    ///
    /// Later suggestions repeating an earlier id are dropped.
    pub fn from_ranked(suggestions: Vec<Suggestion>) -> Self {
        let mut seen = HashSet::with_capacity(suggestions.len());
        let unique = suggestions
            .into_iter()
            .filter(|s| seen.insert(s.id.clone()))
            .collect();
        Self(unique)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Suggestion> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Suggestion] {
        &self.0
    }

    pub fn get(&self, id: &str) -> Option<&Suggestion> {
        self.0.iter().find(|s| s.id == id)
    }
}

impl From<Vec<Suggestion>> for SuggestionBatch {
    fn from(suggestions: Vec<Suggestion>) -> Self {
        Self::from_ranked(suggestions)
    }
}

impl From<SuggestionBatch> for Vec<Suggestion> {
    fn from(batch: SuggestionBatch) -> Self {
        batch.0
    }
}

impl IntoIterator for SuggestionBatch {
    type Item = Suggestion;
    type IntoIter = std::vec::IntoIter<Suggestion>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SuggestionBatch {
    type Item = &'a Suggestion;
    type IntoIter = std::slice::Iter<'a, Suggestion>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Coordinates for one successfully geocoded suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    /// Matches the originating `Suggestion::id`
    pub id: String,
    pub lat: f64,
    pub lng: f64,
}

/// Output of one aggregation run, in batch order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedLocationSet(Vec<ResolvedLocation>);

impl ResolvedLocationSet {
    pub fn new(entries: Vec<ResolvedLocation>) -> Self {
        Self(entries)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedLocation> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ResolvedLocation] {
        &self.0
    }

    /// Ids in set order
    pub fn ids(&self) -> Vec<&str> {
        self.0.iter().map(|l| l.id.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a ResolvedLocationSet {
    type Item = &'a ResolvedLocation;
    type IntoIter = std::slice::Iter<'a, ResolvedLocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
