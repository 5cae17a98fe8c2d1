//! Test Helper Utilities
//!
//! Shared utilities for testing the placepin pipeline

#![allow(dead_code, unused_imports)]

pub mod event_utils;
pub mod log_capture;
pub mod mock_providers;

// Re-export commonly used items
pub use event_utils::{drain, kinds, published_sets, settle, test_settings};
pub use log_capture::{capture_logs, LogCapture};
pub use mock_providers::{suggestion, ScriptedGeocoder, ScriptedPlaces};
