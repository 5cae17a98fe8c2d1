//! # placepin Common Library
//!
//! Shared code for the placepin workspace including:
//! - Place and location types exchanged with the providers
//! - Pipeline event types (PipelineEvent enum) and the EventBus
//! - Configuration loading

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
