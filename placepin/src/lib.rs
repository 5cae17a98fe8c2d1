//! placepin library interface
//!
//! Turns typed location queries into ranked place suggestions and resolves a
//! suggestion batch into map coordinates. The binary and the integration
//! tests drive everything through [`pipeline::Pipeline`].

pub mod error;
pub mod pipeline;
pub mod presenter;
pub mod services;
pub mod types;

pub use crate::error::{FetchError, GeocodeError, PipelineError};
pub use crate::pipeline::{Pipeline, PipelineHandle, PipelineSettings, PipelineSnapshot};
