//! Client library for the Tubeflow control plane.
//!
//! Provides a typed HTTP client for the run, status and log endpoints.

pub mod error;
pub mod http;
pub mod types;

pub use error::ClientError;
pub use http::HttpClient;
pub use types::{RunAccepted, TaskView};
