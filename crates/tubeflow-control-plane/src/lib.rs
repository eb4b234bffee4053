//! Tubeflow Control Plane Library
//!
//! This crate provides the task orchestration engine of Tubeflow (registry,
//! activity log, runner, executor seam) and the HTTP surface over it.

pub mod config;
pub mod executor;
pub mod http;
pub mod log_stream;
pub mod metrics;
pub mod registry;
pub mod runner;
pub mod state;

pub use config::Config;
pub use executor::{SimulatedExecutor, TaskExecutor};
pub use log_stream::LogStream;
pub use registry::{StatusChange, TaskRegistry};
pub use runner::{RunHandle, RunOutcome, TaskRunner};
pub use state::AppState;
