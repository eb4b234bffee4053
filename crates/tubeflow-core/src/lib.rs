//! Tubeflow Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Async runtime
//! - Persistence
//!
//! All types here represent the core business domain of Tubeflow: automation
//! tasks, their status machine, and the activity log they write to.

pub mod error;
pub mod ids;
pub mod log;
pub mod run;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::{RunId, TaskId};
pub use log::{LogEntry, LogLevel};
pub use run::{RunParams, RunRequest, TaskResult, NO_URL_PROVIDED};
pub use status::{project, StatusView, TaskStatus};
pub use task::{catalog, RunSummary, Task, TaskKind};
