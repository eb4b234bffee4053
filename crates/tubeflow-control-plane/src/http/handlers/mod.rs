//! HTTP request handlers.

mod dashboard;
mod health;
mod logs;
mod runs;
mod tasks;

pub use dashboard::dashboard;
pub use health::{health_check, metrics_handler};
pub use logs::{get_selection, list_logs, stream_logs};
pub use runs::{cancel_run, create_run};
pub use tasks::{get_task, list_tasks, stream_status};
