//! Prometheus metrics collection and formatting.
//!
//! This module provides metrics in Prometheus text exposition format.

use std::fmt::Write;
use std::sync::Arc;

use crate::state::AppState;

/// Collect all metrics from AppState and format as Prometheus text.
pub async fn collect_metrics(state: &Arc<AppState>) -> String {
    let mut output = String::new();

    collect_task_metrics(state, &mut output).await;
    collect_run_metrics(state, &mut output);
    collect_log_metrics(state, &mut output).await;

    output
}

/// Collect task counts by status.
async fn collect_task_metrics(state: &Arc<AppState>, output: &mut String) {
    let counts = state.registry.count_by_status().await;

    writeln!(output, "# HELP tubeflow_tasks Number of tasks by status").ok();
    writeln!(output, "# TYPE tubeflow_tasks gauge").ok();
    for (status, count) in counts {
        writeln!(output, "tubeflow_tasks{{status=\"{}\"}} {count}", status.as_str()).ok();
    }
}

/// Collect run counters by outcome.
fn collect_run_metrics(state: &Arc<AppState>, output: &mut String) {
    let stats = state.runner.stats();

    writeln!(output).ok();
    writeln!(output, "# HELP tubeflow_runs_total Task runs by outcome").ok();
    writeln!(output, "# TYPE tubeflow_runs_total counter").ok();
    writeln!(output, "tubeflow_runs_total{{outcome=\"started\"}} {}", stats.started).ok();
    writeln!(output, "tubeflow_runs_total{{outcome=\"completed\"}} {}", stats.completed).ok();
    writeln!(output, "tubeflow_runs_total{{outcome=\"failed\"}} {}", stats.failed).ok();
}

/// Collect activity log size.
async fn collect_log_metrics(state: &Arc<AppState>, output: &mut String) {
    let appended = state.log.appended_total().await;
    let retained = state.log.len().await;

    writeln!(output).ok();
    writeln!(
        output,
        "# HELP tubeflow_log_entries_total Activity log entries appended"
    )
    .ok();
    writeln!(output, "# TYPE tubeflow_log_entries_total counter").ok();
    writeln!(output, "tubeflow_log_entries_total {appended}").ok();
    writeln!(
        output,
        "# HELP tubeflow_log_entries_retained Activity log entries currently retained"
    )
    .ok();
    writeln!(output, "# TYPE tubeflow_log_entries_retained gauge").ok();
    writeln!(output, "tubeflow_log_entries_retained {retained}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::executor::SimulatedExecutor;

    #[tokio::test]
    async fn test_collect_metrics_fresh_state() {
        let state = AppState::new(&Config::default(), Arc::new(SimulatedExecutor::default())).unwrap();
        let output = collect_metrics(&state).await;

        assert!(output.contains("tubeflow_tasks{status=\"idle\"} 5"));
        assert!(output.contains("tubeflow_tasks{status=\"running\"} 0"));
        assert!(output.contains("tubeflow_runs_total{outcome=\"started\"} 0"));
        assert!(output.contains("tubeflow_log_entries_total 0"));
    }
}
