//! HTML dashboard.

use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse};

use tubeflow_core::{project, LogLevel};

use crate::state::AppState;

/// Number of log lines shown on the dashboard.
const DASHBOARD_LOG_LINES: usize = 100;

/// Task cards and the activity log as an HTML page.
///
/// GET /ui
pub async fn dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tasks = state.registry.list().await;
    let selected = state.runner.selected().await;
    let entries = state.log.snapshot().await;

    let mut rows = String::new();
    for task in &tasks {
        let view = project(task.status);
        let highlight = if selected.as_ref() == Some(&task.id) {
            " class=\"selected\""
        } else {
            ""
        };
        let last_run = task
            .last_run
            .as_ref()
            .map(|r| r.started_at.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());

        rows.push_str(&format!(
            r#"<tr{}>
                <td><code>{}</code></td>
                <td><strong>{}</strong><br><small>{}</small></td>
                <td>{}</td>
                <td><span style="color: {}; font-weight: bold;">{}</span></td>
                <td>{}</td>
            </tr>"#,
            highlight,
            escape_html(task.id.as_str()),
            escape_html(&task.name),
            escape_html(&task.description),
            task.kind.icon(),
            view.color,
            view.label,
            last_run
        ));
    }

    let skip = entries.len().saturating_sub(DASHBOARD_LOG_LINES);
    let mut log_lines = String::new();
    for entry in entries.iter().skip(skip) {
        let class = match entry.level {
            LogLevel::Info => "info",
            LogLevel::Error => "error",
        };
        log_lines.push_str(&format!(
            "<div class=\"{}\">{}</div>\n",
            class,
            escape_html(&entry.display_line())
        ));
    }
    if log_lines.is_empty() {
        log_lines = r#"<div class="empty">No activity yet</div>"#.to_string();
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Tubeflow</title>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; background: #f5f5f5; }}
        h1, h2 {{ color: #333; }}
        table {{ border-collapse: collapse; width: 100%; background: white; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }}
        th, td {{ padding: 12px; text-align: left; border-bottom: 1px solid #eee; }}
        th {{ background: #f8f9fa; font-weight: 600; color: #555; }}
        tr.selected {{ background: #f3e8ff; }}
        small {{ color: #888; }}
        .log {{ background: #111; color: #4ade80; font-family: monospace; font-size: 13px; padding: 12px; max-height: 320px; overflow-y: auto; }}
        .log .error {{ color: #f87171; }}
        .log .empty {{ color: #888; }}
        .refresh {{ color: #0066cc; text-decoration: none; margin-left: 20px; }}
        .refresh:hover {{ text-decoration: underline; }}
    </style>
</head>
<body>
    <h1>Tubeflow Automation <a href="/ui" class="refresh">↻ Refresh</a></h1>
    <table>
        <thead>
            <tr>
                <th>ID</th>
                <th>Task</th>
                <th>Icon</th>
                <th>Status</th>
                <th>Last Run</th>
            </tr>
        </thead>
        <tbody>
            {}
        </tbody>
    </table>
    <h2>Activity Log</h2>
    <div class="log">
{}
    </div>
    <p style="margin-top:20px;color:#888;font-size:12px;">
        JSON API: <a href="/v1/tasks">/v1/tasks</a> |
        Log: <a href="/v1/logs">/v1/logs</a> |
        Metrics: <a href="/metrics">/metrics</a>
    </p>
</body>
</html>"#,
        rows, log_lines
    );

    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
}

/// Escape text for inclusion in HTML.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">&'"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }
}
