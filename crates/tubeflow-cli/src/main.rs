//! Tubeflow CLI - Command line interface for the Tubeflow control plane.

use std::time::Duration;

use clap::{Parser, Subcommand};

use tubeflow_client::{HttpClient, TaskView};
use tubeflow_core::{project, LogEntry, LogLevel, RunParams, TaskStatus};

/// Tubeflow CLI - automation task control
#[derive(Parser, Debug)]
#[command(name = "tubeflow")]
#[command(about = "CLI for the Tubeflow control plane", long_about = None)]
struct Cli {
    /// Control plane address
    #[arg(short, long, default_value = "http://[::1]:8080")]
    addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all tasks
    List,

    /// Get task status
    Get {
        /// Task ID
        id: String,
    },

    /// Run a task
    Run {
        /// Task ID
        id: String,

        /// Video URL passed to the task
        #[arg(short, long)]
        url: Option<String>,

        /// Wait until the run settles
        #[arg(short, long)]
        wait: bool,
    },

    /// Cancel the running task
    Cancel {
        /// Task ID
        id: String,
    },

    /// Show the activity log
    Logs {
        /// Keep polling for new entries
        #[arg(short, long)]
        follow: bool,

        /// Only show entries after this sequence number
        #[arg(long)]
        since: Option<u64>,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = HttpClient::new(&cli.addr);

    match cli.command {
        Commands::List => {
            list_tasks(&client).await?;
        }
        Commands::Get { id } => {
            let task = client.get_task(&id).await?;
            print_task(&task);
        }
        Commands::Run { id, url, wait } => {
            run_task(&client, id, url, wait).await?;
        }
        Commands::Cancel { id } => {
            client.cancel_task(&id).await?;
            println!("Cancellation requested for {}", id);
        }
        Commands::Logs {
            follow,
            since,
            interval_ms,
        } => {
            show_logs(&client, follow, since, Duration::from_millis(interval_ms)).await?;
        }
    }

    Ok(())
}

async fn list_tasks(client: &HttpClient) -> Result<(), Box<dyn std::error::Error>> {
    let tasks = client.list_tasks().await?;
    let selected = client.selection().await?;

    println!("Tasks ({}):", tasks.len());
    println!("  {:<12}  {:<10}  {:<24}  {}", "ID", "STATUS", "NAME", "LAST RUN");
    println!("{}", "-".repeat(72));

    for task in tasks {
        let marker = if selected.as_deref() == Some(task.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<12}  {:<10}  {:<24}  {}",
            marker,
            task.id,
            project(task.status).label,
            task.name,
            format_last_run(&task)
        );
    }

    Ok(())
}

async fn run_task(
    client: &HttpClient,
    id: String,
    url: Option<String>,
    wait: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let params = RunParams { url };
    let accepted = client.run_task(&id, params).await?;
    println!("Run started:");
    println!("  Task:   {}", accepted.task_id);
    println!("  Run:    {}", accepted.run_id);

    if !wait {
        return Ok(());
    }

    loop {
        let task = client.get_task(&id).await?;
        if task.status.is_settled() {
            print_task(&task);
            if task.status == TaskStatus::Error {
                return Err(format!("task {} failed", id).into());
            }
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

async fn show_logs(
    client: &HttpClient,
    follow: bool,
    since: Option<u64>,
    interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cursor = since;
    loop {
        let entries = client.logs(cursor).await?;
        for entry in &entries {
            println!("{}", format_entry(entry));
        }
        if let Some(last) = entries.last() {
            cursor = Some(last.sequence);
        }

        if !follow {
            return Ok(());
        }
        tokio::time::sleep(interval).await;
    }
}

fn print_task(task: &TaskView) {
    println!("  ID:          {}", task.id);
    println!("  Name:        {}", task.name);
    println!("  Description: {}", task.description);
    println!("  Status:      {}", project(task.status).label);
    println!("  Last run:    {}", format_last_run(task));
}

fn format_last_run(task: &TaskView) -> String {
    match &task.last_run {
        Some(run) => {
            let started = run.started_at.format("%Y-%m-%d %H:%M:%S");
            match run.finished_at {
                Some(finished) => {
                    let secs = (finished - run.started_at).num_milliseconds() as f64 / 1000.0;
                    format!("{} ({:.1}s)", started, secs)
                }
                None => format!("{} (in progress)", started),
            }
        }
        None => "never".to_string(),
    }
}

fn format_entry(entry: &LogEntry) -> String {
    let marker = match entry.level {
        LogLevel::Info => ' ',
        LogLevel::Error => '!',
    };
    format!("{:>6}{} {}", entry.sequence, marker, entry.display_line())
}
