use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use task_client::import::parse_tasks_csv;
use task_client::TaskClient;

#[derive(Parser)]
#[command(name = "task-import")]
#[command(about = "Bulk-create tasks from a CSV file", long_about = None)]
struct Cli {
    /// Base URL of the task service
    #[arg(short, long, default_value = "http://localhost:3333")]
    url: String,

    /// CSV file with a `title,description` header
    #[arg(default_value = "tasks.csv")]
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "task_import=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let text = std::fs::read_to_string(&cli.file)?;
    let tasks = parse_tasks_csv(&text)?;
    let client = TaskClient::new(&cli.url);

    tracing::info!(file = %cli.file.display(), rows = tasks.len(), "Importing tasks");

    let mut created = 0usize;
    let mut failed = 0usize;
    for task in &tasks {
        match client.create_task(task).await {
            Ok(created_task) => {
                created += 1;
                println!("created {} {}", created_task.id, created_task.title);
            }
            Err(e) => {
                failed += 1;
                eprintln!("failed {:?}: {}", task.title, e);
            }
        }
    }

    println!("{created} created, {failed} failed");

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
