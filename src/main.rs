//! schedule-ingest CLI
//!
//! Usage:
//!   schedule-ingest --tasks tasks.json [--artifacts-dir DIR] [--dry-run]
//!                   [--run-id ID] [--database ingest.db]
//!
//! Prints the run report as JSON on stdout. Logs go to stderr.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use schedule_ingest::{Config, Crawler, Database, Result, RunId, tasks_from_json};

#[derive(Parser, Debug)]
#[command(name = "schedule-ingest")]
#[command(about = "Fetch schedule artifacts and store them with manifests")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Artifacts root directory
    #[arg(long, env = "ARTIFACTS_DIR", default_value = "parsing/artifacts")]
    artifacts_dir: PathBuf,

    /// Run every task without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Run identifier (defaults to the start timestamp)
    #[arg(long)]
    run_id: Option<String>,

    /// JSON file with task descriptors
    #[arg(long)]
    tasks: PathBuf,

    /// SQLite database to publish the run into
    #[arg(long, env = "DATABASE_PATH")]
    database: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Tasks allowed to run at the same time
    #[arg(long, default_value = "1")]
    concurrency: usize,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::new(&self.artifacts_dir);
        config.dry_run = self.dry_run;
        config.fetch.timeout = Duration::from_secs(self.timeout);
        config.crawl.max_concurrent_tasks = self.concurrency;
        config.persistence.database_path = self.database.clone();
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("schedule_ingest=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();

    let json = tokio::fs::read_to_string(&cli.tasks).await?;
    let tasks = tasks_from_json(&json)?;

    tracing::info!(
        artifacts_dir = %config.artifacts_dir.display(),
        dry_run = config.dry_run,
        tasks = tasks.len(),
        "Starting crawl"
    );

    let crawler = Crawler::from_config(&config, tasks)?;
    let report = crawler.run(cli.run_id.map(RunId::new)).await;

    if let Some(path) = &config.persistence.database_path {
        if report.dry_run {
            tracing::info!("Dry run, skipping database publish");
        } else {
            let db = Database::new(path).await?;
            let summary = db.publish_report(&report).await;
            db.close().await;
            if let Err(e) = summary {
                tracing::error!(error = %e, "Failed to publish run");
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
