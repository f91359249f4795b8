//! Run orchestration
//!
//! A run walks the task list in order. Each task's producer is invoked, its
//! data is expanded into payloads, and every payload is fetched (if remote)
//! and handed to the [`ArtifactStore`]. Failures are captured per payload and
//! per task; nothing a task does can abort the run.

use chrono::Utc;
use futures::StreamExt;
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::store::{ArtifactStore, Payload};
use crate::tasks::{CrawlTask, PayloadSource};
use crate::types::{ArtifactOutcome, FileFailure, RunId, RunReport, TaskOutcome, TaskSource};

/// Executes a batch of tasks against an artifact store
pub struct Crawler {
    store: Arc<ArtifactStore>,
    fetcher: Arc<dyn Fetcher>,
    tasks: Vec<CrawlTask>,
    max_concurrent_tasks: usize,
}

impl Crawler {
    /// Create a crawler running `tasks` one after another
    pub fn new(store: ArtifactStore, fetcher: Arc<dyn Fetcher>, tasks: Vec<CrawlTask>) -> Self {
        Self {
            store: Arc::new(store),
            fetcher,
            tasks,
            max_concurrent_tasks: 1,
        }
    }

    /// Create a crawler with an on-disk store and an HTTP fetcher
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot be built
    pub fn from_config(config: &Config, tasks: Vec<CrawlTask>) -> Result<Self> {
        config.validate()?;
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Ok(Self::new(ArtifactStore::from_config(config), Arc::new(fetcher), tasks)
            .with_max_concurrent_tasks(config.crawl.max_concurrent_tasks))
    }

    /// Allow up to `n` tasks to overlap; the report keeps task order
    pub fn with_max_concurrent_tasks(mut self, n: usize) -> Self {
        self.max_concurrent_tasks = n.max(1);
        self
    }

    /// Tasks in run order
    pub fn tasks(&self) -> &[CrawlTask] {
        &self.tasks
    }

    /// Execute every task and aggregate the outcomes
    ///
    /// Uses `run_id` when given, otherwise derives one from the start time.
    /// Always returns a complete report, even when every task failed.
    pub async fn run(&self, run_id: Option<RunId>) -> RunReport {
        let started_at = Utc::now();
        let run_id = run_id.unwrap_or_else(|| RunId::from_timestamp(started_at));
        let span = tracing::info_span!("crawl", run_id = %run_id);

        async {
            tracing::info!(
                dry_run = self.store.is_dry_run(),
                tasks = self.tasks.len(),
                "Crawler started"
            );

            let total = self.tasks.len();
            let run_id_ref = &run_id;
            let outcomes: Vec<(String, TaskOutcome)> =
                futures::stream::iter(self.tasks.iter().enumerate())
                    .map(|(i, task)| async move {
                        let outcome = self.run_task(i + 1, total, task, run_id_ref).await;
                        (task.name.clone(), outcome)
                    })
                    .buffered(self.max_concurrent_tasks)
                    .collect()
                    .await;

            let mut tasks = IndexMap::with_capacity(outcomes.len());
            for (name, outcome) in outcomes {
                if tasks.insert(name.clone(), outcome).is_some() {
                    tracing::warn!(task = %name, "Duplicate task name, keeping the later outcome");
                }
            }

            let report = RunReport {
                run_id: run_id.clone(),
                dry_run: self.store.is_dry_run(),
                started_at,
                finished_at: Utc::now(),
                tasks,
            };

            tracing::info!(
                duration_sec = report.duration().num_milliseconds() as f64 / 1000.0,
                succeeded = report.succeeded(),
                failed = report.failed(),
                "Crawler finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn run_task(
        &self,
        index: usize,
        total: usize,
        task: &CrawlTask,
        run_id: &RunId,
    ) -> TaskOutcome {
        tracing::info!(task = %task.name, url = %task.source_url, "[{}/{}] Running task", index, total);

        let data = match task.producer.produce().await {
            Ok(data) => data,
            Err(e) => return failed(task, run_id, e.to_string()),
        };

        let sources = data.payload_sources();
        let attempted = sources.len();
        let mut artifacts = Vec::new();
        let mut skipped = Vec::new();
        let mut failures = Vec::new();

        for source in sources {
            match self.ingest(source, run_id).await {
                ArtifactOutcome::Stored(manifest) => artifacts.push(manifest),
                ArtifactOutcome::Skipped { url, reason } => {
                    tracing::info!(task = %task.name, %url, %reason, "Payload skipped");
                    skipped.push(url);
                }
                ArtifactOutcome::Failed { url, error } => {
                    tracing::warn!(task = %task.name, %url, %error, "Payload failed");
                    failures.push(FileFailure { url, error });
                }
            }
        }

        if attempted > 0 && failures.len() == attempted {
            let error = failures
                .iter()
                .map(|f| f.error.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return failed(task, run_id, error);
        }

        tracing::debug!(
            task = %task.name,
            stored = artifacts.len(),
            skipped = skipped.len(),
            failed = failures.len(),
            "Task complete"
        );
        TaskOutcome::Succeeded {
            data,
            artifacts,
            skipped,
            failures,
        }
    }

    async fn ingest(&self, source: PayloadSource, run_id: &RunId) -> ArtifactOutcome {
        let payload = match source {
            PayloadSource::Inline(payload) => payload,
            PayloadSource::Remote { url } => match self.fetcher.fetch(&url).await {
                Ok(fetched) => Payload::remote(fetched.bytes, fetched.content_type, url),
                Err(e) => {
                    return ArtifactOutcome::Failed {
                        url,
                        error: e.to_string(),
                    };
                }
            },
        };

        match self.store.save(&payload, run_id).await {
            Ok(Some(manifest)) => ArtifactOutcome::Stored(manifest),
            Ok(None) => ArtifactOutcome::Skipped {
                url: payload.source_url,
                reason: "HTML page served in place of the artifact".to_string(),
            },
            Err(e) => ArtifactOutcome::Failed {
                url: payload.source_url,
                error: e.to_string(),
            },
        }
    }
}

fn failed(task: &CrawlTask, run_id: &RunId, error: String) -> TaskOutcome {
    tracing::error!(task = %task.name, %error, "Task failed");
    TaskOutcome::Failed {
        name: task.name.clone(),
        run_id: run_id.clone(),
        source: TaskSource {
            url: task.source_url.clone(),
        },
        error,
    }
}

/// Run `tasks` against `artifacts_dir` with default fetch settings
///
/// # Errors
/// Returns error only when the crawler cannot be set up; task failures end up
/// in the report.
pub async fn run_crawler(
    artifacts_dir: &Path,
    dry_run: bool,
    run_id: Option<RunId>,
    tasks: Vec<CrawlTask>,
) -> Result<RunReport> {
    let config = Config {
        dry_run,
        ..Config::new(artifacts_dir)
    };
    let crawler = Crawler::from_config(&config, tasks)?;
    Ok(crawler.run(run_id).await)
}
