//! Configuration types for schedule-ingest

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// HTTP fetch settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Run orchestration settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// How many tasks may run at the same time (default: 1, strictly sequential)
    ///
    /// Values above 1 overlap task execution; the run report keeps task order
    /// regardless, and artifact writes stay serialized per artifact key.
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: default_max_concurrent_tasks(),
        }
    }
}

/// Relational persistence settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite database path; `None` disables publishing of run results
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

/// Main configuration for the ingestion pipeline
///
/// Sub-configs:
/// - [`fetch`](FetchConfig): HTTP timeout and user agent
/// - [`crawl`](CrawlConfig): task concurrency
/// - [`persistence`](PersistenceConfig): optional document database
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for artifacts (default: "parsing/artifacts")
    ///
    /// Raw payloads land in `{artifacts_dir}/raw`, manifests in
    /// `{artifacts_dir}/parsed`.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Validate without writing anything to disk
    #[serde(default)]
    pub dry_run: bool,

    /// HTTP fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Run orchestration settings
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Relational persistence settings
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
            dry_run: false,
            fetch: FetchConfig::default(),
            crawl: CrawlConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl Config {
    /// Create a configuration rooted at `artifacts_dir` with defaults elsewhere
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            ..Default::default()
        }
    }

    /// Directory holding raw payloads
    pub fn raw_dir(&self) -> PathBuf {
        self.artifacts_dir.join("raw")
    }

    /// Directory holding manifests
    pub fn parsed_dir(&self) -> PathBuf {
        self.artifacts_dir.join("parsed")
    }

    /// Check the configuration for values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.artifacts_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "artifacts_dir must not be empty".to_string(),
                key: Some("artifacts_dir".to_string()),
            });
        }
        if self.fetch.timeout.is_zero() {
            return Err(Error::Config {
                message: "fetch timeout must be greater than zero".to_string(),
                key: Some("fetch.timeout".to_string()),
            });
        }
        if self.crawl.max_concurrent_tasks == 0 {
            return Err(Error::Config {
                message: "max_concurrent_tasks must be at least 1".to_string(),
                key: Some("crawl.max_concurrent_tasks".to_string()),
            });
        }
        Ok(())
    }
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("parsing/artifacts")
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("schedule-ingest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_concurrent_tasks() -> usize {
    1
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
