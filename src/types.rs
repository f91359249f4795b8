//! Core types for schedule-ingest

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::tasks::TaskData;

/// Current manifest schema version
pub const MANIFEST_VERSION: u32 = 1;

/// Canonical source-type tag of an artifact
///
/// Each tag carries the file extension its raw payload is stored under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// HTML page (also the fallback for unknown or missing MIME types)
    Html,
    /// Plain text
    Text,
    /// PDF document
    Pdf,
    /// PNG image
    Png,
    /// JPEG image
    Jpg,
    /// WebP image
    Webp,
}

impl SourceType {
    /// Tag as written into manifests and key material
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Html => "html",
            SourceType::Text => "text",
            SourceType::Pdf => "pdf",
            SourceType::Png => "png",
            SourceType::Jpg => "jpg",
            SourceType::Webp => "webp",
        }
    }

    /// File extension for the raw payload
    pub fn extension(&self) -> &'static str {
        match self {
            SourceType::Html => "html",
            SourceType::Text => "txt",
            SourceType::Pdf => "pdf",
            SourceType::Png => "png",
            SourceType::Jpg => "jpg",
            SourceType::Webp => "webp",
        }
    }

    /// Canonical MIME type for this tag
    pub fn mime_type(&self) -> &'static str {
        match self {
            SourceType::Html => "text/html",
            SourceType::Text => "text/plain",
            SourceType::Pdf => "application/pdf",
            SourceType::Png => "image/png",
            SourceType::Jpg => "image/jpeg",
            SourceType::Webp => "image/webp",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of one ingestion run
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Create a RunId from a caller-supplied value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a RunId from a UTC timestamp (`20261019T081500Z`)
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        Self(at.format("%Y%m%dT%H%M%SZ").to_string())
    }

    /// Borrow the identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provenance block of a manifest
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSource {
    /// URL as handed to the store
    pub url: String,
    /// Normalized URL the artifact key was derived from
    pub source_id: String,
    /// Effective MIME type after classification
    pub mime_type: String,
}

/// Persisted description of one artifact
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Canonical source-type tag
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// Manifest schema version
    pub version: u32,
    /// Run that last wrote this manifest
    pub run_id: RunId,
    /// Where the payload came from
    pub source: ManifestSource,
    /// Raw payload path relative to the artifacts root (`raw/{key}.{ext}`)
    pub raw_path: String,
    /// Hex SHA-256 of the raw payload
    pub checksum: String,
    /// When this manifest was first written for its current checksum
    pub created_at: DateTime<Utc>,
}

/// Result of feeding one payload through the artifact store
#[derive(Clone, Debug)]
pub enum ArtifactOutcome {
    /// Artifact written, or confirmed unchanged
    Stored(Manifest),
    /// Payload deliberately not stored (e.g. an HTML error page in place of text)
    Skipped {
        /// Source URL of the payload
        url: String,
        /// Why it was skipped
        reason: String,
    },
    /// Fetching or persisting the payload failed
    Failed {
        /// Source URL of the payload
        url: String,
        /// Error description
        error: String,
    },
}

/// Per-file failure that did not abort its task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// Source URL that failed
    pub url: String,
    /// Error description
    pub error: String,
}

/// Reference URL of a failed task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSource {
    /// Page URL the task scrapes
    pub url: String,
}

/// Report entry for one task
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskOutcome {
    /// Producer ran and at least part of its payloads were ingested
    Succeeded {
        /// Data returned by the producer
        data: TaskData,
        /// Manifests of stored or confirmed artifacts
        artifacts: Vec<Manifest>,
        /// URLs skipped by the content guard
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        skipped: Vec<String>,
        /// Per-file failures that did not abort the task
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        failures: Vec<FileFailure>,
    },
    /// Task could not produce anything
    #[serde(rename_all = "camelCase")]
    Failed {
        /// Task name
        name: String,
        /// Run the failure happened in
        run_id: RunId,
        /// Reference URL of the task
        source: TaskSource,
        /// Error description
        error: String,
    },
}

impl TaskOutcome {
    /// Whether the task succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded { .. })
    }

    /// Manifests collected by a successful task (empty on failure)
    pub fn artifacts(&self) -> &[Manifest] {
        match self {
            TaskOutcome::Succeeded { artifacts, .. } => artifacts,
            TaskOutcome::Failed { .. } => &[],
        }
    }

    /// Error message of a failed task
    pub fn error(&self) -> Option<&str> {
        match self {
            TaskOutcome::Succeeded { .. } => None,
            TaskOutcome::Failed { error, .. } => Some(error),
        }
    }
}

/// Aggregated result of one run
///
/// Created fresh per run; persisting it is up to the caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Run identifier
    pub run_id: RunId,
    /// Whether writes were suppressed
    pub dry_run: bool,
    /// Run start time
    pub started_at: DateTime<Utc>,
    /// Run end time
    pub finished_at: DateTime<Utc>,
    /// Task name to outcome, in task order
    pub tasks: IndexMap<String, TaskOutcome>,
}

impl RunReport {
    /// Outcome of a task by name
    pub fn get(&self, name: &str) -> Option<&TaskOutcome> {
        self.tasks.get(name)
    }

    /// Number of successful tasks
    pub fn succeeded(&self) -> usize {
        self.tasks.values().filter(|o| o.is_success()).count()
    }

    /// Number of failed tasks
    pub fn failed(&self) -> usize {
        self.tasks.len() - self.succeeded()
    }

    /// All manifests produced during the run, in task order
    pub fn manifests(&self) -> impl Iterator<Item = &Manifest> {
        self.tasks.values().flat_map(|o| o.artifacts().iter())
    }

    /// Wall-clock duration of the run
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
