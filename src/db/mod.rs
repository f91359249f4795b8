//! Database layer for schedule-ingest
//!
//! SQLite persistence for the documents a run publishes, the latest bell
//! schedule text, and the job queue that downstream chunking workers consume.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`]: Database lifecycle, schema migrations
//! - [`documents`]: Document upsert and checksum lookup
//! - [`call_schedule`]: Call schedule text
//! - [`jobs`]: Job queue
//! - [`publish`]: Hand-off of a finished run into the tables above

use sqlx::{FromRow, sqlite::SqlitePool};

mod call_schedule;
mod documents;
mod jobs;
mod migrations;
mod publish;

pub use call_schedule::CALL_SCHEDULE_PLACEHOLDER;
pub use jobs::JOB_CHUNK_DOCUMENT;

/// Identifier of a row in the `documents` table
pub type DocumentId = i64;

/// Document status constants
pub mod document_status {
    /// Raw payload fetched and stored, not yet chunked
    pub const FETCHED: &str = "fetched";
}

/// Document to be inserted or refreshed
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Canonical source-type tag (`pdf`, `png`, ...)
    pub source_type: String,
    /// Normalized source URL
    pub source_id: String,
    /// URL the payload was fetched from
    pub url: Option<String>,
    /// Human-readable title
    pub title: Option<String>,
    /// Effective MIME type
    pub mime_type: Option<String>,
    /// Hex SHA-256 of the raw payload
    pub checksum: String,
    /// Processing status (see [`document_status`])
    pub status: String,
    /// Raw payload path relative to the artifacts root
    pub raw_path: String,
    /// Last processing error, if any
    pub last_error: Option<String>,
    /// Unix timestamp the payload was captured
    pub parsed_at: Option<i64>,
}

/// Document record from database
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    /// Unique database ID
    pub id: DocumentId,
    /// Canonical source-type tag
    pub source_type: String,
    /// Normalized source URL
    pub source_id: String,
    /// URL the payload was fetched from
    pub url: Option<String>,
    /// Human-readable title
    pub title: Option<String>,
    /// Effective MIME type
    pub mime_type: Option<String>,
    /// Hex SHA-256 of the raw payload
    pub checksum: String,
    /// Processing status
    pub status: String,
    /// Raw payload path relative to the artifacts root
    pub raw_path: String,
    /// Last processing error
    pub last_error: Option<String>,
    /// Unix timestamp the payload was captured
    pub parsed_at: Option<i64>,
    /// Unix timestamp of the first insert
    pub created_at: i64,
    /// Unix timestamp of the last content change
    pub updated_at: i64,
}

/// Job record from database
#[derive(Debug, Clone, FromRow)]
pub struct Job {
    /// Unique database ID
    pub id: i64,
    /// Job name, e.g. [`JOB_CHUNK_DOCUMENT`]
    pub name: String,
    /// JSON payload
    pub data: String,
    /// Job state (`created` until a worker picks it up)
    pub state: String,
    /// Unix timestamp when the job was enqueued
    pub created_at: i64,
}

/// What [`Database::publish_report`] wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishSummary {
    /// Documents inserted or updated
    pub documents_written: usize,
    /// Documents whose checksum already matched
    pub documents_unchanged: usize,
    /// Chunk jobs enqueued
    pub jobs_enqueued: usize,
    /// Whether call schedule text was saved
    pub call_schedule_saved: bool,
}

/// Database handle for schedule-ingest
pub struct Database {
    pool: SqlitePool,
}
