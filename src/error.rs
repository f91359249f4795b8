//! Error types for schedule-ingest
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (fetch, producer, persistence, etc.)
//! - Context information (source URL, task name, configuration key)
//! - Classification helpers used when building run reports

use thiserror::Error;

/// Result type alias for schedule-ingest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for schedule-ingest
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "artifacts_dir")
        key: Option<String>,
    },

    /// URL could not be parsed as an absolute URL
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Parser error message
        reason: String,
    },

    /// Transport-level HTTP failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream answered with a non-success status code
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// Numeric HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// Fetch failed before a response could be read (timeout, connect, body)
    #[error("failed to fetch {url}: {reason}")]
    Fetch {
        /// The URL that was requested
        url: String,
        /// Why the fetch failed
        reason: String,
    },

    /// A task's producer function failed
    #[error("producer for task '{task}' failed: {reason}")]
    Producer {
        /// Task name
        task: String,
        /// Failure description reported by the producer
        reason: String,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a producer failure
    pub fn producer(task: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Producer {
            task: task.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from the network side of a fetch
    ///
    /// Transport errors and non-success statuses are recovered at task
    /// granularity; everything else is either a producer or persistence failure.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::HttpStatus { .. } | Error::Fetch { .. }
        )
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}
