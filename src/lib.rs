//! # schedule-ingest
//!
//! Artifact ingestion for university schedule data.
//!
//! A run executes a fixed batch of scraping tasks (bell schedule, class
//! schedule, exam sessions, rating lists, scholarships, calendar). Every
//! payload a task yields is classified, keyed by its normalized source URL,
//! and stored as a raw file plus a JSON manifest under an artifacts root:
//!
//! ```text
//! {artifacts_dir}/raw/{key}.{ext}
//! {artifacts_dir}/parsed/{key}.json
//! ```
//!
//! Re-ingesting identical bytes is a no-op. Task failures are isolated and
//! reported; they never abort the run.
//!
//! ## Quick Start
//!
//! ```no_run
//! use schedule_ingest::{CrawlTask, StaticProducer, TaskData, run_crawler};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tasks = vec![CrawlTask::new(
//!         "call_schedule",
//!         "https://uni.example/bells",
//!         StaticProducer::new(TaskData::InlineText {
//!             lines: vec!["1. 08:30-09:50".into()],
//!             image_url: None,
//!             page_url: "https://uni.example/bells".into(),
//!         }),
//!     )];
//!
//!     let report = run_crawler(Path::new("artifacts"), false, None, tasks).await?;
//!     println!("{} tasks succeeded", report.succeeded());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Content classification and the HTML guard
pub mod classify;
/// Configuration types
pub mod config;
/// Run orchestration
pub mod crawler;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Remote payload fetching
pub mod fetch;
/// Artifact key derivation
pub mod key;
/// URL normalization
pub mod normalize;
/// Content-addressed artifact storage
pub mod store;
/// Task definitions and producers
pub mod tasks;
/// Core types
pub mod types;

pub use config::{Config, CrawlConfig, FetchConfig, PersistenceConfig};
pub use crawler::{Crawler, run_crawler};
pub use db::{Database, PublishSummary};
pub use error::{DatabaseError, Error, Result};
pub use fetch::{FetchedPayload, Fetcher, HttpFetcher};
pub use key::ArtifactKey;
pub use normalize::normalize_url;
pub use store::{ArtifactStore, Payload};
pub use tasks::{CrawlTask, FnProducer, StaticProducer, TaskData, TaskProducer, tasks_from_json};
pub use types::{Manifest, RunId, RunReport, SourceType, TaskOutcome};
