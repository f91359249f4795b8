//! Fetch tasks and the data their producers return
//!
//! A task pairs a name and a reference page URL with a [`TaskProducer`], the
//! site-specific parser that scrapes the page. What the producer returns
//! decides which payloads the crawler ingests: inline text is stored directly,
//! file and image links are fetched one by one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::store::Payload;

/// Names of the standard tasks, in run order
pub const STANDARD_TASKS: [&str; 6] = [
    "call_schedule",
    "class_schedule",
    "session_schedule",
    "rating_list",
    "scholarship_list",
    "timetable_calendar",
];

/// Suffix appended to a page URL to identify its inline text payload
pub const INLINE_TEXT_FRAGMENT: &str = "#text";

/// A linked file with its display name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedFile {
    /// Link text
    pub name: String,
    /// Absolute file URL
    pub url: String,
}

/// Data returned by a task producer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum TaskData {
    /// Text scraped from the page itself (the bell schedule)
    InlineText {
        /// Text lines, joined with `\n` to form the payload
        lines: Vec<String>,
        /// Illustration found next to the text; recorded, not fetched
        #[serde(default)]
        image_url: Option<String>,
        /// Page the text came from
        page_url: String,
    },
    /// Schedule images (class and session schedules)
    Images {
        /// Page heading
        title: String,
        /// Image URLs to fetch
        image_urls: Vec<String>,
        /// Page the images are linked from
        page_url: String,
    },
    /// Linked documents (rating lists, calendars)
    Files {
        /// Page heading, when the page has one
        #[serde(default)]
        title: Option<String>,
        /// Files to fetch
        files: Vec<NamedFile>,
        /// Page the files are linked from
        page_url: String,
    },
    /// One linked document with a text excerpt (scholarship list)
    Document {
        /// File URL to fetch
        file_url: String,
        /// Link text
        file_name: String,
        /// Excerpt of the page text around the link
        file_text: String,
        /// Page the file is linked from
        page_url: String,
    },
}

/// Where a payload of a task comes from
#[derive(Clone, Debug)]
pub enum PayloadSource {
    /// Already in hand
    Inline(Payload),
    /// Must be fetched
    Remote {
        /// URL to GET
        url: String,
    },
}

impl PayloadSource {
    /// URL identifying the payload
    pub fn url(&self) -> &str {
        match self {
            PayloadSource::Inline(payload) => &payload.source_url,
            PayloadSource::Remote { url } => url,
        }
    }
}

impl TaskData {
    /// Payloads this data expands to, in order
    pub fn payload_sources(&self) -> Vec<PayloadSource> {
        match self {
            TaskData::InlineText {
                lines, page_url, ..
            } => vec![PayloadSource::Inline(Payload::text(
                lines.join("\n").into_bytes(),
                format!("{}{}", page_url, INLINE_TEXT_FRAGMENT),
            ))],
            TaskData::Images { image_urls, .. } => image_urls
                .iter()
                .map(|url| PayloadSource::Remote { url: url.clone() })
                .collect(),
            TaskData::Files { files, .. } => files
                .iter()
                .map(|file| PayloadSource::Remote {
                    url: file.url.clone(),
                })
                .collect(),
            TaskData::Document { file_url, .. } => vec![PayloadSource::Remote {
                url: file_url.clone(),
            }],
        }
    }

    /// Page the data was scraped from
    pub fn page_url(&self) -> &str {
        match self {
            TaskData::InlineText { page_url, .. }
            | TaskData::Images { page_url, .. }
            | TaskData::Files { page_url, .. }
            | TaskData::Document { page_url, .. } => page_url,
        }
    }

    /// Human-readable title for the payload fetched from `url`
    pub fn title_for(&self, url: &str) -> Option<&str> {
        match self {
            TaskData::InlineText { .. } => None,
            TaskData::Images { title, .. } => Some(title),
            TaskData::Files { title, files, .. } => files
                .iter()
                .find(|f| f.url == url)
                .map(|f| f.name.as_str())
                .or(title.as_deref()),
            TaskData::Document { file_name, .. } => Some(file_name),
        }
    }

    /// Text lines of an inline-text task
    pub fn text_lines(&self) -> Option<&[String]> {
        match self {
            TaskData::InlineText { lines, .. } => Some(lines),
            _ => None,
        }
    }
}

/// Site-specific parser feeding one task
#[async_trait]
pub trait TaskProducer: Send + Sync {
    /// Scrape the task's page
    async fn produce(&self) -> Result<TaskData>;
}

/// Producer returning data computed ahead of time
#[derive(Clone, Debug)]
pub struct StaticProducer(TaskData);

impl StaticProducer {
    /// Wrap pre-computed data
    pub fn new(data: TaskData) -> Self {
        Self(data)
    }
}

#[async_trait]
impl TaskProducer for StaticProducer {
    async fn produce(&self) -> Result<TaskData> {
        Ok(self.0.clone())
    }
}

/// Producer calling a synchronous closure
pub struct FnProducer<F>(F);

impl<F> FnProducer<F>
where
    F: Fn() -> Result<TaskData> + Send + Sync,
{
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> TaskProducer for FnProducer<F>
where
    F: Fn() -> Result<TaskData> + Send + Sync,
{
    async fn produce(&self) -> Result<TaskData> {
        (self.0)()
    }
}

/// One named unit of work
#[derive(Clone)]
pub struct CrawlTask {
    /// Task name, the key in the run report
    pub name: String,
    /// Reference page URL, reported when the task fails
    pub source_url: String,
    /// Parser producing the task's data
    pub producer: Arc<dyn TaskProducer>,
}

impl CrawlTask {
    /// Create a task
    pub fn new(
        name: impl Into<String>,
        source_url: impl Into<String>,
        producer: impl TaskProducer + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
            producer: Arc::new(producer),
        }
    }
}

impl std::fmt::Debug for CrawlTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlTask")
            .field("name", &self.name)
            .field("source_url", &self.source_url)
            .finish_non_exhaustive()
    }
}

/// Serialized parser output, one entry per task
///
/// Lets parsers run out of process: they dump their results as a JSON array
/// of descriptors and the crawler ingests them. An entry carrying `error`
/// instead of `data` records a parser failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescriptor {
    /// Task name
    pub name: String,
    /// Reference page URL
    pub source_url: String,
    /// Parser output
    #[serde(default)]
    pub data: Option<TaskData>,
    /// Parser failure message
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskDescriptor {
    /// Turn the descriptor into a runnable task
    pub fn into_task(self) -> CrawlTask {
        let TaskDescriptor {
            name,
            source_url,
            data,
            error,
        } = self;
        match data {
            Some(data) => CrawlTask::new(name, source_url, StaticProducer::new(data)),
            None => {
                let task = name.clone();
                let reason = error.unwrap_or_else(|| "parser produced no data".to_string());
                CrawlTask::new(
                    name,
                    source_url,
                    FnProducer::new(move || Err(Error::producer(task.clone(), reason.clone()))),
                )
            }
        }
    }
}

/// Parse a JSON array of task descriptors into tasks, keeping file order
pub fn tasks_from_json(json: &str) -> Result<Vec<CrawlTask>> {
    let descriptors: Vec<TaskDescriptor> = serde_json::from_str(json)?;
    for descriptor in &descriptors {
        if !STANDARD_TASKS.contains(&descriptor.name.as_str()) {
            tracing::warn!(task = %descriptor.name, "Task is not one of the standard tasks");
        }
    }
    Ok(descriptors
        .into_iter()
        .map(TaskDescriptor::into_task)
        .collect())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn files_data() -> TaskData {
        TaskData::Files {
            title: Some("Calendar 2026/27".into()),
            files: vec![
                NamedFile {
                    name: "Autumn".into(),
                    url: "https://example.com/autumn.pdf".into(),
                },
                NamedFile {
                    name: "Spring".into(),
                    url: "https://example.com/spring.pdf".into(),
                },
            ],
            page_url: "https://example.com/calendar".into(),
        }
    }

    #[test]
    fn inline_text_expands_to_one_text_payload() {
        let data = TaskData::InlineText {
            lines: vec!["1. 08:30-09:50".into(), "2. 10:00-11:20".into()],
            image_url: Some("https://example.com/bells.png".into()),
            page_url: "https://example.com/bells".into(),
        };

        let sources = data.payload_sources();
        assert_eq!(sources.len(), 1);
        match &sources[0] {
            PayloadSource::Inline(payload) => {
                assert_eq!(payload.bytes, b"1. 08:30-09:50\n2. 10:00-11:20");
                assert_eq!(payload.source_url, "https://example.com/bells#text");
                assert_eq!(payload.mime_type, "text/plain");
                assert!(payload.expect_text);
            }
            other => panic!("expected inline payload, got {other:?}"),
        }
    }

    #[test]
    fn file_lists_expand_to_remote_payloads_in_order() {
        let urls: Vec<_> = files_data()
            .payload_sources()
            .iter()
            .map(|s| s.url().to_string())
            .collect();

        assert_eq!(
            urls,
            vec![
                "https://example.com/autumn.pdf",
                "https://example.com/spring.pdf"
            ]
        );
    }

    #[test]
    fn document_and_images_expand_to_remote_payloads() {
        let doc = TaskData::Document {
            file_url: "https://example.com/grant.pdf".into(),
            file_name: "Grant list".into(),
            file_text: "Students receiving the grant".into(),
            page_url: "https://example.com/grant".into(),
        };
        assert_eq!(doc.payload_sources().len(), 1);
        assert_eq!(doc.title_for("https://example.com/grant.pdf"), Some("Grant list"));

        let images = TaskData::Images {
            title: "Classes".into(),
            image_urls: vec![],
            page_url: "https://example.com/classes".into(),
        };
        assert!(images.payload_sources().is_empty());
    }

    #[test]
    fn title_prefers_file_name() {
        let data = files_data();
        assert_eq!(data.title_for("https://example.com/spring.pdf"), Some("Spring"));
        assert_eq!(
            data.title_for("https://example.com/other.pdf"),
            Some("Calendar 2026/27")
        );
        assert_eq!(data.page_url(), "https://example.com/calendar");
    }

    #[test]
    fn task_data_json_shape() {
        let json = serde_json::to_value(files_data()).unwrap();
        assert_eq!(json["kind"], "files");
        assert_eq!(json["pageUrl"], "https://example.com/calendar");
        assert_eq!(json["files"][0]["name"], "Autumn");

        let parsed: TaskData = serde_json::from_str(
            r#"{"kind": "inline_text", "lines": ["a"], "pageUrl": "https://example.com/p"}"#,
        )
        .unwrap();
        assert_eq!(parsed.text_lines(), Some(&["a".to_string()][..]));
    }

    #[tokio::test]
    async fn descriptors_become_tasks() {
        let json = r#"[
            {"name": "rating_list", "sourceUrl": "https://example.com/rating",
             "data": {"kind": "files", "files": [], "pageUrl": "https://example.com/rating"}},
            {"name": "class_schedule", "sourceUrl": "https://example.com/classes",
             "error": "table layout changed"}
        ]"#;

        let tasks = tasks_from_json(json).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].name, "rating_list");
        assert!(tasks[0].producer.produce().await.is_ok());

        let err = tasks[1].producer.produce().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "producer for task 'class_schedule' failed: table layout changed"
        );
    }

    #[test]
    fn malformed_descriptor_file_is_rejected() {
        assert!(tasks_from_json("{").is_err());
    }
}
