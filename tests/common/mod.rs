//! Common test utilities for schedule-ingest integration tests

#![allow(dead_code)]

use schedule_ingest::{CrawlTask, FnProducer, StaticProducer, TaskData, tasks::NamedFile};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const BELL_LINES: [&str; 3] = ["1. 08:30-09:50", "2. 10:00-11:20", "3. 11:30-12:50"];
pub const CLASSES_PNG: &[u8] = b"\x89PNG\r\n\x1a\nclasses";
pub const SESSIONS_JPG: &[u8] = b"\xff\xd8\xffsessions";
pub const RATING_PDF: &[u8] = b"%PDF-1.7 rating";
pub const GRANT_PDF: &[u8] = b"%PDF-1.7 grant";
pub const CALENDAR_PDF: &[u8] = b"%PDF-1.7 calendar";

/// Serve every remote payload the six standard tasks reference
pub async fn mount_site(server: &MockServer) {
    for (route, body, content_type) in [
        ("/img/classes.png", CLASSES_PNG, "image/png"),
        ("/img/sessions.jpg", SESSIONS_JPG, "image/jpeg"),
        ("/files/rating.pdf", RATING_PDF, "application/pdf"),
        ("/files/grant.pdf", GRANT_PDF, "application/pdf"),
        ("/files/calendar.pdf", CALENDAR_PDF, "application/pdf; charset=binary"),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", content_type)
                    .set_body_bytes(body.to_vec()),
            )
            .mount(server)
            .await;
    }
}

/// The six standard tasks, scraping pages on `base`
pub fn standard_tasks(base: &str) -> Vec<CrawlTask> {
    vec![
        CrawlTask::new(
            "call_schedule",
            format!("{base}/bells"),
            StaticProducer::new(TaskData::InlineText {
                lines: BELL_LINES.iter().map(|s| s.to_string()).collect(),
                image_url: Some(format!("{base}/img/bells.png")),
                page_url: format!("{base}/bells"),
            }),
        ),
        CrawlTask::new(
            "class_schedule",
            format!("{base}/classes"),
            StaticProducer::new(TaskData::Images {
                title: "Class schedule".to_string(),
                image_urls: vec![format!("{base}/img/classes.png")],
                page_url: format!("{base}/classes"),
            }),
        ),
        CrawlTask::new(
            "session_schedule",
            format!("{base}/sessions"),
            StaticProducer::new(TaskData::Images {
                title: "Exam sessions".to_string(),
                image_urls: vec![format!("{base}/img/sessions.jpg")],
                page_url: format!("{base}/sessions"),
            }),
        ),
        CrawlTask::new(
            "rating_list",
            format!("{base}/rating"),
            StaticProducer::new(TaskData::Files {
                title: None,
                files: vec![NamedFile {
                    name: "Rating list".to_string(),
                    url: format!("{base}/files/rating.pdf"),
                }],
                page_url: format!("{base}/rating"),
            }),
        ),
        CrawlTask::new(
            "scholarship_list",
            format!("{base}/grant"),
            StaticProducer::new(TaskData::Document {
                file_url: format!("{base}/files/grant.pdf"),
                file_name: "Scholarship holders".to_string(),
                file_text: "List of scholarship holders for the spring term".to_string(),
                page_url: format!("{base}/grant"),
            }),
        ),
        CrawlTask::new(
            "timetable_calendar",
            format!("{base}/calendar"),
            StaticProducer::new(TaskData::Files {
                title: Some("Academic calendar".to_string()),
                files: vec![NamedFile {
                    name: "Calendar 2026".to_string(),
                    url: format!("{base}/files/calendar.pdf"),
                }],
                page_url: format!("{base}/calendar"),
            }),
        ),
    ]
}

/// Replace the task named `name` with one whose producer fails
pub fn break_task(tasks: &mut [CrawlTask], name: &str) {
    if let Some(task) = tasks.iter_mut().find(|t| t.name == name) {
        let task_name = name.to_string();
        *task = CrawlTask::new(
            name,
            task.source_url.clone(),
            FnProducer::new(move || {
                Err(schedule_ingest::Error::producer(
                    task_name.clone(),
                    "expected table not found",
                ))
            }),
        );
    }
}

/// All regular files under `dir`, sorted
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}
