//! End-to-end crawls against a mock site
//!
//! These tests drive the full pipeline (HTTP fetch, classification, keying,
//! atomic storage, report assembly) through the public API.

mod common;

use common::*;
use schedule_ingest::{
    Config, Crawler, Database, Manifest, RunId, SourceType, TaskOutcome, db::JOB_CHUNK_DOCUMENT,
    run_crawler,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn full_run_stores_every_artifact() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let artifacts = TempDir::new().unwrap();

    let report = run_crawler(
        artifacts.path(),
        false,
        Some(RunId::new("20261019T060000Z")),
        standard_tasks(&server.uri()),
    )
    .await
    .unwrap();

    assert_eq!(report.succeeded(), 6);
    assert_eq!(report.failed(), 0);
    assert!(!report.dry_run);

    let types: Vec<SourceType> = report.manifests().map(|m| m.source_type).collect();
    assert_eq!(
        types,
        vec![
            SourceType::Text,
            SourceType::Png,
            SourceType::Jpg,
            SourceType::Pdf,
            SourceType::Pdf,
            SourceType::Pdf
        ]
    );

    // one raw file and one manifest per artifact
    assert_eq!(files_under(artifacts.path()).len(), 12);

    for manifest in report.manifests() {
        let raw = std::fs::read(artifacts.path().join(&manifest.raw_path)).unwrap();
        assert_eq!(
            schedule_ingest::key::sha256_hex(&raw),
            manifest.checksum,
            "checksum mismatch for {}",
            manifest.source.url
        );
        assert_eq!(manifest.run_id, RunId::new("20261019T060000Z"));
    }

    let bells = &report.get("call_schedule").unwrap().artifacts()[0];
    assert_eq!(
        std::fs::read_to_string(artifacts.path().join(&bells.raw_path)).unwrap(),
        BELL_LINES.join("\n")
    );

    let calendar = &report.get("timetable_calendar").unwrap().artifacts()[0];
    assert_eq!(calendar.source.mime_type, "application/pdf; charset=binary");
    assert!(calendar.raw_path.ends_with(".pdf"));
}

#[tokio::test]
async fn manifest_files_match_report() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let artifacts = TempDir::new().unwrap();

    let report = run_crawler(artifacts.path(), false, None, standard_tasks(&server.uri()))
        .await
        .unwrap();

    let parsed = artifacts.path().join("parsed");
    let mut on_disk: Vec<Manifest> = std::fs::read_dir(parsed)
        .unwrap()
        .map(|entry| serde_json::from_slice(&std::fs::read(entry.unwrap().path()).unwrap()).unwrap())
        .collect();
    on_disk.sort_by(|a, b| a.raw_path.cmp(&b.raw_path));

    let mut reported: Vec<Manifest> = report.manifests().cloned().collect();
    reported.sort_by(|a, b| a.raw_path.cmp(&b.raw_path));

    assert_eq!(on_disk, reported);
}

#[tokio::test]
async fn rerun_without_changes_is_a_no_op() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let artifacts = TempDir::new().unwrap();

    let first = run_crawler(
        artifacts.path(),
        false,
        Some(RunId::new("first")),
        standard_tasks(&server.uri()),
    )
    .await
    .unwrap();
    let mtimes: Vec<_> = files_under(artifacts.path())
        .iter()
        .map(|p| std::fs::metadata(p).unwrap().modified().unwrap())
        .collect();

    let second = run_crawler(
        artifacts.path(),
        false,
        Some(RunId::new("second")),
        standard_tasks(&server.uri()),
    )
    .await
    .unwrap();

    let a: Vec<&Manifest> = first.manifests().collect();
    let b: Vec<&Manifest> = second.manifests().collect();
    assert_eq!(a, b, "unchanged artifacts keep their manifests");
    assert!(b.iter().all(|m| m.run_id == RunId::new("first")));

    let mtimes_after: Vec<_> = files_under(artifacts.path())
        .iter()
        .map(|p| std::fs::metadata(p).unwrap().modified().unwrap())
        .collect();
    assert_eq!(mtimes, mtimes_after, "no file was rewritten");
}

#[tokio::test]
async fn server_error_fails_only_its_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/sessions.jpg"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_site(&server).await;
    let artifacts = TempDir::new().unwrap();

    let report = run_crawler(
        artifacts.path(),
        false,
        Some(RunId::new("outage")),
        standard_tasks(&server.uri()),
    )
    .await
    .unwrap();

    assert_eq!(report.succeeded(), 5);
    match report.get("session_schedule").unwrap() {
        TaskOutcome::Failed {
            name,
            run_id,
            source,
            error,
        } => {
            assert_eq!(name, "session_schedule");
            assert_eq!(run_id.as_str(), "outage");
            assert_eq!(source.url, format!("{}/sessions", server.uri()));
            assert!(error.contains("503"), "unexpected error: {error}");
        }
        other => panic!("expected failure, got {other:?}"),
    }

    let json = serde_json::to_value(&report).unwrap();
    let failed = &json["tasks"]["session_schedule"];
    assert_eq!(failed["name"], "session_schedule");
    assert_eq!(failed["runId"], "outage");
    assert!(failed["source"]["url"].is_string());
    assert!(failed["error"].is_string());
}

#[tokio::test]
async fn producer_failure_mid_batch_does_not_stop_later_tasks() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let artifacts = TempDir::new().unwrap();
    let mut tasks = standard_tasks(&server.uri());
    break_task(&mut tasks, "session_schedule");

    let report = run_crawler(artifacts.path(), false, None, tasks).await.unwrap();

    let names: Vec<&str> = report.tasks.keys().map(String::as_str).collect();
    assert_eq!(names, schedule_ingest::tasks::STANDARD_TASKS.to_vec());
    assert!(!report.get("session_schedule").unwrap().is_success());
    for name in ["rating_list", "scholarship_list", "timetable_calendar"] {
        assert!(report.get(name).unwrap().is_success(), "{name} should succeed");
    }
}

#[tokio::test]
async fn dry_run_touches_nothing() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let artifacts = TempDir::new().unwrap();

    let report = run_crawler(artifacts.path(), true, None, standard_tasks(&server.uri()))
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.succeeded(), 6);
    assert_eq!(report.manifests().count(), 6);
    assert!(files_under(artifacts.path()).is_empty());
}

#[tokio::test]
async fn changed_remote_file_is_rewritten() {
    let server = MockServer::start().await;
    let artifacts = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/files/rating.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/pdf")
                .set_body_bytes(b"%PDF v1".to_vec()),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/rating.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/pdf")
                .set_body_bytes(b"%PDF v2".to_vec()),
        )
        .mount(&server)
        .await;

    let tasks = || {
        standard_tasks(&server.uri())
            .into_iter()
            .filter(|t| t.name == "rating_list")
            .collect::<Vec<_>>()
    };

    let first = run_crawler(artifacts.path(), false, None, tasks()).await.unwrap();
    let second = run_crawler(artifacts.path(), false, None, tasks()).await.unwrap();

    let a = &first.get("rating_list").unwrap().artifacts()[0];
    let b = &second.get("rating_list").unwrap().artifacts()[0];
    assert_ne!(a.checksum, b.checksum);
    assert_eq!(a.raw_path, b.raw_path);
    assert_eq!(
        std::fs::read(artifacts.path().join(&b.raw_path)).unwrap(),
        b"%PDF v2"
    );
}

#[tokio::test]
async fn concurrent_run_matches_sequential_report_order() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let artifacts = TempDir::new().unwrap();

    let mut config = Config::new(artifacts.path());
    config.crawl.max_concurrent_tasks = 4;
    let crawler = Crawler::from_config(&config, standard_tasks(&server.uri())).unwrap();

    let report = crawler.run(None).await;

    let names: Vec<&str> = report.tasks.keys().map(String::as_str).collect();
    assert_eq!(names, schedule_ingest::tasks::STANDARD_TASKS.to_vec());
    assert_eq!(files_under(artifacts.path()).len(), 12);
}

#[tokio::test]
async fn published_run_feeds_documents_and_jobs() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let artifacts = TempDir::new().unwrap();
    let db_file = tempfile::NamedTempFile::new().unwrap();

    let report = run_crawler(artifacts.path(), false, None, standard_tasks(&server.uri()))
        .await
        .unwrap();
    let db = Database::new(db_file.path()).await.unwrap();

    let summary = db.publish_report(&report).await.unwrap();

    assert_eq!(summary.documents_written, 6);
    assert_eq!(summary.jobs_enqueued, 6);
    assert!(summary.call_schedule_saved);
    assert_eq!(db.pending_jobs(JOB_CHUNK_DOCUMENT).await.unwrap().len(), 6);
    assert_eq!(
        db.call_schedule_or_placeholder().await.unwrap(),
        BELL_LINES.join("\n")
    );

    db.close().await;
}
