//! Integration tests for catch-up runs
//!
//! These tests use wiremock to stand in for both the listing API and the
//! e-print endpoint and run the full page, walk and download cycle.

use arxiv_catchup::config::{Config, DownloadConfig, FeedConfig, StorageConfig, UserAgentConfig};
use arxiv_catchup::crawler::{catch_up, CatchupOptions, CrawlOrchestrator, CrawlRequest, ShutdownSignal, StopReason};
use arxiv_catchup::storage::{RunStatus, SqliteStorage, Storage};
use arxiv_catchup::{CatchupError, Checkpoint, DownloadStatus};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHECKPOINT: &str = "2023-08-10T00:00:00Z";

/// Creates a test configuration pointing at the mock server
fn create_test_config(server_uri: &str, output_dir: &Path, db_path: &Path, page_size: u32) -> Config {
    Config {
        feed: FeedConfig {
            api_url: format!("{}/api/query", server_uri),
            category: "cs.AI".to_string(),
            page_size,
            request_delay_ms: 0,
        },
        download: DownloadConfig {
            artifact_url: format!("{}/e-print/", server_uri),
            output_dir: output_dir.display().to_string(),
            max_parallel_downloads: 2,
            skip_existing: false,
            timeout_secs: 10,
            extensions: HashMap::new(),
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        storage: StorageConfig {
            database_path: db_path.display().to_string(),
        },
    }
}

/// Renders an Atom listing page from `(id, updated)` pairs
fn atom_feed(entries: &[(&str, &str)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=cat:cs.AI</title>
"#,
    );
    for (id, updated) in entries {
        xml.push_str(&format!(
            r#"  <entry>
    <id>http://arxiv.org/abs/{id}</id>
    <updated>{updated}</updated>
    <title>Paper {id}</title>
    <link href="http://arxiv.org/abs/{id}" rel="alternate" type="text/html"/>
  </entry>
"#
        ));
    }
    xml.push_str("</feed>");
    xml
}

async fn mount_page(server: &MockServer, start: usize, entries: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("start", start.to_string()))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(atom_feed(entries), "application/atom+xml"),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_artifact(server: &MockServer, id: &str, content_type: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/e-print/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), content_type))
        .mount(server)
        .await;
}

/// Serves a PDF for every e-print path not mounted more specifically
async fn mount_any_artifact(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/e-print/.+"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.5".to_vec(), "application/pdf"))
        .mount(server)
        .await;
}

fn request(config: &Config) -> CrawlRequest {
    CrawlRequest::from_config(config, Checkpoint::parse(CHECKPOINT).unwrap())
}

#[tokio::test]
async fn test_walk_stops_at_checkpoint_across_pages() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), &dir.path().join("ledger.db"), 2);

    mount_page(
        &server,
        0,
        &[("2308.00004v1", "2023-08-14T12:00:00Z"), ("2308.00003v1", "2023-08-13T12:00:00Z")],
    )
    .await;
    mount_page(
        &server,
        2,
        &[("2308.00002v1", "2023-08-12T12:00:00Z"), ("2308.00001v1", "2023-08-01T12:00:00Z")],
    )
    .await;
    mount_any_artifact(&server).await;

    let orchestrator = CrawlOrchestrator::from_config(&config).unwrap();
    let report = orchestrator.run(&request(&config)).await.unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::ReachedCheckpoint));
    assert_eq!(report.summary.pages_scanned, 2);
    assert_eq!(report.summary.submitted, 3);
    assert_eq!(report.summary.successes, 3);

    let urls: Vec<&str> = report.outcomes.iter().map(|o| o.task.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/e-print/2308.00004v1", server.uri()),
            format!("{}/e-print/2308.00003v1", server.uri()),
            format!("{}/e-print/2308.00002v1", server.uri()),
        ]
    );

    assert!(dir.path().join("2308.00004v1.pdf").exists());
    assert!(dir.path().join("2308.00002v1.pdf").exists());
    assert!(!dir.path().join("2308.00001v1.pdf").exists());
}

#[tokio::test]
async fn test_short_page_ends_walk() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), &dir.path().join("ledger.db"), 3);

    mount_page(&server, 0, &[("2308.00009v1", "2023-08-14T12:00:00Z")]).await;
    mount_any_artifact(&server).await;

    let orchestrator = CrawlOrchestrator::from_config(&config).unwrap();
    let report = orchestrator.run(&request(&config)).await.unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::FeedExhausted));
    assert_eq!(report.outcomes.len(), 1);
    assert!(report.outcomes[0].is_success());
}

#[tokio::test]
async fn test_feed_failure_aborts_after_draining() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), &dir.path().join("ledger.db"), 2);

    mount_page(
        &server,
        0,
        &[("2308.00004v1", "2023-08-14T12:00:00Z"), ("2308.00003v1", "2023-08-13T12:00:00Z")],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_any_artifact(&server).await;

    let orchestrator = CrawlOrchestrator::from_config(&config).unwrap();
    match orchestrator.run(&request(&config)).await {
        Err(CatchupError::FeedQuery { offset, partial, .. }) => {
            assert_eq!(offset, 2);
            assert_eq!(partial.outcomes.len(), 2);
            assert_eq!(partial.summary.successes, 2);
        }
        other => panic!("expected FeedQuery error, got {:?}", other.map(|r| r.summary)),
    }

    // Downloads submitted before the failure still completed.
    assert!(dir.path().join("2308.00004v1.pdf").exists());
    assert!(dir.path().join("2308.00003v1.pdf").exists());
}

#[tokio::test]
async fn test_failed_download_is_isolated() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), &dir.path().join("ledger.db"), 5);

    mount_page(
        &server,
        0,
        &[
            ("2308.00003v1", "2023-08-14T12:00:00Z"),
            ("2308.00002v1", "2023-08-13T12:00:00Z"),
            ("2308.00001v1", "2023-08-12T12:00:00Z"),
        ],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/e-print/2308.00002v1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_any_artifact(&server).await;

    let orchestrator = CrawlOrchestrator::from_config(&config).unwrap();
    let report = orchestrator.run(&request(&config)).await.unwrap();

    assert_eq!(report.summary.successes, 2);
    assert_eq!(report.summary.failures, 1);
    assert!(report.outcomes[1].is_failure());
    assert!(!dir.path().join("2308.00002v1").exists());
    assert!(!dir.path().join("2308.00002v1.pdf").exists());
    assert!(dir.path().join("2308.00003v1.pdf").exists());
    assert!(dir.path().join("2308.00001v1.pdf").exists());
}

#[tokio::test]
async fn test_extension_follows_content_type() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), &dir.path().join("ledger.db"), 10);

    mount_page(
        &server,
        0,
        &[
            ("2308.00004v1", "2023-08-14T12:00:00Z"),
            ("2308.00003v1", "2023-08-13T12:00:00Z"),
            ("hep-th/9901001v1", "2023-08-12T12:00:00Z"),
            ("2308.00001v1", "2023-08-11T12:00:00Z"),
        ],
    )
    .await;
    mount_artifact(&server, "2308.00004v1", "application/pdf", b"%PDF").await;
    mount_artifact(&server, "2308.00003v1", "application/x-eprint-tar", b"tar").await;
    mount_artifact(&server, "hep-th/9901001v1", "application/x-eprint", b"\\documentclass").await;
    mount_artifact(&server, "2308.00001v1", "application/octet-stream", b"blob").await;

    let orchestrator = CrawlOrchestrator::from_config(&config).unwrap();
    let report = orchestrator.run(&request(&config)).await.unwrap();

    assert_eq!(report.summary.successes, 4);
    assert!(dir.path().join("2308.00004v1.pdf").exists());
    assert!(dir.path().join("2308.00003v1.tar").exists());
    assert!(dir.path().join("hep-th9901001v1.tex").exists());
    assert!(dir.path().join("2308.00001v1").exists());
    assert_eq!(
        std::fs::read(dir.path().join("hep-th9901001v1.tex")).unwrap(),
        b"\\documentclass"
    );
}

#[tokio::test]
async fn test_skip_existing_avoids_download() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path(), &dir.path().join("ledger.db"), 10);
    config.download.skip_existing = true;

    std::fs::write(dir.path().join("2308.00002v1.tar"), b"already here").unwrap();

    mount_page(
        &server,
        0,
        &[("2308.00002v1", "2023-08-14T12:00:00Z"), ("2308.00001v1", "2023-08-13T12:00:00Z")],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/e-print/2308.00002v1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_any_artifact(&server).await;

    let orchestrator = CrawlOrchestrator::from_config(&config).unwrap();
    let report = orchestrator.run(&request(&config)).await.unwrap();

    assert_eq!(report.summary.skipped, 1);
    assert_eq!(report.summary.successes, 1);
    assert!(matches!(report.outcomes[0].status, DownloadStatus::Skipped { .. }));
    assert_eq!(
        std::fs::read(dir.path().join("2308.00002v1.tar")).unwrap(),
        b"already here"
    );
}

#[tokio::test]
async fn test_shutdown_mid_run_drains_submitted_downloads() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path(), &dir.path().join("ledger.db"), 2);
    config.feed.request_delay_ms = 30_000;

    mount_page(
        &server,
        0,
        &[("2308.00004v1", "2023-08-14T12:00:00Z"), ("2308.00003v1", "2023-08-13T12:00:00Z")],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/e-print/.+"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"%PDF-1.5".to_vec(), "application/pdf")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let shutdown = ShutdownSignal::shared();
    let orchestrator = CrawlOrchestrator::from_config(&config)
        .unwrap()
        .with_shutdown(shutdown.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.request_shutdown();
    });

    let started = Instant::now();
    let report = orchestrator.run(&request(&config)).await.unwrap();

    // The 30s pause was cut short, but both downloads still ran to completion.
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(report.stop_reason, Some(StopReason::Cancelled));
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.summary.successes, 2);
    assert!(dir.path().join("2308.00004v1.pdf").exists());
    assert!(dir.path().join("2308.00003v1.pdf").exists());
}

#[tokio::test]
async fn test_catch_up_records_run_and_advances_checkpoint() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ledger.db");
    let config = create_test_config(&server.uri(), &dir.path().join("papers"), &db_path, 10);

    mount_page(
        &server,
        0,
        &[("2308.00002v1", "2023-08-14T12:00:00Z"), ("2308.00001v1", "2023-08-12T12:00:00Z")],
    )
    .await;
    mount_any_artifact(&server).await;

    let options = CatchupOptions {
        since: Some(Checkpoint::parse(CHECKPOINT).unwrap()),
        config_hash: "hash".to_string(),
        shutdown: None,
    };
    let report = catch_up(&config, options).await.unwrap();
    assert_eq!(report.summary.successes, 2);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.successes, 2);
    assert_eq!(storage.get_run_downloads(run.id).unwrap().len(), 2);
    assert_eq!(
        storage.latest_checkpoint("cs.AI").unwrap(),
        Some(Checkpoint::parse("2023-08-14T12:00:00Z").unwrap())
    );
}

#[tokio::test]
async fn test_catch_up_without_checkpoint_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config("http://127.0.0.1:9", dir.path(), &dir.path().join("ledger.db"), 10);

    let result = catch_up(&config, CatchupOptions::default()).await;
    assert!(matches!(result, Err(CatchupError::MissingCheckpoint(_))));
}

#[tokio::test]
async fn test_cancelled_run_keeps_checkpoint() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ledger.db");
    let config = create_test_config(&server.uri(), dir.path(), &db_path, 10);

    let shutdown = ShutdownSignal::shared();
    shutdown.request_shutdown();

    let options = CatchupOptions {
        since: Some(Checkpoint::parse(CHECKPOINT).unwrap()),
        config_hash: "hash".to_string(),
        shutdown: Some(shutdown),
    };
    let report = catch_up(&config, options).await.unwrap();
    assert!(report.was_cancelled());

    let storage = SqliteStorage::new(&db_path).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Interrupted);
    assert!(run.next_checkpoint.is_none());
    assert_eq!(storage.latest_checkpoint("cs.AI").unwrap(), None);
}
