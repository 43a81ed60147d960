//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full enqueue, crawl, and search cycle against an on-disk database.

use pagesift::config::{Config, DedupMode};
use pagesift::crawler::Coordinator;
use pagesift::search::search;
use pagesift::state::QueueStatus;
use pagesift::storage::{SqliteStorage, Storage};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at a database in `dir`
fn create_test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawler.request_delay_ms = 0;
    config.crawler.request_timeout_secs = 2;
    config.storage.database_path = dir
        .path()
        .join("index.db")
        .to_string_lossy()
        .into_owned();
    config
}

fn open_storage(config: &Config) -> SqliteStorage {
    SqliteStorage::new(Path::new(&config.storage.database_path)).expect("Failed to open DB")
}

async fn mount_html(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_then_search() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/rust",
        r#"<html><head><title>Rust Guide</title>
        <meta name="description" content="Systems programming">
        <meta name="keywords" content="rust, cargo">
        <script>var rust = "hidden";</script></head>
        <body><h1>Rust</h1><p>Ownership  and   borrowing</p></body></html>"#
            .to_string(),
    )
    .await;
    mount_html(
        &mock_server,
        "/soup",
        "<html><head><title>Soup</title></head><body>Tomato soup</body></html>".to_string(),
    )
    .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&dir);

    let mut coordinator = Coordinator::open(config.clone()).expect("Failed to open coordinator");
    coordinator
        .enqueue(&format!("{}/rust", base_url))
        .expect("Failed to enqueue");
    coordinator
        .enqueue(&format!("{}/soup", base_url))
        .expect("Failed to enqueue");

    let report = coordinator.run_batch().await.expect("Batch failed");
    assert_eq!(report.completed, 2);

    let storage = open_storage(&config);
    let page = storage
        .get_page_by_url(&format!("{}/rust", base_url))
        .expect("Failed to read page")
        .expect("Page missing");
    assert_eq!(page.title, "Rust Guide");
    assert_eq!(page.keywords, "rust, cargo");
    assert!(!page.content.contains("hidden"));
    assert!(page.content.contains("Ownership and borrowing"));

    let results = search(&storage, "rust", 10).expect("Search failed");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Rust Guide");
    assert_eq!(results[0].description, "Systems programming");
    assert!(results[0].crawled_at.is_some());
}

#[tokio::test]
async fn test_requests_carry_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "EduSearchBot/1.0 (Educational Project)"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Hi</title>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut coordinator =
        Coordinator::open(create_test_config(&dir)).expect("Failed to open coordinator");
    coordinator
        .enqueue(&mock_server.uri())
        .expect("Failed to enqueue");

    let report = coordinator.run_batch().await.expect("Batch failed");
    assert_eq!(report.completed, 1);
}

#[tokio::test]
async fn test_failed_fetches_are_terminal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&dir);
    let mut coordinator = Coordinator::open(config.clone()).expect("Failed to open coordinator");

    let outcome = coordinator
        .enqueue(&format!("{}/missing", mock_server.uri()))
        .expect("Failed to enqueue");

    let first = coordinator.run_batch().await.expect("Batch failed");
    assert_eq!(first.failed, 1);

    // No retry without a fresh enqueue
    let second = coordinator.run_batch().await.expect("Batch failed");
    assert_eq!(second.processed, 0);

    let storage = open_storage(&config);
    let entry = storage
        .get_queue_entry(outcome.entry_id)
        .expect("Failed to read entry");
    assert_eq!(entry.status, QueueStatus::Failed);
    assert_eq!(storage.count_pages().expect("Failed to count"), 0);
}

#[tokio::test]
async fn test_batch_cap_across_runs() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>page</p>"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&dir);
    let mut coordinator = Coordinator::open(config.clone()).expect("Failed to open coordinator");

    for i in 0..12 {
        coordinator
            .enqueue(&format!("{}/p{}", mock_server.uri(), i))
            .expect("Failed to enqueue");
    }

    let first = coordinator.run_batch().await.expect("Batch failed");
    let second = coordinator.run_batch().await.expect("Batch failed");
    assert_eq!(first.completed, 10);
    assert_eq!(second.completed, 2);

    let storage = open_storage(&config);
    assert_eq!(storage.count_pages().expect("Failed to count"), 12);
    assert_eq!(
        storage
            .count_queue_by_status(QueueStatus::Pending)
            .expect("Failed to count"),
        0
    );
}

#[tokio::test]
async fn test_recrawl_across_runs_updates_single_page() {
    let mock_server = MockServer::start().await;
    let url = format!("{}/news", mock_server.uri());

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&dir);

    // The first response is served once, every later fetch sees the update
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Monday</title>"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/news", "<title>Tuesday</title>".to_string()).await;

    {
        let mut coordinator =
            Coordinator::open(config.clone()).expect("Failed to open coordinator");
        coordinator.enqueue(&url).expect("Failed to enqueue");
        coordinator.run_batch().await.expect("Batch failed");

        let storage = open_storage(&config);
        let page = storage.get_page_by_url(&url).expect("Failed to read page");
        assert_eq!(page.expect("Page missing").title, "Monday");
    }

    {
        // A new process starts with an empty dedup set
        let mut coordinator =
            Coordinator::open(config.clone()).expect("Failed to open coordinator");
        coordinator.enqueue(&url).expect("Failed to enqueue");
        let report = coordinator.run_batch().await.expect("Batch failed");
        assert_eq!(report.already_crawled, 0);
    }

    let storage = open_storage(&config);
    assert_eq!(storage.count_pages().expect("Failed to count"), 1);
    assert_eq!(
        storage
            .get_page_by_url(&url)
            .expect("Failed to read page")
            .expect("Page missing")
            .title,
        "Tuesday"
    );
    assert_eq!(
        storage
            .count_queue_entries_for_url(&url)
            .expect("Failed to count"),
        2
    );
}

#[tokio::test]
async fn test_store_dedup_spans_runs() {
    let mock_server = MockServer::start().await;
    let url = format!("{}/static", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/static"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Static</title>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&dir);
    config.crawler.dedup = DedupMode::Store;

    for _ in 0..2 {
        let mut coordinator =
            Coordinator::open(config.clone()).expect("Failed to open coordinator");
        coordinator.enqueue(&url).expect("Failed to enqueue");
        let report = coordinator.run_batch().await.expect("Batch failed");
        assert_eq!(report.completed, 1);
    }
}

#[tokio::test]
async fn test_open_recovers_interrupted_entries() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&dir);

    let id = {
        let mut storage = open_storage(&config);
        let id = storage
            .insert_queue_entry("https://example.com/")
            .expect("Failed to insert");
        storage
            .transition_queue_entry(id, QueueStatus::Pending, QueueStatus::Processing)
            .expect("Failed to claim");
        id
    };

    let _coordinator = Coordinator::open(config.clone()).expect("Failed to open coordinator");

    let storage = open_storage(&config);
    assert_eq!(
        storage.get_queue_entry(id).expect("Failed to read").status,
        QueueStatus::Pending
    );
}

/// Drops the pages table behind the coordinator's back
fn drop_pages_table(config: &Config) {
    let conn = rusqlite::Connection::open(&config.storage.database_path)
        .expect("Failed to open second connection");
    conn.execute_batch("DROP TABLE pages;")
        .expect("Failed to drop pages");
}

#[tokio::test]
async fn test_storage_failure_releases_entry_and_stops_batch() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>text</p>"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&dir);

    let mut coordinator = Coordinator::open(config.clone()).expect("Failed to open coordinator");
    let first = coordinator
        .enqueue(&format!("{}/a", mock_server.uri()))
        .expect("Failed to enqueue");
    let second = coordinator
        .enqueue(&format!("{}/b", mock_server.uri()))
        .expect("Failed to enqueue");

    drop_pages_table(&config);

    assert!(coordinator.run_batch().await.is_err());

    let storage = open_storage(&config);
    assert_eq!(
        storage.get_queue_entry(first.entry_id).unwrap().status,
        QueueStatus::Pending
    );
    assert_eq!(
        storage.get_queue_entry(second.entry_id).unwrap().status,
        QueueStatus::Pending
    );

    // Only the first entry was fetched before the batch stopped
    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/a");
}

#[tokio::test]
async fn test_page_cap_check_failure_keeps_report() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&dir);

    let mut coordinator = Coordinator::open(config.clone()).expect("Failed to open coordinator");
    let outcome = coordinator
        .enqueue(&format!("{}/missing", mock_server.uri()))
        .expect("Failed to enqueue");

    drop_pages_table(&config);

    let report = coordinator.run_batch().await.expect("Batch failed");
    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);

    let storage = open_storage(&config);
    assert_eq!(
        storage.get_queue_entry(outcome.entry_id).unwrap().status,
        QueueStatus::Failed
    );
}
