//! Integration tests for the HTTP API
//!
//! Each test serves the router on an ephemeral port and talks to it with
//! reqwest, crawling pages from a wiremock server.

use pagesift::config::Config;
use pagesift::crawler::Coordinator;
use pagesift::server::{router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApi {
    base_url: String,
    client: reqwest::Client,
    _dir: TempDir,
}

impl TestApi {
    async fn start(seeds: Vec<String>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.crawler.request_delay_ms = 0;
        config.crawler.request_timeout_secs = 2;
        config.crawler.seeds = seeds;
        config.storage.database_path = dir
            .path()
            .join("api.db")
            .to_string_lossy()
            .into_owned();

        let coordinator = Coordinator::open(config).expect("Failed to open coordinator");
        let app = router(Arc::new(AppState::new(coordinator)));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to read address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
            _dir: dir,
        }
    }

    async fn get(&self, route: &str) -> (u16, Value) {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, route))
            .send()
            .await
            .expect("Request failed");
        let status = response.status().as_u16();
        (status, response.json().await.expect("Body is not JSON"))
    }

    async fn post(&self, route: &str, body: Value) -> (u16, Value) {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, route))
            .json(&body)
            .send()
            .await
            .expect("Request failed");
        let status = response.status().as_u16();
        (status, response.json().await.expect("Body is not JSON"))
    }
}

async fn mount_page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_enqueue_crawl_and_search() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/python",
        r#"<html><head><title>Python Tutorial</title></head>
        <body>python python python python code</body></html>"#,
    )
    .await;

    let api = TestApi::start(vec![]).await;
    let url = format!("{}/python", mock_server.uri());

    let (status, body) = api.post("/api/crawl", json!({ "url": url })).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "URL added to crawl queue");
    assert_eq!(body["url"], url);

    let (status, body) = api.post("/api/crawl/start", json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["crawled_count"], 1);
    assert_eq!(body["message"], "Crawled 1 pages");

    let (status, body) = api.get("/api/search?q=python").await;
    assert_eq!(status, 200);
    assert_eq!(body["query"], "python");
    assert_eq!(body["total"], 1);

    let result = &body["results"][0];
    assert_eq!(result["url"], url);
    assert_eq!(result["title"], "Python Tutorial");
    assert!(result["score"].as_u64().expect("score is a number") > 0);
    assert!(result["snippet"]
        .as_str()
        .expect("snippet is a string")
        .ends_with("..."));
    assert!(result["crawled_at"].is_string());
}

#[tokio::test]
async fn test_enqueue_rejects_invalid_url() {
    let api = TestApi::start(vec![]).await;

    let (status, body) = api.post("/api/crawl", json!({ "url": "not a url" })).await;
    assert_eq!(status, 400);
    assert!(body["error"]
        .as_str()
        .expect("error is a string")
        .starts_with("Invalid URL"));

    let (status, body) = api
        .post("/api/crawl", json!({ "url": "ftp://example.com/" }))
        .await;
    assert_eq!(status, 400);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_enqueue_twice_is_idempotent() {
    let api = TestApi::start(vec![]).await;
    let body = json!({ "url": "https://example.com/" });

    let (first, _) = api.post("/api/crawl", body.clone()).await;
    let (second, response) = api.post("/api/crawl", body).await;
    assert_eq!(first, 200);
    assert_eq!(second, 200);
    assert_eq!(response["url"], "https://example.com/");

    let (_, stats) = api.get("/api/stats").await;
    assert_eq!(stats["pending_crawls"], 1);
}

#[tokio::test]
async fn test_blank_search() {
    let api = TestApi::start(vec![]).await;

    let (status, body) = api.get("/api/search?q=%20%20").await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 0);
    assert_eq!(body["results"], json!([]));

    let (status, body) = api.get("/api/search").await;
    assert_eq!(status, 200);
    assert_eq!(body["query"], "");
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_search_limit() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>shared term</p>"))
        .mount(&mock_server)
        .await;

    let api = TestApi::start(vec![]).await;
    for i in 0..3 {
        api.post(
            "/api/crawl",
            json!({ "url": format!("{}/doc{}", mock_server.uri(), i) }),
        )
        .await;
    }
    api.post("/api/crawl/start", json!({})).await;

    let (_, body) = api.get("/api/search?q=shared&limit=2").await;
    assert_eq!(body["total"], 2);

    let (_, body) = api.get("/api/search?q=shared").await;
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn test_stats_and_pages() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/ok", "<title>Fine</title>").await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let api = TestApi::start(vec![]).await;

    let (_, stats) = api.get("/api/stats").await;
    assert_eq!(
        stats,
        json!({
            "total_indexed_pages": 0,
            "pending_crawls": 0,
            "processing_crawls": 0,
            "completed_crawls": 0,
            "failed_crawls": 0
        })
    );

    for route in ["/ok", "/down"] {
        api.post(
            "/api/crawl",
            json!({ "url": format!("{}{}", mock_server.uri(), route) }),
        )
        .await;
    }
    let (_, body) = api.post("/api/crawl/start", json!({})).await;
    assert_eq!(body["crawled_count"], 1);

    let (_, stats) = api.get("/api/stats").await;
    assert_eq!(stats["total_indexed_pages"], 1);
    assert_eq!(stats["completed_crawls"], 1);
    assert_eq!(stats["failed_crawls"], 1);
    assert_eq!(stats["pending_crawls"], 0);

    let (status, pages) = api.get("/api/pages").await;
    assert_eq!(status, 200);
    let pages = pages.as_array().expect("pages is an array");
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0]["title"], "Fine");
    assert!(pages[0]["crawled_at"].is_string());
}

#[tokio::test]
async fn test_init_seeds_queue_once() {
    let api = TestApi::start(vec![
        "https://example.com".to_string(),
        "https://quotes.toscrape.com/".to_string(),
    ])
    .await;

    let (status, body) = api.post("/api/init", json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["seeded"], 2);

    let (_, body) = api.post("/api/init", json!({})).await;
    assert_eq!(body["seeded"], 0);

    let (_, stats) = api.get("/api/stats").await;
    assert_eq!(stats["pending_crawls"], 2);
}
