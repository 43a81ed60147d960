//! HTTP route handlers
//!
//! Handlers keep storage locks inside synchronous helpers so no lock guard
//! is held across an `.await`.

use crate::crawler::{enqueue, seed_queue};
use crate::output::{load_statistics, IndexStatistics};
use crate::search::{search, SearchResult};
use crate::server::AppState;
use crate::storage::{self, SharedStorage, Storage};
use crate::SiftError;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Number of pages listed by `GET /api/pages`
pub const RECENT_PAGES_LIMIT: usize = 50;

/// Error body returned by every failing route
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    fn internal(context: &str, error: SiftError) -> Self {
        tracing::error!("{}: {}", context, error);
        Self::Internal(format!("{}: {}", context, error))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total: usize,
}

#[derive(Deserialize)]
pub struct CrawlRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Serialize)]
pub struct CrawlResponse {
    pub message: String,
    pub url: String,
}

#[derive(Serialize)]
pub struct StartCrawlResponse {
    pub message: String,
    pub crawled_count: usize,
}

#[derive(Serialize)]
pub struct RecentPage {
    pub url: String,
    pub title: String,
    pub crawled_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct InitResponse {
    pub message: String,
    pub seeded: usize,
}

fn with_storage<T>(
    storage: &SharedStorage,
    f: impl FnOnce(&mut dyn Storage) -> Result<T, SiftError>,
) -> Result<T, SiftError> {
    let mut guard = storage::lock(storage)?;
    f(&mut *guard)
}

/// `GET /api/search?q=&limit=`
pub async fn handle_search(
    Query(params): Query<SearchParams>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<SearchResponse>, ApiError> {
    let limit = params.limit.unwrap_or(state.default_limit);

    let results = with_storage(&state.storage, |storage| {
        search(storage, &params.q, limit)
    })
    .map_err(|e| ApiError::internal("Search error", e))?;

    Ok(Json(SearchResponse {
        query: params.q,
        total: results.len(),
        results,
    }))
}

/// `POST /api/crawl`
pub async fn handle_enqueue(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<CrawlRequest>,
) -> Result<Json<CrawlResponse>, ApiError> {
    let outcome = with_storage(&state.storage, |storage| enqueue(storage, &request.url))
        .map_err(|e| match e {
            SiftError::UrlError(e) => ApiError::BadRequest(format!("Invalid URL: {}", e)),
            e => ApiError::internal("Database error", e),
        })?;

    let message = if outcome.created {
        "URL added to crawl queue"
    } else {
        "URL already in crawl queue"
    };

    Ok(Json(CrawlResponse {
        message: message.to_string(),
        url: outcome.url,
    }))
}

/// `POST /api/crawl/start`
pub async fn handle_start_crawl(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<StartCrawlResponse>, ApiError> {
    let mut coordinator = state.coordinator.lock().await;
    let report = coordinator
        .run_batch()
        .await
        .map_err(|e| ApiError::internal("Crawling error", e))?;

    Ok(Json(StartCrawlResponse {
        message: format!("Crawled {} pages", report.completed),
        crawled_count: report.completed,
    }))
}

/// `GET /api/stats`
pub async fn handle_stats(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<IndexStatistics>, ApiError> {
    let stats = with_storage(&state.storage, |storage| load_statistics(storage))
        .map_err(|e| ApiError::internal("Stats error", e))?;
    Ok(Json(stats))
}

/// `GET /api/pages`
pub async fn handle_recent_pages(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<RecentPage>>, ApiError> {
    let pages = with_storage(&state.storage, |storage| {
        Ok(storage.list_recent_pages(RECENT_PAGES_LIMIT)?)
    })
    .map_err(|e| ApiError::internal("Pages error", e))?;

    Ok(Json(
        pages
            .into_iter()
            .map(|page| RecentPage {
                url: page.url,
                title: page.title,
                crawled_at: page.crawled_at,
            })
            .collect(),
    ))
}

/// `POST /api/init`
pub async fn handle_init(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<InitResponse>, ApiError> {
    let seeded = with_storage(&state.storage, |storage| seed_queue(storage, &state.seeds))
        .map_err(|e| ApiError::internal("Initialization error", e))?;

    Ok(Json(InitResponse {
        message: "Crawl queue seeded".to_string(),
        seeded,
    }))
}
