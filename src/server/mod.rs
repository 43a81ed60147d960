//! HTTP API module
//!
//! Exposes search, crawl queue, and statistics operations as JSON routes.

mod handlers;

pub use handlers::{ApiError, RECENT_PAGES_LIMIT};

use crate::config::Config;
use crate::crawler::Coordinator;
use crate::storage::SharedStorage;
use crate::Result;
use axum::routing::{get, post};
use axum::{Extension, Router};
use handlers::{
    handle_enqueue, handle_init, handle_recent_pages, handle_search, handle_start_crawl,
    handle_stats,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// State shared by every route
pub struct AppState {
    /// Serializes crawl batches; the dedup set lives inside
    pub coordinator: Mutex<Coordinator>,
    pub storage: SharedStorage,
    pub default_limit: usize,
    pub seeds: Vec<String>,
}

impl AppState {
    pub fn new(coordinator: Coordinator) -> Self {
        let storage = coordinator.storage();
        let default_limit = coordinator.config().search.default_limit;
        let seeds = coordinator.config().crawler.seeds.clone();

        Self {
            coordinator: Mutex::new(coordinator),
            storage,
            default_limit,
            seeds,
        }
    }
}

/// Builds the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/search", get(handle_search))
        .route("/api/crawl", post(handle_enqueue))
        .route("/api/crawl/start", post(handle_start_crawl))
        .route("/api/stats", get(handle_stats))
        .route("/api/pages", get(handle_recent_pages))
        .route("/api/init", post(handle_init))
        .layer(Extension(state))
}

/// Opens storage, runs the startup phase, and serves the API until shutdown
pub async fn serve(config: Config) -> Result<()> {
    let bind_address = config.server.bind_address.clone();
    let coordinator = Coordinator::open(config)?;
    let app = router(Arc::new(AppState::new(coordinator)));

    let listener = TcpListener::bind(bind_address.as_str()).await?;
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
