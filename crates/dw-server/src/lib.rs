//! HTTP service exposing the ingestion endpoint and aggregate queries.
//!
//! Route wiring only; the aggregation semantics live in `dw-core` and the
//! persistence in `dw-db`. The record store is shared behind an async mutex
//! since `rusqlite::Connection` is `Send` but not `Sync`.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use dw_db::RecordStore;

pub mod auth;
pub mod routes;

pub use auth::{StaticTokens, TokenValidator};

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<RecordStore>>,
    pub tokens: Arc<dyn TokenValidator>,
}

impl AppState {
    #[must_use]
    pub fn new(store: RecordStore, tokens: impl TokenValidator + 'static) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            tokens: Arc::new(tokens),
        }
    }
}

/// Builds the application router.
///
/// CORS is permissive: the ingestion endpoint is called from browser
/// extension contexts and the demo endpoints from the dashboard origin.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/time-tracking", post(routes::ingest))
        .route("/api/analytics", get(routes::personal))
        .route("/api/analytics/daily", get(routes::daily))
        .route("/api/analytics/weekly", get(routes::weekly))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
