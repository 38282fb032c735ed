//! # litscreen HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /screen` - Merge, screen and tally a batch of records
//! - `POST /title-filter` - Apply the title exclusion filter
//!
//! The engine is synchronous; handlers run it on the blocking pool.

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `litscreen::api::*`)
pub use handlers::{health_handler, screen_handler, title_filter_handler};
pub use types::{
    AbstractTables, ErrorResponse, HealthResponse, MAX_REQUEST_RECORDS, RemovedRecord,
    ScreenRequest, TitleFilterRequest, TitleFilterResponse,
};

use crate::store::LocalAbstractStore;
use axum::{
    Router,
    routing::{get, post},
};
use litscreen_core::{ScreenError, ScreeningConfig, TitleFilter};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Request body limit (16 MiB).
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared, read-only server state.
#[derive(Clone)]
pub struct AppState {
    /// Screening switches used when a request leaves them unset.
    pub defaults: ScreeningConfig,
    /// Whether the rescue pass runs when a request leaves it unset.
    pub rescue: bool,
    /// Abstracts available to every request.
    pub store: Arc<LocalAbstractStore>,
    pub title_filter: Arc<TitleFilter>,
}

impl AppState {
    pub fn new(
        defaults: ScreeningConfig,
        rescue: bool,
        store: LocalAbstractStore,
    ) -> Result<Self, ScreenError> {
        Ok(Self {
            defaults,
            rescue,
            store: Arc::new(store),
            title_filter: Arc::new(TitleFilter::new()?),
        })
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/screen", post(handlers::screen_handler))
        .route("/title-filter", post(handlers::title_filter_handler))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), ScreenError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ScreenError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("litscreen HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ScreenError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
