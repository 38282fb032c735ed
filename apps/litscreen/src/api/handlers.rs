//! # API Endpoint Handlers

use super::{
    AppState,
    types::{
        ErrorResponse, HealthResponse, ScreenRequest, TitleFilterRequest, TitleFilterResponse,
    },
};
use crate::store::LocalAbstractStore;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use litscreen_core::{
    AbstractResolver, AbstractSources, FetchPolicy, Pipeline, ScreenError, ScreeningReport,
    primitives::MAX_BATCH_SIZE,
};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// SCREEN HANDLER
// =============================================================================

/// Run the full pipeline over the posted records.
pub async fn screen_handler(
    State(state): State<AppState>,
    Json(request): Json<ScreenRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return error_response(StatusCode::BAD_REQUEST, &e);
    }

    let result = tokio::task::spawn_blocking(move || run_screen(&state, request)).await;

    match result {
        Ok(Ok(report)) => {
            tracing::info!(
                identified = report.prisma.identified_raw_total,
                final_candidates = report.prisma.final_candidates,
                "Screen request complete"
            );
            (StatusCode::OK, Json(report)).into_response()
        }
        Ok(Err(e)) => error_response(StatusCode::BAD_REQUEST, &e),
        Err(e) => {
            tracing::error!("Screen task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Screening task failed")),
            )
                .into_response()
        }
    }
}

/// Build the per-request pipeline and run it.
///
/// Request abstracts are registered after the server store, so a kind
/// supplied in the request replaces the server's provider for that kind.
fn run_screen(state: &AppState, request: ScreenRequest) -> Result<ScreeningReport, ScreenError> {
    let config = request.config(state.defaults);
    let rescue = request.rescue.unwrap_or(state.rescue);
    let request_store = request
        .abstracts
        .map(LocalAbstractStore::from_tables)
        .unwrap_or_default();

    let mut sources = AbstractSources::new();
    state.store.register_into(&mut sources);
    request_store.register_into(&mut sources);

    // local stores need no pacing
    let resolver = AbstractResolver::new(sources, FetchPolicy::unpaced(MAX_BATCH_SIZE));
    let pipeline = Pipeline::new(config, resolver)?.with_rescue(rescue);
    Ok(pipeline.run(request.records))
}

// =============================================================================
// TITLE FILTER HANDLER
// =============================================================================

/// Apply the title exclusion filter to the posted records.
pub async fn title_filter_handler(
    State(state): State<AppState>,
    Json(request): Json<TitleFilterRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return error_response(StatusCode::BAD_REQUEST, &e);
    }

    let outcome = state
        .title_filter
        .apply(request.records, |r| r.title.as_str());
    (StatusCode::OK, Json(TitleFilterResponse::from(outcome))).into_response()
}

fn error_response(status: StatusCode, error: &ScreenError) -> Response {
    (status, Json(ErrorResponse::new(error.to_string()))).into_response()
}
