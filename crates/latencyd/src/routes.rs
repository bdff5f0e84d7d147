//! API routes for latencyd
//!
//! POST `/` and `/api` aggregate regions; GET on the same paths reports
//! service status. OPTIONS preflights are answered by the CORS layer.

use crate::metrics::OUTCOME_INVALID;
use crate::server::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use latency_common::{
    aggregate, AggregateRequest, AggregateResponse, ErrorResponse, HealthResponse,
    RequestValidationError, StatusResponse,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

type AppStateArc = Arc<AppState>;

/// Rejected request, answered with 400 and `{"error": ...}`
#[derive(Debug)]
pub struct InvalidRequest(pub RequestValidationError);

impl IntoResponse for InvalidRequest {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

// ============================================================================
// Aggregate Routes
// ============================================================================

pub fn aggregate_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/", get(service_status).post(aggregate_regions))
        .route("/api", get(service_status).post(aggregate_regions))
}

async fn aggregate_regions(
    State(state): State<AppStateArc>,
    body: Bytes,
) -> Result<Json<AggregateResponse>, InvalidRequest> {
    let request = AggregateRequest::from_slice(&body).map_err(|e| {
        warn!("  Rejected aggregate request: {}", e);
        state.metrics.record_request(OUTCOME_INVALID);
        InvalidRequest(e)
    })?;

    let threshold_ms = request.threshold_or(state.default_threshold_ms);
    let started = Instant::now();
    let results = aggregate(&state.store, request.regions.as_slice(), threshold_ms);
    state
        .metrics
        .record_aggregation(results.len(), started.elapsed().as_secs_f64());

    debug!(
        "  Aggregated {} regions (threshold {} ms)",
        results.len(),
        threshold_ms
    );
    Ok(Json(results))
}

async fn service_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        message: "POST JSON to / or /api".to_string(),
    })
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at,
        uptime_seconds: state.start_time.elapsed().as_secs(),
        records: state.store.len(),
        regions: state.store.regions().count(),
    })
}

// ============================================================================
// Metrics Routes
// ============================================================================

pub fn metrics_routes() -> Router<AppStateArc> {
    Router::new().route("/metrics", get(export_metrics))
}

async fn export_metrics(State(state): State<AppStateArc>) -> Response {
    match state.metrics.export() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!("  Metrics export failed: {}", e);
            let body = ErrorResponse {
                error: "metrics export failed".to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
