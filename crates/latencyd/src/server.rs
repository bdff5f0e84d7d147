//! HTTP server for latencyd

use crate::config::{Config, CorsConfig};
use crate::metrics::ServiceMetrics;
use crate::routes;
use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use latency_common::TelemetryStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<TelemetryStore>,
    pub metrics: ServiceMetrics,
    /// Threshold for requests that omit `threshold_ms`
    pub default_threshold_ms: f64,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: TelemetryStore, default_threshold_ms: f64) -> Result<Self> {
        let metrics = ServiceMetrics::new().context("failed to register metrics")?;
        metrics.set_dataset_records(store.len());
        Ok(Self {
            store: Arc::new(store),
            metrics,
            default_threshold_ms,
            start_time: Instant::now(),
            started_at: Utc::now(),
        })
    }
}

/// Build the CORS layer from config
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer> {
    let origins = if config.allow_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values = config
            .allow_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{}'", o))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age_secs)))
}

/// Assemble the application router
pub fn router(state: AppState, config: &Config) -> Result<Router> {
    let state = Arc::new(state);

    let app = Router::new()
        .merge(routes::aggregate_routes())
        .merge(routes::health_routes())
        .merge(routes::metrics_routes())
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
        .layer(cors_layer(&config.cors)?)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// Run the HTTP server until ctrl-c
pub async fn run(state: AppState, config: &Config) -> Result<()> {
    let addr = config.bind_addr()?;
    let app = router(state, config)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("  Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // without a signal handler the server runs until killed
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down gracefully");
}
