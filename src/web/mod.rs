//! HTTP front end for the claim predictor

pub mod page;
pub mod routes;

use crate::collector::InputCollector;
use crate::config::AppConfig;
use crate::metrics::PredictionMetrics;
use crate::models::PredictionAdapter;
use crate::report::ReportViewer;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<PredictionAdapter>,
    pub collector: Arc<InputCollector>,
    pub report: Arc<ReportViewer>,
    pub metrics: Arc<PredictionMetrics>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, adapter: PredictionAdapter, metrics: Arc<PredictionMetrics>) -> Self {
        Self {
            adapter: Arc::new(adapter),
            collector: Arc::new(InputCollector::default()),
            report: Arc::new(ReportViewer::new(&config.report.images_dir)),
            metrics,
            config: Arc::new(config),
        }
    }
}

/// Build the router with all routes and middleware
pub fn router(state: AppState) -> Router {
    let upload_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(routes::index))
        .route("/predict", post(routes::predict))
        .route("/batch", post(routes::upload_batch))
        .route("/report/:file", get(routes::report_image))
        // Health endpoints
        .route("/health", get(routes::liveness))
        .route("/health/live", get(routes::liveness))
        .route("/metrics", get(routes::metrics))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
        .parse()
        .context("Invalid server host/port configuration")?;

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("claim-predictor v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("HTTP server failed")
}
