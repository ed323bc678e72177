//! Shared state and the operational endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::analysis::LandAnalysisService;
use crate::config::Config;
use crate::search::{LandDataRangeService, MapSearchService};
use crate::store::LandStore;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LandStore>,
    pub ranges: Arc<LandDataRangeService>,
    pub search: Arc<MapSearchService>,
    pub analysis: Arc<LandAnalysisService>,
    /// Prometheus renderer, `None` when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the services over one store.
    pub fn new(store: Arc<dyn LandStore>, config: &Config) -> Self {
        let ranges = Arc::new(LandDataRangeService::new(
            Arc::clone(&store),
            Duration::from_secs(config.range_cache_ttl_seconds),
        ));
        let search = Arc::new(MapSearchService::new(
            Arc::clone(&store),
            Arc::clone(&ranges),
            config.land_marker_limit,
        ));
        let analysis = Arc::new(LandAnalysisService::new(
            Arc::clone(&store),
            Arc::clone(&search),
            Arc::clone(&ranges),
        ));

        Self {
            store,
            ranges,
            search,
            analysis,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "ok".
    pub status: String,
}

/// Readiness check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    pub ready: bool,
    /// "up" or "down".
    pub database: String,
}

/// Health check handler - always returns 200.
#[utoipa::path(
    get,
    path = "/health",
    tag = "ops",
    responses((status = 200, body = HealthResponse))
)]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness check handler - 200 when the database answers, 503 otherwise.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "ops",
    responses(
        (status = 200, body = ReadyResponse),
        (status = 503, body = ReadyResponse)
    )
)]
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                database: "up".to_string(),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    ready: false,
                    database: "down".to_string(),
                }),
            )
        }
    }
}

/// Prometheus text exposition.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "ops",
    responses(
        (status = 200, body = String, content_type = "text/plain"),
        (status = 503, description = "No recorder installed")
    )
)]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
