//! HTTP API route definitions.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::metrics::record_http_latency;

use super::docs::swagger_ui;
use super::handlers::{health, metrics, ready, AppState};
use super::{analysis, search};

pub const ANALYZE_PATH: &str = "/api/v1/land-analysis/analyze";

async fn track_latency(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());
    let start = Instant::now();
    let response = next.run(request).await;
    record_http_latency(start, &endpoint);
    response
}

fn base_info_routes() -> Router<AppState> {
    Router::new()
        .route("/land-area-range", get(search::land_area_range))
        .route(
            "/official-land-price-range",
            get(search::official_land_price_range),
        )
        .route("/use-zone-categories", get(search::use_zone_categories))
        .route("/electric-bill-range", get(search::electric_bill_range))
        .route("/substation-count-range", get(search::substation_count_range))
        .route(
            "/transmission-tower-count-range",
            get(search::transmission_tower_count_range),
        )
        .route(
            "/transmission-line-count-range",
            get(search::transmission_line_count_range),
        )
        .route("/disaster-count-range", get(search::disaster_count_range))
        .route("/regions", get(search::regions))
        .route(
            "/regions/:full_code/land-area-range",
            get(search::region_land_area_range),
        )
        .route(
            "/regions/:full_code/official-land-price-range",
            get(search::region_official_land_price_range),
        )
        .route("/regions/:full_code/land-count", get(search::region_land_count))
}

fn land_search_routes() -> Router<AppState> {
    Router::new()
        .route("/points", get(search::land_points))
        .route("/polygon/:id", get(search::polygon))
        .route("/land/:land_id", get(search::land_detail))
        .route("/area/:land_id", get(search::area_detail))
}

/// Create the API router. The analysis endpoint is mounted under
/// `base_path`, everything else at the root.
pub fn create_router(state: AppState, base_path: &str) -> Router {
    let analysis_routes = Router::new().route(ANALYZE_PATH, post(analysis::analyze));
    let analysis_routes = if base_path.is_empty() {
        analysis_routes
    } else {
        Router::new().nest(base_path, analysis_routes)
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
        .nest("/api/v1/base-info", base_info_routes())
        .nest("/api/v1/land-search", land_search_routes())
        .merge(analysis_routes)
        .merge(swagger_ui(base_path))
        .layer(middleware::from_fn(track_latency))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
