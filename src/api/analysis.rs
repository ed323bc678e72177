//! Land analysis endpoint.

use axum::extract::State;

use crate::analysis::{LandAnalysisRequest, LandScoreRankingResponse};

use super::handlers::AppState;
use super::response::{ok, ApiJson, ApiResponse, BaseApiResponse};

/// Score and rank candidate lands. Mounted under the configured base path.
#[utoipa::path(
    post,
    path = "/api/v1/land-analysis/analyze",
    tag = "land-analysis",
    request_body = LandAnalysisRequest,
    responses(
        (status = 200, body = BaseApiResponse<LandScoreRankingResponse>),
        (status = 400, description = "Neither fullCode nor starLandIds given, or an invalid id")
    )
)]
pub async fn analyze(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LandAnalysisRequest>,
) -> ApiResponse<LandScoreRankingResponse> {
    ok(state.analysis.analyze(&request).await?)
}
