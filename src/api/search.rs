//! Base info and land search endpoints.

use axum::extract::State;

use crate::search::dto::{
    FullCodeParams, LandCountParams, LandCountResponse, LandDetailResponse, LandMarkerResponse,
    MapSearchParams, PolygonDataResponse, PolygonParams, UseZoneCategoryResponse,
};
use crate::search::ranges::RegionResponse;
use crate::search::service::parse_land_id;
use crate::search::{AreaDetailResponse, UseZoneCategory};
use crate::store::LongRange;

use super::handlers::AppState;
use super::response::{ok, ApiPath, ApiQuery, ApiResponse, BaseApiResponse};

#[utoipa::path(
    get,
    path = "/api/v1/base-info/land-area-range",
    tag = "base-info",
    responses((status = 200, body = BaseApiResponse<LongRange>))
)]
pub async fn land_area_range(State(state): State<AppState>) -> ApiResponse<LongRange> {
    ok(state.ranges.land_area_range().await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/base-info/official-land-price-range",
    tag = "base-info",
    responses((status = 200, body = BaseApiResponse<LongRange>))
)]
pub async fn official_land_price_range(State(state): State<AppState>) -> ApiResponse<LongRange> {
    ok(state.ranges.official_land_price_range().await?)
}

/// Categories offered in the search filter.
#[utoipa::path(
    get,
    path = "/api/v1/base-info/use-zone-categories",
    tag = "base-info",
    responses((status = 200, body = BaseApiResponse<Vec<UseZoneCategoryResponse>>))
)]
pub async fn use_zone_categories() -> ApiResponse<Vec<UseZoneCategoryResponse>> {
    ok(UseZoneCategory::enterprise_fit()
        .into_iter()
        .map(UseZoneCategoryResponse::from)
        .collect())
}

/// Global tariff range, or the tariff of one region.
#[utoipa::path(
    get,
    path = "/api/v1/base-info/electric-bill-range",
    tag = "base-info",
    params(FullCodeParams),
    responses(
        (status = 200, body = BaseApiResponse<LongRange>),
        (status = 404, description = "No tariff for the region")
    )
)]
pub async fn electric_bill_range(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<FullCodeParams>,
) -> ApiResponse<LongRange> {
    ok(state
        .ranges
        .electric_bill_range(params.full_code.as_deref())
        .await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/base-info/substation-count-range",
    tag = "base-info",
    responses((status = 200, body = BaseApiResponse<LongRange>))
)]
pub async fn substation_count_range(State(state): State<AppState>) -> ApiResponse<LongRange> {
    ok(state.ranges.substation_count_range().await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/base-info/transmission-tower-count-range",
    tag = "base-info",
    responses((status = 200, body = BaseApiResponse<LongRange>))
)]
pub async fn transmission_tower_count_range(
    State(state): State<AppState>,
) -> ApiResponse<LongRange> {
    ok(state.ranges.transmission_tower_count_range().await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/base-info/transmission-line-count-range",
    tag = "base-info",
    responses((status = 200, body = BaseApiResponse<LongRange>))
)]
pub async fn transmission_line_count_range(
    State(state): State<AppState>,
) -> ApiResponse<LongRange> {
    ok(state.ranges.transmission_line_count_range().await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/base-info/disaster-count-range",
    tag = "base-info",
    responses((status = 200, body = BaseApiResponse<LongRange>))
)]
pub async fn disaster_count_range(State(state): State<AppState>) -> ApiResponse<LongRange> {
    ok(state.ranges.disaster_count_range().await?)
}

/// Provinces, or the children of `fullCode`.
#[utoipa::path(
    get,
    path = "/api/v1/base-info/regions",
    tag = "base-info",
    params(FullCodeParams),
    responses((status = 200, body = BaseApiResponse<Vec<RegionResponse>>))
)]
pub async fn regions(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<FullCodeParams>,
) -> ApiResponse<Vec<RegionResponse>> {
    ok(state.ranges.regions(params.full_code.as_deref()).await?)
}

/// Land area range of a region in 500 ㎡ buckets.
#[utoipa::path(
    get,
    path = "/api/v1/base-info/regions/{fullCode}/land-area-range",
    tag = "base-info",
    params(("fullCode" = String, Path, example = "5173000000")),
    responses(
        (status = 200, body = BaseApiResponse<LongRange>),
        (status = 404, description = "No lands in the region")
    )
)]
pub async fn region_land_area_range(
    State(state): State<AppState>,
    ApiPath(full_code): ApiPath<String>,
) -> ApiResponse<LongRange> {
    ok(state.ranges.land_area_range_by_region(&full_code).await?)
}

/// Official land price range of a region in 500 000 won buckets.
#[utoipa::path(
    get,
    path = "/api/v1/base-info/regions/{fullCode}/official-land-price-range",
    tag = "base-info",
    params(("fullCode" = String, Path, example = "5173000000")),
    responses(
        (status = 200, body = BaseApiResponse<LongRange>),
        (status = 404, description = "No lands in the region")
    )
)]
pub async fn region_official_land_price_range(
    State(state): State<AppState>,
    ApiPath(full_code): ApiPath<String>,
) -> ApiResponse<LongRange> {
    ok(state
        .ranges
        .official_land_price_range_by_region(&full_code)
        .await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/base-info/regions/{fullCode}/land-count",
    tag = "base-info",
    params(("fullCode" = String, Path, example = "5173000000"), LandCountParams),
    responses((status = 200, body = BaseApiResponse<LandCountResponse>))
)]
pub async fn region_land_count(
    State(state): State<AppState>,
    ApiPath(full_code): ApiPath<String>,
    ApiQuery(params): ApiQuery<LandCountParams>,
) -> ApiResponse<LandCountResponse> {
    let count = state
        .ranges
        .count_lands_by_full_code(
            &full_code,
            params.category()?,
            params.land_area(),
            params.official_land_price(),
        )
        .await?;
    ok(LandCountResponse { full_code, count })
}

/// Markers inside the viewport.
#[utoipa::path(
    get,
    path = "/api/v1/land-search/points",
    tag = "land-search",
    params(MapSearchParams),
    responses(
        (status = 200, body = BaseApiResponse<Vec<LandMarkerResponse>>),
        (status = 400, description = "Invalid zoom level or category")
    )
)]
pub async fn land_points(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<MapSearchParams>,
) -> ApiResponse<Vec<LandMarkerResponse>> {
    ok(state.search.land_group_markers(&params).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/land-search/polygon/{id}",
    tag = "land-search",
    params(("id" = String, Path, description = "Region code or land id"), PolygonParams),
    responses(
        (status = 200, body = BaseApiResponse<PolygonDataResponse>),
        (status = 400, description = "Invalid polygon type")
    )
)]
pub async fn polygon(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(params): ApiQuery<PolygonParams>,
) -> ApiResponse<PolygonDataResponse> {
    ok(state.search.polygon(&params.polygon_type, &id).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/land-search/land/{landId}",
    tag = "land-search",
    params(("landId" = String, Path)),
    responses(
        (status = 200, body = BaseApiResponse<LandDetailResponse>),
        (status = 404, description = "Unknown land")
    )
)]
pub async fn land_detail(
    State(state): State<AppState>,
    ApiPath(land_id): ApiPath<String>,
) -> ApiResponse<LandDetailResponse> {
    ok(state.search.land_detail(parse_land_id(&land_id)?).await?)
}

/// Electricity, disaster and population facts of the land's region.
#[utoipa::path(
    get,
    path = "/api/v1/land-search/area/{landId}",
    tag = "land-search",
    params(("landId" = String, Path)),
    responses(
        (status = 200, body = BaseApiResponse<AreaDetailResponse>),
        (status = 404, description = "Unknown land or region")
    )
)]
pub async fn area_detail(
    State(state): State<AppState>,
    ApiPath(land_id): ApiPath<String>,
) -> ApiResponse<AreaDetailResponse> {
    ok(state.search.area_detail(parse_land_id(&land_id)?).await?)
}
