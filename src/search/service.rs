//! Map markers, polygons and land/area details.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::error::{ApiError, ApiResult};
use crate::store::{CountLandQuery, FullCodeLandQuery, Land, LandSearchQuery, LandStore};

use super::area::{AreaDetailResponse, ElectricityCostInfo, EmergencyTextInfo, PopulationInfo};
use super::dto::{
    LandDetailResponse, LandFilterRequest, LandMarkerResponse, MapSearchParams, PolygonDataResponse,
};
use super::ranges::{sig_prefix, validate_full_code, LandDataRangeService};
use super::types::{sig_code_of, MarkerType, ZoomLevel};

/// Parse a land id path segment.
pub fn parse_land_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("유효하지 않은 토지 ID 입니다: {}", raw)))
}

/// Map markers, polygons and land or region details over a [`LandStore`].
///
/// Markers are grouped per region above the land zoom level and capped at
/// `land_marker_limit` individual lands below it.
pub struct MapSearchService {
    store: Arc<dyn LandStore>,
    ranges: Arc<LandDataRangeService>,
    land_marker_limit: i64,
}

impl MapSearchService {
    pub fn new(
        store: Arc<dyn LandStore>,
        ranges: Arc<LandDataRangeService>,
        land_marker_limit: i64,
    ) -> Self {
        Self {
            store,
            ranges,
            land_marker_limit,
        }
    }

    /// Region group markers, or land markers at the closest zoom levels.
    #[instrument(skip(self, params), fields(zoom = params.zoom_level))]
    pub async fn land_group_markers(
        &self,
        params: &MapSearchParams,
    ) -> ApiResult<Vec<LandMarkerResponse>> {
        let zoom = ZoomLevel::from_zoom(params.zoom_level)?;
        let request = params.filter()?;
        let filter = self
            .ranges
            .filter_with_defaults(
                request.land_area,
                request.official_land_price,
                request.use_zone_categories,
            )
            .await?;
        let bounds = params.bounds();

        let Some(region_type) = zoom.region_type() else {
            let lands = self
                .store
                .find_lands(&LandSearchQuery {
                    bounds: Some(bounds),
                    filter,
                    limit: Some(self.land_marker_limit),
                })
                .await?;
            debug!(count = lands.len(), "Land markers");

            return Ok(lands
                .into_iter()
                .map(|land| LandMarkerResponse {
                    id: land.id.to_string(),
                    name: land.address,
                    count: None,
                    point: land.center_point,
                    marker_type: MarkerType::Land,
                })
                .collect());
        };

        let regions = self
            .store
            .find_regions_in_bounds(region_type, bounds)
            .await?;
        if regions.is_empty() {
            return Ok(Vec::new());
        }

        let mut prefixes: Vec<String> = regions
            .iter()
            .map(|r| region_type.prefix_of(&r.full_code).to_string())
            .collect();
        prefixes.sort_unstable();
        prefixes.dedup();

        let counts: HashMap<String, i64> = self
            .store
            .count_lands_by_regions(&CountLandQuery {
                full_code_prefixes: prefixes,
                filter,
            })
            .await?;
        debug!(regions = regions.len(), %region_type, "Group markers");

        Ok(regions
            .into_iter()
            .map(|region| {
                let count = counts
                    .get(region_type.prefix_of(&region.full_code))
                    .copied()
                    .unwrap_or(0);
                LandMarkerResponse {
                    name: Some(region.simple_name().to_string()),
                    count: Some(count),
                    point: region.center_point,
                    marker_type: MarkerType::Group,
                    id: region.full_code,
                }
            })
            .collect())
    }

    /// Boundary of a region (`GROUP`) or a land (`LAND`).
    #[instrument(skip(self))]
    pub async fn polygon(&self, polygon_type: &str, id: &str) -> ApiResult<PolygonDataResponse> {
        let polygon = match polygon_type.parse::<MarkerType>() {
            Ok(MarkerType::Group) => {
                self.store
                    .find_region_polygon(validate_full_code(id)?)
                    .await?
            }
            Ok(MarkerType::Land) => self.store.find_land_polygon(parse_land_id(id)?).await?,
            Err(_) => {
                return Err(ApiError::bad_request(format!(
                    "유효하지 않은 폴리곤 타입 입니다: {}",
                    polygon_type
                )))
            }
        };
        Ok(PolygonDataResponse { polygon })
    }

    #[instrument(skip(self))]
    pub async fn land_detail(&self, land_id: i64) -> ApiResult<LandDetailResponse> {
        self.store
            .find_land(land_id)
            .await?
            .map(LandDetailResponse::from)
            .ok_or_else(|| land_not_found(land_id))
    }

    /// Facts about the SIG region containing a land.
    #[instrument(skip(self))]
    pub async fn area_detail(&self, land_id: i64) -> ApiResult<AreaDetailResponse> {
        let land = self
            .store
            .find_land(land_id)
            .await?
            .ok_or_else(|| land_not_found(land_id))?;

        let prefix = sig_prefix(&land.full_code)?.to_string();
        let mut detail = self.area_detail_by_prefix(&prefix).await?;
        detail.full_code = land.full_code;
        Ok(detail)
    }

    /// Facts about the SIG region with the given 5 digit prefix.
    #[instrument(skip(self))]
    pub async fn area_detail_by_prefix(&self, prefix: &str) -> ApiResult<AreaDetailResponse> {
        let prefix = sig_prefix(prefix)?;
        let sig_code = sig_code_of(prefix);

        let region = self.store.find_region(&sig_code).await?.ok_or_else(|| {
            ApiError::not_found(format!("행정구역을 찾을 수 없습니다: {}", sig_code))
        })?;

        let electricity = self.store.latest_electricity_cost(&sig_code).await?;
        let disasters = self.store.find_disasters(&sig_code).await?;
        let population = self.store.aggregate_population(prefix).await?;

        Ok(AreaDetailResponse {
            full_code: sig_code,
            address: region.korean_name,
            electricity_cost_info: ElectricityCostInfo::from_cost(electricity),
            emergency_text_info: EmergencyTextInfo::from_disasters(&disasters),
            population_info: PopulationInfo::from_aggregate(population),
        })
    }

    /// Every matching land whose region code starts with `full_code`.
    #[instrument(skip(self, request))]
    pub async fn lands_by_full_code(
        &self,
        full_code: &str,
        request: LandFilterRequest,
    ) -> ApiResult<Vec<Land>> {
        let full_code = validate_full_code(full_code)?;
        let filter = self
            .ranges
            .filter_with_defaults(
                request.land_area,
                request.official_land_price,
                request.use_zone_categories,
            )
            .await?;

        let lands = self
            .store
            .find_lands_by_full_code(&FullCodeLandQuery {
                full_code: full_code.to_string(),
                filter,
            })
            .await?;
        info!(full_code, count = lands.len(), "Lands found by region code");
        Ok(lands)
    }
}

fn land_not_found(land_id: i64) -> ApiError {
    ApiError::not_found(format!("토지를 찾을 수 없습니다: {}", land_id))
}
