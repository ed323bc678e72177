//! Request parameters and response bodies of the search endpoints.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiResult;
use crate::geo::{Bounds, Point, PolygonRings};
use crate::store::Land;

use super::ranges::PartialRange;
use super::types::MarkerType;
use super::zone::{UseZoneCategory, UseZoneCode};

/// Viewport, zoom level and land filter of a map search.
///
/// Kept flat because query strings cannot carry nested structs.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MapSearchParams {
    #[param(example = 37.40)]
    pub south_west_lat: f64,
    #[param(example = 126.80)]
    pub south_west_lng: f64,
    #[param(example = 37.70)]
    pub north_east_lat: f64,
    #[param(example = 127.20)]
    pub north_east_lng: f64,
    /// 0 to 14. 0-3 shows lands, larger values show region groups.
    #[param(example = 8)]
    pub zoom_level: i32,
    pub land_area_min: Option<i64>,
    pub land_area_max: Option<i64>,
    pub official_land_price_min: Option<i64>,
    pub official_land_price_max: Option<i64>,
    /// Comma separated category names, e.g. `INDUSTRIAL,MANAGEMENT`.
    pub use_zone_categories: Option<String>,
}

impl MapSearchParams {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            south_west: Point::new(self.south_west_lng, self.south_west_lat),
            north_east: Point::new(self.north_east_lng, self.north_east_lat),
        }
    }

    pub fn filter(&self) -> ApiResult<LandFilterRequest> {
        Ok(LandFilterRequest {
            land_area: PartialRange::new(self.land_area_min, self.land_area_max),
            official_land_price: PartialRange::new(
                self.official_land_price_min,
                self.official_land_price_max,
            ),
            use_zone_categories: parse_category_list(self.use_zone_categories.as_deref())?,
        })
    }
}

/// Land filter with possibly missing bounds. Empty categories mean the
/// enterprise-fit set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandFilterRequest {
    pub land_area: PartialRange,
    pub official_land_price: PartialRange,
    pub use_zone_categories: Vec<UseZoneCategory>,
}

fn parse_category_list(raw: Option<&str>) -> ApiResult<Vec<UseZoneCategory>> {
    let names: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    UseZoneCategory::parse_list(&names)
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PolygonParams {
    /// `GROUP` for a region, `LAND` for a land parcel.
    #[param(example = "GROUP")]
    pub polygon_type: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FullCodeParams {
    #[param(example = "5173000000")]
    pub full_code: Option<String>,
}

/// Filter of the per-region land count.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LandCountParams {
    #[param(example = "INDUSTRIAL")]
    pub use_zone_category: Option<String>,
    pub land_area_min: Option<i64>,
    pub land_area_max: Option<i64>,
    pub official_land_price_min: Option<i64>,
    pub official_land_price_max: Option<i64>,
}

impl LandCountParams {
    pub fn category(&self) -> ApiResult<Option<UseZoneCategory>> {
        match self.use_zone_category.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => Ok(UseZoneCategory::parse_list(&[name.to_string()])?
                .into_iter()
                .next()),
        }
    }

    pub fn land_area(&self) -> PartialRange {
        PartialRange::new(self.land_area_min, self.land_area_max)
    }

    pub fn official_land_price(&self) -> PartialRange {
        PartialRange::new(self.official_land_price_min, self.official_land_price_max)
    }
}

/// A map marker: either a region with its land count or a single land.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LandMarkerResponse {
    /// Region code for groups, land id for lands.
    #[schema(example = "5173000000")]
    pub id: String,
    #[schema(example = "횡성군")]
    pub name: Option<String>,
    /// Matching lands, absent for land markers.
    pub count: Option<i64>,
    pub point: Option<Point>,
    #[serde(rename = "type")]
    pub marker_type: MarkerType,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PolygonDataResponse {
    /// One exterior ring per polygon.
    pub polygon: PolygonRings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UseZoneCategoryResponse {
    #[schema(example = "INDUSTRIAL")]
    pub name: String,
    #[schema(example = "공업지역")]
    pub display_name: String,
}

impl From<UseZoneCategory> for UseZoneCategoryResponse {
    fn from(category: UseZoneCategory) -> Self {
        Self {
            name: category.to_string(),
            display_name: category.display_name().to_string(),
        }
    }
}

/// Land count of a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LandCountResponse {
    #[schema(example = "51730")]
    pub full_code: String,
    pub count: i64,
}

/// Every column of a land parcel.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LandDetailResponse {
    pub id: i64,
    pub unique_no: Option<String>,
    #[schema(example = "2711010100")]
    pub full_code: String,
    #[schema(example = "대구광역시 중구 동인동1가 7-1")]
    pub address: Option<String>,
    pub ledger_division_code: Option<i16>,
    pub ledger_division_name: Option<String>,
    pub base_year: Option<i16>,
    pub base_month: Option<i16>,
    pub land_category_code: Option<i16>,
    #[schema(example = "공장용지")]
    pub land_category_name: Option<String>,
    /// Square metres.
    pub land_area: Option<Decimal>,
    pub use_district_code1: Option<i16>,
    #[schema(example = "일반공업지역")]
    pub use_district_name1: Option<String>,
    pub land_use_code: Option<i16>,
    pub land_use_name: Option<String>,
    pub terrain_height_code: Option<i16>,
    pub terrain_height_name: Option<String>,
    pub terrain_shape_code: Option<i16>,
    pub terrain_shape_name: Option<String>,
    pub road_side_code: Option<i16>,
    pub road_side_name: Option<String>,
    /// Won per square metre.
    pub official_land_price: Option<Decimal>,
    pub data_standard_date: Option<NaiveDateTime>,
    pub use_zone_category: Option<String>,
    pub boundary: PolygonRings,
    pub center_point: Option<Point>,
}

impl From<Land> for LandDetailResponse {
    /// Rows loaded without a zone name or category get them from the
    /// use district code.
    fn from(land: Land) -> Self {
        let zone = land.use_district_code1.map(UseZoneCode::from_code);
        let use_district_name1 = land
            .use_district_name1
            .or_else(|| zone.map(|z| z.name.to_string()));
        let use_zone_category = land
            .use_zone_category
            .or_else(|| zone.map(|z| z.category.to_string()));

        Self {
            id: land.id,
            unique_no: land.unique_no,
            full_code: land.full_code,
            address: land.address,
            ledger_division_code: land.ledger_division_code,
            ledger_division_name: land.ledger_division_name,
            base_year: land.base_year,
            base_month: land.base_month,
            land_category_code: land.land_category_code,
            land_category_name: land.land_category_name,
            land_area: land.land_area,
            use_district_code1: land.use_district_code1,
            use_district_name1,
            land_use_code: land.land_use_code,
            land_use_name: land.land_use_name,
            terrain_height_code: land.terrain_height_code,
            terrain_height_name: land.terrain_height_name,
            terrain_shape_code: land.terrain_shape_code,
            terrain_shape_name: land.terrain_shape_name,
            road_side_code: land.road_side_code,
            road_side_name: land.road_side_name,
            official_land_price: land.official_land_price,
            data_standard_date: land.data_standard_date,
            use_zone_category,
            boundary: land.boundary,
            center_point: land.center_point,
        }
    }
}
