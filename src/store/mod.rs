//! Persistence layer.
//!
//! [`LandStore`] is the only seam between the services and storage.
//! [`PgStore`] talks to PostGIS through `sqlx`; [`MockStore`] keeps rows in
//! memory for tests.

pub mod mock;
pub mod postgres;
pub mod prefix_sum;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::error::StoreResult;
use crate::geo::{Bounds, Point, PolygonRings};
use crate::search::types::RegionType;
use crate::search::zone::{is_excluded_land_use, UseZoneCategory};

pub use mock::MockStore;
pub use postgres::PgStore;

/// Page size used when streaming lands by region code.
pub const LAND_PAGE_SIZE: i64 = 2000;

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LongRange {
    /// Lower bound.
    #[schema(example = 0)]
    pub min: i64,
    /// Upper bound.
    #[schema(example = 10000)]
    pub max: i64,
}

impl LongRange {
    /// Create a range.
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies in `[min, max]`.
    pub fn contains(&self, value: Decimal) -> bool {
        value >= Decimal::from(self.min) && value <= Decimal::from(self.max)
    }
}

/// Row kinds of the `land_statistics` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum StatType {
    LandAreaRange,
    OfficialLandPriceRange,
    ElectricBillRange,
    TransmissionTowerCountRange,
    TransmissionLineCountRange,
    SubstationCountRange,
    DisasterCountRange,
}

/// Precomputed global min/max for one statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct LandStatistics {
    pub stat_type: StatType,
    pub min_value: i64,
    pub max_value: i64,
    pub updated_at: Option<NaiveDateTime>,
}

impl LandStatistics {
    /// The statistic as a range.
    pub fn range(&self) -> LongRange {
        LongRange::new(self.min_value, self.max_value)
    }
}

/// A legal administrative district.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// 10 digit region code.
    pub full_code: String,
    /// Full Korean name, e.g. "강원특별자치도 횡성군".
    pub korean_name: String,
    pub region_type: RegionType,
    pub sido_name: Option<String>,
    pub sig_name: Option<String>,
    pub emd_name: Option<String>,
    pub ri_name: Option<String>,
    pub parent_code: Option<String>,
    pub center_point: Option<Point>,
}

impl Region {
    /// Last component of the Korean name, used as the marker label.
    pub fn simple_name(&self) -> &str {
        self.korean_name
            .split_whitespace()
            .last()
            .unwrap_or(&self.korean_name)
    }

    /// Name shown in region pickers: province name for SIDO rows,
    /// city/county name otherwise.
    pub fn picker_name(&self) -> Option<&str> {
        match self.region_type {
            RegionType::Sido => self.sido_name.as_deref(),
            _ => self.sig_name.as_deref(),
        }
    }
}

/// A land parcel joined with its GIS row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Land {
    pub id: i64,
    pub shape_id: Option<i64>,
    pub unique_no: Option<String>,
    pub full_code: String,
    pub address: Option<String>,
    pub ledger_division_code: Option<i16>,
    pub ledger_division_name: Option<String>,
    pub base_year: Option<i16>,
    pub base_month: Option<i16>,
    pub land_category_code: Option<i16>,
    pub land_category_name: Option<String>,
    /// Area in square metres.
    pub land_area: Option<Decimal>,
    pub use_district_code1: Option<i16>,
    pub use_district_name1: Option<String>,
    pub land_use_code: Option<i16>,
    pub land_use_name: Option<String>,
    pub terrain_height_code: Option<i16>,
    pub terrain_height_name: Option<String>,
    pub terrain_shape_code: Option<i16>,
    pub terrain_shape_name: Option<String>,
    pub road_side_code: Option<i16>,
    pub road_side_name: Option<String>,
    /// Official land price in won per square metre.
    pub official_land_price: Option<Decimal>,
    pub data_standard_date: Option<NaiveDateTime>,
    pub use_zone_category: Option<String>,
    pub boundary: PolygonRings,
    pub center_point: Option<Point>,
}

/// Latest electricity tariff row for a SIG region.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectricityCost {
    pub full_code: String,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub metro: Option<String>,
    pub city: Option<String>,
    /// Won per kWh.
    pub unit_cost: Option<Decimal>,
}

/// Disaster alert count for one region and disaster type.
#[derive(Debug, Clone, PartialEq)]
pub struct Disaster {
    pub id: i64,
    pub region_name: Option<String>,
    pub disaster_type: Option<String>,
    pub count: Option<i32>,
    pub full_code: String,
}

/// Population summed over every row sharing a region code prefix.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopulationAggregate {
    pub full_code: String,
    pub reference_month: Option<String>,
    pub sido: Option<String>,
    pub sig: Option<String>,
    pub total: Option<i64>,
    /// 0-9, 10-19, ..., 70-79, 80+.
    pub age_groups: [i64; 9],
    pub male: i64,
    pub female: i64,
}

/// Power infrastructure near a parcel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PowerInfrastructureSummary {
    pub land_id: i64,
    pub substation_count: Option<i32>,
    pub substation_closest_distance_meters: Option<Decimal>,
    pub transmission_line_count: Option<i32>,
    pub transmission_line_closest_distance_meters: Option<Decimal>,
    pub transmission_tower_count: Option<i32>,
    pub transmission_tower_closest_distance_meters: Option<Decimal>,
    pub total_infrastructure_count: Option<i32>,
    pub has_high_voltage: Option<bool>,
}

/// Fully resolved land filter. Defaults are applied by the services.
#[derive(Debug, Clone, PartialEq)]
pub struct LandFilter {
    pub land_area: LongRange,
    pub official_land_price: LongRange,
    pub use_zone_categories: Vec<UseZoneCategory>,
}

impl LandFilter {
    /// Category names as stored in `land.use_zone_category`.
    pub fn category_names(&self) -> Vec<String> {
        self.use_zone_categories
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    /// Category and range checks without the land use exclusion. This is
    /// what the per-region count query applies.
    pub fn matches_ranges(&self, land: &Land) -> bool {
        let category_ok = land.use_zone_category.as_deref().is_some_and(|c| {
            self.use_zone_categories
                .iter()
                .any(|wanted| wanted.to_string() == c)
        });
        let area_ok = land.land_area.is_some_and(|a| self.land_area.contains(a));
        let price_ok = land
            .official_land_price
            .is_some_and(|p| self.official_land_price.contains(p));

        category_ok && area_ok && price_ok
    }

    /// In-memory equivalent of the SQL filter.
    pub fn matches(&self, land: &Land) -> bool {
        // NULL land use codes fail `NOT IN` in SQL as well.
        let use_ok = land.land_use_code.is_some() && !is_excluded_land_use(land.land_use_code);

        use_ok && self.matches_ranges(land)
    }
}

/// Lands inside a viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct LandSearchQuery {
    pub bounds: Option<Bounds>,
    pub filter: LandFilter,
    pub limit: Option<i64>,
}

/// Lands whose region code starts with `full_code`.
#[derive(Debug, Clone, PartialEq)]
pub struct FullCodeLandQuery {
    pub full_code: String,
    pub filter: LandFilter,
}

/// Land counts per region prefix. All prefixes share one length.
#[derive(Debug, Clone, PartialEq)]
pub struct CountLandQuery {
    pub full_code_prefixes: Vec<String>,
    pub filter: LandFilter,
}

/// Storage operations used by the search and analysis services.
#[async_trait]
pub trait LandStore: Send + Sync {
    /// Check the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Regions of one level whose center point lies in the viewport.
    async fn find_regions_in_bounds(
        &self,
        region_type: RegionType,
        bounds: Bounds,
    ) -> StoreResult<Vec<Region>>;

    async fn find_region(&self, full_code: &str) -> StoreResult<Option<Region>>;

    /// Region boundary, empty when missing.
    async fn find_region_polygon(&self, full_code: &str) -> StoreResult<PolygonRings>;

    /// Every province, ordered by code.
    async fn find_all_sido(&self) -> StoreResult<Vec<Region>>;

    /// Direct children of a region, ordered by code.
    async fn find_regions_by_parent(&self, parent_code: &str) -> StoreResult<Vec<Region>>;

    async fn find_lands(&self, query: &LandSearchQuery) -> StoreResult<Vec<Land>>;

    async fn find_land(&self, id: i64) -> StoreResult<Option<Land>>;

    async fn find_lands_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Land>>;

    /// Every matching land under a region code, ordered by id.
    async fn find_lands_by_full_code(&self, query: &FullCodeLandQuery) -> StoreResult<Vec<Land>>;

    async fn count_lands_by_full_code(&self, query: &FullCodeLandQuery) -> StoreResult<i64>;

    /// Matching land count keyed by region prefix. Prefixes with no lands
    /// may be absent.
    async fn count_lands_by_regions(
        &self,
        query: &CountLandQuery,
    ) -> StoreResult<HashMap<String, i64>>;

    /// Land boundary, empty when missing.
    async fn find_land_polygon(&self, land_id: i64) -> StoreResult<PolygonRings>;

    /// Floor of the smallest and ceiling of the largest land area under a
    /// 5 digit prefix.
    async fn land_area_range_by_region(&self, prefix: &str) -> StoreResult<Option<LongRange>>;

    /// Same as [`LandStore::land_area_range_by_region`] for official land price.
    async fn official_land_price_range_by_region(
        &self,
        prefix: &str,
    ) -> StoreResult<Option<LongRange>>;

    async fn find_statistics(&self, stat_type: StatType) -> StoreResult<Option<LandStatistics>>;

    /// Most recent tariff by year and month.
    async fn latest_electricity_cost(&self, full_code: &str) -> StoreResult<Option<ElectricityCost>>;

    /// Disaster rows for an exact region code, largest count first.
    async fn find_disasters(&self, full_code: &str) -> StoreResult<Vec<Disaster>>;

    /// Population summed over every row whose code starts with `prefix`.
    async fn aggregate_population(&self, prefix: &str) -> StoreResult<Option<PopulationAggregate>>;

    async fn find_power_infrastructure(
        &self,
        land_ids: &[i64],
    ) -> StoreResult<Vec<PowerInfrastructureSummary>>;
}
