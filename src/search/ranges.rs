//! Statistic ranges for filter sliders and analysis defaults.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::metrics::{inc_range_cache_hits, inc_range_cache_misses};
use crate::store::prefix_sum::{AREA_BUCKET_SIZE, PRICE_BUCKET_SIZE};
use crate::store::{FullCodeLandQuery, LandFilter, LandStore, LongRange, StatType};

use super::types::RegionType;
use super::zone::UseZoneCategory;

static FULL_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2,10}$").expect("valid regex"));

/// Check a client supplied region code: 2 to 10 digits.
pub fn validate_full_code(full_code: &str) -> ApiResult<&str> {
    if FULL_CODE.is_match(full_code) {
        Ok(full_code)
    } else {
        Err(ApiError::bad_request(format!(
            "유효하지 않은 법정동 코드입니다: {}",
            full_code
        )))
    }
}

/// SIG prefix of a validated region code. Codes shorter than 5 digits
/// have no SIG level.
pub fn sig_prefix(full_code: &str) -> ApiResult<&str> {
    let code = validate_full_code(full_code)?;
    let len = RegionType::Sig.code_length();
    code.get(..len).ok_or_else(|| {
        ApiError::bad_request(format!(
            "시군구 단위 이상의 법정동 코드가 필요합니다: {}",
            full_code
        ))
    })
}

/// Widen `[min, max]` outward to whole buckets.
pub fn normalize(min: i64, max: i64, bucket: i64) -> LongRange {
    let lower = min.div_euclid(bucket) * bucket;
    let upper = if max.rem_euclid(bucket) == 0 {
        max
    } else {
        (max.div_euclid(bucket) + 1) * bucket
    };
    LongRange::new(lower, upper)
}

/// A range whose bounds may each be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl PartialRange {
    pub fn new(min: Option<i64>, max: Option<i64>) -> Self {
        Self { min, max }
    }

    /// Fill missing bounds from `fallback`.
    pub fn or(self, fallback: LongRange) -> LongRange {
        LongRange::new(
            self.min.unwrap_or(fallback.min),
            self.max.unwrap_or(fallback.max),
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedRange {
    range: LongRange,
    fetched_at: Instant,
}

/// Global and per-region statistic ranges.
///
/// Global ranges change only when the statistics batch runs, so they are
/// kept in memory for `ttl`.
pub struct LandDataRangeService {
    store: Arc<dyn LandStore>,
    cache: DashMap<StatType, CachedRange>,
    ttl: Duration,
}

impl LandDataRangeService {
    pub fn new(store: Arc<dyn LandStore>, ttl: Duration) -> Self {
        Self {
            store,
            cache: DashMap::new(),
            ttl,
        }
    }

    /// Global range of one statistic.
    #[instrument(skip(self))]
    pub async fn range(&self, stat_type: StatType) -> ApiResult<LongRange> {
        if let Some(cached) = self.cache.get(&stat_type) {
            if cached.fetched_at.elapsed() < self.ttl {
                inc_range_cache_hits();
                return Ok(cached.range);
            }
        }

        inc_range_cache_misses();
        let statistics = self.store.find_statistics(stat_type).await?.ok_or_else(|| {
            ApiError::not_found(format!("통계 데이터를 찾을 수 없습니다: {}", stat_type))
        })?;

        let range = statistics.range();
        self.cache.insert(
            stat_type,
            CachedRange {
                range,
                fetched_at: Instant::now(),
            },
        );
        debug!(%stat_type, min = range.min, max = range.max, "Cached statistics range");
        Ok(range)
    }

    /// Drop every cached range.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    pub async fn land_area_range(&self) -> ApiResult<LongRange> {
        self.range(StatType::LandAreaRange).await
    }

    pub async fn official_land_price_range(&self) -> ApiResult<LongRange> {
        self.range(StatType::OfficialLandPriceRange).await
    }

    pub async fn substation_count_range(&self) -> ApiResult<LongRange> {
        self.range(StatType::SubstationCountRange).await
    }

    pub async fn transmission_tower_count_range(&self) -> ApiResult<LongRange> {
        self.range(StatType::TransmissionTowerCountRange).await
    }

    pub async fn transmission_line_count_range(&self) -> ApiResult<LongRange> {
        self.range(StatType::TransmissionLineCountRange).await
    }

    pub async fn disaster_count_range(&self) -> ApiResult<LongRange> {
        self.range(StatType::DisasterCountRange).await
    }

    /// Global tariff range, or the floor and ceiling of one region's
    /// latest tariff when a code is given.
    #[instrument(skip(self))]
    pub async fn electric_bill_range(&self, full_code: Option<&str>) -> ApiResult<LongRange> {
        let Some(code) = full_code.filter(|c| !c.is_empty()) else {
            return self.range(StatType::ElectricBillRange).await;
        };
        let code = validate_full_code(code)?;

        let unit_cost = self
            .store
            .latest_electricity_cost(code)
            .await?
            .and_then(|cost| cost.unit_cost)
            .ok_or_else(|| {
                ApiError::not_found(format!("전기 요금 정보를 찾을 수 없습니다: {}", code))
            })?;

        let floor = unit_cost.floor().to_i64();
        let ceil = unit_cost.ceil().to_i64();
        match (floor, ceil) {
            (Some(min), Some(max)) => Ok(LongRange::new(min, max)),
            _ => Err(ApiError::Internal(format!(
                "unit cost out of range: {}",
                unit_cost
            ))),
        }
    }

    /// Land area range under a region's SIG prefix, widened to 500 ㎡ buckets.
    #[instrument(skip(self))]
    pub async fn land_area_range_by_region(&self, full_code: &str) -> ApiResult<LongRange> {
        let prefix = sig_prefix(full_code)?;
        let raw = self
            .store
            .land_area_range_by_region(prefix)
            .await?
            .ok_or_else(|| region_range_missing(full_code))?;
        Ok(normalize(raw.min, raw.max, AREA_BUCKET_SIZE))
    }

    /// Official land price range under a region's SIG prefix, widened to
    /// 500 000 won buckets.
    #[instrument(skip(self))]
    pub async fn official_land_price_range_by_region(
        &self,
        full_code: &str,
    ) -> ApiResult<LongRange> {
        let prefix = sig_prefix(full_code)?;
        let raw = self
            .store
            .official_land_price_range_by_region(prefix)
            .await?
            .ok_or_else(|| region_range_missing(full_code))?;
        Ok(normalize(raw.min, raw.max, PRICE_BUCKET_SIZE))
    }

    /// Build a land filter, taking missing bounds from the global ranges.
    pub async fn filter_with_defaults(
        &self,
        land_area: PartialRange,
        official_land_price: PartialRange,
        use_zone_categories: Vec<UseZoneCategory>,
    ) -> ApiResult<LandFilter> {
        let land_area = match (land_area.min, land_area.max) {
            (Some(min), Some(max)) => LongRange::new(min, max),
            _ => land_area.or(self.land_area_range().await?),
        };

        let official_land_price = match (official_land_price.min, official_land_price.max) {
            (Some(min), Some(max)) => LongRange::new(min, max),
            _ => official_land_price.or(self.official_land_price_range().await?),
        };

        let use_zone_categories = if use_zone_categories.is_empty() {
            UseZoneCategory::enterprise_fit()
        } else {
            use_zone_categories
        };

        Ok(LandFilter {
            land_area,
            official_land_price,
            use_zone_categories,
        })
    }

    /// Matching lands under a region's SIG prefix.
    #[instrument(skip(self))]
    pub async fn count_lands_by_full_code(
        &self,
        full_code: &str,
        use_zone_category: Option<UseZoneCategory>,
        land_area: PartialRange,
        official_land_price: PartialRange,
    ) -> ApiResult<i64> {
        let prefix = sig_prefix(full_code)?;
        let filter = self
            .filter_with_defaults(
                land_area,
                official_land_price,
                use_zone_category.into_iter().collect(),
            )
            .await?;

        let count = self
            .store
            .count_lands_by_full_code(&FullCodeLandQuery {
                full_code: prefix.to_string(),
                filter,
            })
            .await?;
        Ok(count)
    }

    /// Provinces when no code is given, otherwise the children of the code.
    #[instrument(skip(self))]
    pub async fn regions(&self, full_code: Option<&str>) -> ApiResult<Vec<RegionResponse>> {
        let regions = match full_code.filter(|c| !c.is_empty()) {
            None => self.store.find_all_sido().await?,
            Some(code) => {
                self.store
                    .find_regions_by_parent(validate_full_code(code)?)
                    .await?
            }
        };

        Ok(regions
            .into_iter()
            .map(|region| RegionResponse {
                name: region.picker_name().map(str::to_string),
                code: region.full_code,
            })
            .collect())
    }
}

fn region_range_missing(full_code: &str) -> ApiError {
    ApiError::not_found(format!(
        "지역의 토지 데이터를 찾을 수 없습니다: {}",
        full_code
    ))
}

/// One entry of the region picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RegionResponse {
    #[schema(example = "5173000000")]
    pub code: String,
    #[schema(example = "횡성군")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ElectricityCost, Land, MockStore, Region};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn service(store: &MockStore) -> LandDataRangeService {
        LandDataRangeService::new(Arc::new(store.clone()), Duration::from_secs(60))
    }

    fn region(full_code: &str, region_type: RegionType, parent: Option<&str>) -> Region {
        Region {
            full_code: full_code.to_string(),
            korean_name: "강원특별자치도 횡성군".to_string(),
            region_type,
            sido_name: Some("강원특별자치도".to_string()),
            sig_name: Some("횡성군".to_string()),
            emd_name: None,
            ri_name: None,
            parent_code: parent.map(str::to_string),
            center_point: None,
        }
    }

    #[test]
    fn normalize_widens_to_buckets() {
        assert_eq!(normalize(112, 2037, 500), LongRange::new(0, 2500));
        assert_eq!(normalize(500, 1000, 500), LongRange::new(500, 1000));
        assert_eq!(
            normalize(1_234_567, 3_000_001, 500_000),
            LongRange::new(1_000_000, 3_500_000)
        );
    }

    #[test]
    fn full_code_validation() {
        assert!(validate_full_code("5173036000").is_ok());
        assert!(validate_full_code("51").is_ok());
        assert!(validate_full_code("5").is_err());
        assert!(validate_full_code("51a30").is_err());
        assert!(matches!(sig_prefix("517"), Err(ApiError::BadRequest(_))));
        assert_eq!(sig_prefix("5173036000").unwrap(), "51730");
    }

    #[tokio::test]
    async fn global_range_is_cached() {
        let store = MockStore::new();
        store.set_statistics(StatType::LandAreaRange, 10, 9000);
        let service = service(&store);

        assert_eq!(
            service.land_area_range().await.unwrap(),
            LongRange::new(10, 9000)
        );

        store.set_statistics(StatType::LandAreaRange, 0, 1);
        assert_eq!(
            service.land_area_range().await.unwrap(),
            LongRange::new(10, 9000)
        );

        service.invalidate();
        assert_eq!(service.land_area_range().await.unwrap(), LongRange::new(0, 1));
    }

    #[tokio::test]
    async fn missing_statistics_is_not_found() {
        let store = MockStore::new();
        let result = service(&store).disaster_count_range().await;
        match result {
            Err(ApiError::NotFound(message)) => assert!(message.contains("disaster_count_range")),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn electric_bill_range_for_region() {
        let store = MockStore::new();
        store.set_statistics(StatType::ElectricBillRange, 120, 190);
        store.add_electricity(ElectricityCost {
            full_code: "5173000000".to_string(),
            year: Some(2024),
            month: Some(3),
            metro: None,
            city: None,
            unit_cost: Some(dec!(168.42)),
        });
        let service = service(&store);

        assert_eq!(
            service.electric_bill_range(None).await.unwrap(),
            LongRange::new(120, 190)
        );
        assert_eq!(
            service.electric_bill_range(Some("")).await.unwrap(),
            LongRange::new(120, 190)
        );
        assert_eq!(
            service.electric_bill_range(Some("5173000000")).await.unwrap(),
            LongRange::new(168, 169)
        );
        assert!(matches!(
            service.electric_bill_range(Some("1100000000")).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn count_defaults_ranges_and_categories() {
        let store = MockStore::new();
        store.set_statistics(StatType::LandAreaRange, 0, 10_000);
        store.set_statistics(StatType::OfficialLandPriceRange, 0, 10_000_000);
        for (id, category) in [(1, "INDUSTRIAL"), (2, "COMMERCIAL"), (3, "GREEN")] {
            store.add_land(Land {
                id,
                full_code: "5173036000".to_string(),
                land_area: Some(dec!(800)),
                official_land_price: Some(dec!(40000)),
                use_zone_category: Some(category.to_string()),
                land_use_code: Some(220),
                ..Land::default()
            });
        }
        let service = service(&store);

        let all = service
            .count_lands_by_full_code(
                "5173036000",
                None,
                PartialRange::default(),
                PartialRange::default(),
            )
            .await
            .unwrap();
        assert_eq!(all, 2);

        let industrial = service
            .count_lands_by_full_code(
                "5173000000",
                Some(UseZoneCategory::Industrial),
                PartialRange::new(Some(900), None),
                PartialRange::default(),
            )
            .await
            .unwrap();
        assert_eq!(industrial, 0);
    }

    #[tokio::test]
    async fn region_picker_names() {
        let store = MockStore::new();
        store.add_region(region("5100000000", RegionType::Sido, None));
        store.add_region(region("5173000000", RegionType::Sig, Some("5100000000")));
        let service = service(&store);

        let sido = service.regions(None).await.unwrap();
        assert_eq!(
            sido,
            vec![RegionResponse {
                code: "5100000000".to_string(),
                name: Some("강원특별자치도".to_string()),
            }]
        );

        let children = service.regions(Some("5100000000")).await.unwrap();
        assert_eq!(children[0].name.as_deref(), Some("횡성군"));
    }
}
