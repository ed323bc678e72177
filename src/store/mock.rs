//! In-memory [`LandStore`] for unit and router tests.
//!
//! Rows are seeded through the `add_*` / `set_*` methods and every query is
//! answered by filtering them the way the SQL in [`super::postgres`] does.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{StoreError, StoreResult};
use crate::geo::{Bounds, PolygonRings};
use crate::search::types::RegionType;

use super::{
    CountLandQuery, Disaster, ElectricityCost, FullCodeLandQuery, Land, LandSearchQuery,
    LandStatistics, LandStore, LongRange, PopulationAggregate, PowerInfrastructureSummary,
    Region, StatType,
};

/// Configuration for mock store behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether `ping` fails.
    pub fail_ping: bool,
    /// Whether every land query fails.
    pub fail_lands: bool,
    /// Whether population lookups fail.
    pub fail_population: bool,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

#[derive(Debug, Default)]
struct MockData {
    regions: Vec<Region>,
    region_polygons: HashMap<String, PolygonRings>,
    lands: Vec<Land>,
    statistics: HashMap<StatType, LandStatistics>,
    electricity: Vec<ElectricityCost>,
    disasters: Vec<Disaster>,
    population: HashMap<String, PopulationAggregate>,
    power: HashMap<i64, PowerInfrastructureSummary>,
}

/// Mock store for testing.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    config: MockConfig,
    data: Arc<Mutex<MockData>>,
}

fn mock_failure() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

fn has_prefix(full_code: &str, prefix: &str) -> bool {
    full_code.starts_with(prefix)
}

fn floor_ceil_range<I>(values: I) -> Option<LongRange>
where
    I: Iterator<Item = Decimal>,
{
    let mut min: Option<Decimal> = None;
    let mut max: Option<Decimal> = None;
    for value in values {
        min = Some(min.map_or(value, |m| m.min(value)));
        max = Some(max.map_or(value, |m| m.max(value)));
    }

    let min = min?.floor().to_i64()?;
    let max = max?.ceil().to_i64()?;
    Some(LongRange::new(min, max))
}

impl MockStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store with custom behavior.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            data: Arc::default(),
        }
    }

    fn data(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    fn check_lands(&self) -> StoreResult<()> {
        if self.config.fail_lands {
            return Err(mock_failure());
        }
        Ok(())
    }

    /// Add a region row.
    pub fn add_region(&self, region: Region) {
        self.data().regions.push(region);
    }

    /// Set the boundary of a region.
    pub fn set_region_polygon(&self, full_code: &str, rings: PolygonRings) {
        self.data()
            .region_polygons
            .insert(full_code.to_string(), rings);
    }

    /// Add a land row.
    pub fn add_land(&self, land: Land) {
        self.data().lands.push(land);
    }

    /// Set a global statistics range.
    pub fn set_statistics(&self, stat_type: StatType, min_value: i64, max_value: i64) {
        self.data().statistics.insert(
            stat_type,
            LandStatistics {
                stat_type,
                min_value,
                max_value,
                updated_at: None,
            },
        );
    }

    /// Add an electricity tariff row.
    pub fn add_electricity(&self, cost: ElectricityCost) {
        self.data().electricity.push(cost);
    }

    /// Add a disaster row.
    pub fn add_disaster(&self, disaster: Disaster) {
        self.data().disasters.push(disaster);
    }

    /// Set the population aggregate returned for a 5 digit prefix.
    pub fn set_population(&self, prefix: &str, population: PopulationAggregate) {
        self.data()
            .population
            .insert(prefix.to_string(), population);
    }

    /// Set the power infrastructure summary of a land.
    pub fn set_power_infrastructure(&self, summary: PowerInfrastructureSummary) {
        self.data().power.insert(summary.land_id, summary);
    }

    /// Clear all mock data.
    pub fn clear(&self) {
        *self.data() = MockData::default();
    }
}

#[async_trait]
impl LandStore for MockStore {
    async fn ping(&self) -> StoreResult<()> {
        if self.config.fail_ping {
            return Err(mock_failure());
        }
        Ok(())
    }

    async fn find_regions_in_bounds(
        &self,
        region_type: RegionType,
        bounds: Bounds,
    ) -> StoreResult<Vec<Region>> {
        self.simulate_latency().await;
        Ok(self
            .data()
            .regions
            .iter()
            .filter(|r| r.region_type == region_type)
            .filter(|r| r.center_point.is_some_and(|p| bounds.contains(&p)))
            .cloned()
            .collect())
    }

    async fn find_region(&self, full_code: &str) -> StoreResult<Option<Region>> {
        Ok(self
            .data()
            .regions
            .iter()
            .find(|r| r.full_code == full_code)
            .cloned())
    }

    async fn find_region_polygon(&self, full_code: &str) -> StoreResult<PolygonRings> {
        Ok(self
            .data()
            .region_polygons
            .get(full_code)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_all_sido(&self) -> StoreResult<Vec<Region>> {
        let mut regions: Vec<Region> = self
            .data()
            .regions
            .iter()
            .filter(|r| r.region_type == RegionType::Sido)
            .cloned()
            .collect();
        regions.sort_by(|a, b| a.full_code.cmp(&b.full_code));
        Ok(regions)
    }

    async fn find_regions_by_parent(&self, parent_code: &str) -> StoreResult<Vec<Region>> {
        let mut regions: Vec<Region> = self
            .data()
            .regions
            .iter()
            .filter(|r| r.parent_code.as_deref() == Some(parent_code))
            .cloned()
            .collect();
        regions.sort_by(|a, b| a.full_code.cmp(&b.full_code));
        Ok(regions)
    }

    async fn find_lands(&self, query: &LandSearchQuery) -> StoreResult<Vec<Land>> {
        self.simulate_latency().await;
        self.check_lands()?;

        let mut lands: Vec<Land> = self
            .data()
            .lands
            .iter()
            .filter(|land| match query.bounds {
                Some(bounds) => land.center_point.is_some_and(|p| bounds.contains(&p)),
                None => true,
            })
            .filter(|land| query.filter.matches(land))
            .cloned()
            .collect();
        lands.sort_by_key(|land| land.id);

        if let Some(limit) = query.limit {
            lands.truncate(limit.max(0) as usize);
        }
        Ok(lands)
    }

    async fn find_land(&self, id: i64) -> StoreResult<Option<Land>> {
        self.check_lands()?;
        Ok(self.data().lands.iter().find(|l| l.id == id).cloned())
    }

    async fn find_lands_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Land>> {
        self.check_lands()?;
        let mut lands: Vec<Land> = self
            .data()
            .lands
            .iter()
            .filter(|l| ids.contains(&l.id))
            .cloned()
            .collect();
        lands.sort_by_key(|land| land.id);
        Ok(lands)
    }

    async fn find_lands_by_full_code(&self, query: &FullCodeLandQuery) -> StoreResult<Vec<Land>> {
        self.simulate_latency().await;
        self.check_lands()?;

        let mut lands: Vec<Land> = self
            .data()
            .lands
            .iter()
            .filter(|l| has_prefix(&l.full_code, &query.full_code))
            .filter(|l| query.filter.matches(l))
            .map(|l| Land {
                boundary: Vec::new(),
                center_point: None,
                ..l.clone()
            })
            .collect();
        lands.sort_by_key(|land| land.id);
        Ok(lands)
    }

    async fn count_lands_by_full_code(&self, query: &FullCodeLandQuery) -> StoreResult<i64> {
        self.check_lands()?;
        Ok(self
            .data()
            .lands
            .iter()
            .filter(|l| has_prefix(&l.full_code, &query.full_code))
            .filter(|l| query.filter.matches(l))
            .count() as i64)
    }

    async fn count_lands_by_regions(
        &self,
        query: &CountLandQuery,
    ) -> StoreResult<HashMap<String, i64>> {
        self.check_lands()?;

        let data = self.data();
        let mut counts = HashMap::new();
        for prefix in &query.full_code_prefixes {
            let count = data
                .lands
                .iter()
                .filter(|l| has_prefix(&l.full_code, prefix))
                .filter(|l| query.filter.matches_ranges(l))
                .count() as i64;
            if count > 0 {
                counts.insert(prefix.clone(), count);
            }
        }
        Ok(counts)
    }

    async fn find_land_polygon(&self, land_id: i64) -> StoreResult<PolygonRings> {
        Ok(self
            .data()
            .lands
            .iter()
            .find(|l| l.id == land_id)
            .map(|l| l.boundary.clone())
            .unwrap_or_default())
    }

    async fn land_area_range_by_region(&self, prefix: &str) -> StoreResult<Option<LongRange>> {
        let data = self.data();
        Ok(floor_ceil_range(
            data.lands
                .iter()
                .filter(|l| has_prefix(&l.full_code, prefix))
                .filter_map(|l| l.land_area),
        ))
    }

    async fn official_land_price_range_by_region(
        &self,
        prefix: &str,
    ) -> StoreResult<Option<LongRange>> {
        let data = self.data();
        Ok(floor_ceil_range(
            data.lands
                .iter()
                .filter(|l| has_prefix(&l.full_code, prefix))
                .filter_map(|l| l.official_land_price),
        ))
    }

    async fn find_statistics(&self, stat_type: StatType) -> StoreResult<Option<LandStatistics>> {
        Ok(self.data().statistics.get(&stat_type).cloned())
    }

    async fn latest_electricity_cost(&self, full_code: &str) -> StoreResult<Option<ElectricityCost>> {
        Ok(self
            .data()
            .electricity
            .iter()
            .filter(|e| e.full_code == full_code)
            .max_by_key(|e| (e.year, e.month))
            .cloned())
    }

    async fn find_disasters(&self, full_code: &str) -> StoreResult<Vec<Disaster>> {
        let mut disasters: Vec<Disaster> = self
            .data()
            .disasters
            .iter()
            .filter(|d| d.full_code == full_code)
            .cloned()
            .collect();
        disasters.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(disasters)
    }

    async fn aggregate_population(&self, prefix: &str) -> StoreResult<Option<PopulationAggregate>> {
        if self.config.fail_population {
            return Err(mock_failure());
        }
        Ok(self.data().population.get(prefix).cloned())
    }

    async fn find_power_infrastructure(
        &self,
        land_ids: &[i64],
    ) -> StoreResult<Vec<PowerInfrastructureSummary>> {
        let data = self.data();
        Ok(land_ids
            .iter()
            .filter_map(|id| data.power.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Point;
    use crate::search::zone::UseZoneCategory;
    use crate::store::LandFilter;
    use rust_decimal_macros::dec;

    fn land(id: i64, full_code: &str, area: Decimal, use_code: Option<i16>) -> Land {
        Land {
            id,
            full_code: full_code.to_string(),
            land_area: Some(area),
            official_land_price: Some(dec!(100000)),
            use_zone_category: Some("INDUSTRIAL".to_string()),
            land_use_code: use_code,
            center_point: Some(Point::new(127.5, 37.5)),
            ..Land::default()
        }
    }

    fn filter() -> LandFilter {
        LandFilter {
            land_area: LongRange::new(0, 10_000),
            official_land_price: LongRange::new(0, 1_000_000),
            use_zone_categories: vec![UseZoneCategory::Industrial],
        }
    }

    #[tokio::test]
    async fn region_counts_skip_land_use_exclusion() {
        let store = MockStore::new();
        store.add_land(land(1, "4113510100", dec!(500), Some(220)));
        store.add_land(land(2, "4113510100", dec!(700), Some(910)));
        store.add_land(land(3, "4113710100", dec!(900), Some(220)));

        let counts = store
            .count_lands_by_regions(&CountLandQuery {
                full_code_prefixes: vec!["41135".to_string(), "41139".to_string()],
                filter: filter(),
            })
            .await
            .unwrap();

        assert_eq!(counts.get("41135"), Some(&2));
        assert_eq!(counts.get("41139"), None);

        let full = store
            .count_lands_by_full_code(&FullCodeLandQuery {
                full_code: "41135".to_string(),
                filter: filter(),
            })
            .await
            .unwrap();
        assert_eq!(full, 1);
    }

    #[tokio::test]
    async fn area_range_rounds_outward() {
        let store = MockStore::new();
        store.add_land(land(1, "4113510100", dec!(112.4), Some(220)));
        store.add_land(land(2, "4113520100", dec!(2036.2), Some(220)));

        let range = store.land_area_range_by_region("41135").await.unwrap();
        assert_eq!(range, Some(LongRange::new(112, 2037)));
        assert_eq!(store.land_area_range_by_region("11110").await.unwrap(), None);
    }

    #[tokio::test]
    async fn latest_electricity_wins() {
        let store = MockStore::new();
        for (year, month, cost) in [(2023, 12, dec!(150)), (2024, 3, dec!(165)), (2024, 1, dec!(160))] {
            store.add_electricity(ElectricityCost {
                full_code: "4113500000".to_string(),
                year: Some(year),
                month: Some(month),
                metro: None,
                city: None,
                unit_cost: Some(cost),
            });
        }

        let latest = store
            .latest_electricity_cost("4113500000")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.unit_cost, Some(dec!(165)));
    }

    #[tokio::test]
    async fn configured_failures() {
        let store = MockStore::with_config(MockConfig {
            fail_ping: true,
            fail_population: true,
            ..MockConfig::default()
        });
        assert!(store.ping().await.is_err());
        assert!(store.aggregate_population("41135").await.is_err());
    }
}
