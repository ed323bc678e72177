//! Land analysis: search candidate lands, score every indicator and rank.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use strum::IntoEnumIterator;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics::{
    add_lands_scored, inc_analysis_requests, inc_score_calculator_failures, timer_land_analysis,
};
use crate::search::dto::LandFilterRequest;
use crate::search::types::RegionType;
use crate::search::{AreaDetailResponse, LandDataRangeService, MapSearchService, PartialRange, UseZoneCategory};
use crate::store::{Land, LandStore, LongRange, PowerInfrastructureSummary};

use super::calculators::{default_calculators, LandAnalysisData, ScoreCalculator, ScoreResult};
use super::dto::{
    CategoryScoreDetail, LandAnalysisRequest, LandScoreItem, LandScoreRankingResponse,
    TypeScoreDetail,
};
use super::types::{AnalysisCategory, AnalysisStatisticsType, IndustryType, WeightedStatisticsRange};
use super::weights::{
    category_normalized_weights, final_weighted_score, global_normalized_weights, RangeMap,
    WeightMap,
};

/// Lands scored per power infrastructure lookup.
pub const BATCH_SIZE: usize = 1000;
/// Length of the top ranking in the response.
pub const TOP_RANKED: usize = 20;

type ScoreMap = BTreeMap<AnalysisStatisticsType, ScoreResult>;

/// Parse starred land ids sent as strings.
pub fn parse_star_land_ids(raw: &[String]) -> ApiResult<Vec<i64>> {
    raw.iter()
        .map(|id| {
            id.trim().parse::<i64>().map_err(|_| {
                ApiError::bad_request(format!("유효하지 않은 찜 토지 ID 입니다: {}", id))
            })
        })
        .collect()
}

fn partial(range: Option<&WeightedStatisticsRange>) -> PartialRange {
    range.map_or_else(PartialRange::default, |r| PartialRange::new(r.min, r.max))
}

fn with_bounds(range: &WeightedStatisticsRange, bounds: LongRange) -> WeightedStatisticsRange {
    WeightedStatisticsRange::new(Some(bounds.min), Some(bounds.max), range.weight)
}

/// Scores candidate lands with every calculator and ranks them by the
/// weighted total.
pub struct LandAnalysisService {
    store: Arc<dyn LandStore>,
    search: Arc<MapSearchService>,
    ranges: Arc<LandDataRangeService>,
    calculators: Vec<Box<dyn ScoreCalculator>>,
}

impl LandAnalysisService {
    pub fn new(
        store: Arc<dyn LandStore>,
        search: Arc<MapSearchService>,
        ranges: Arc<LandDataRangeService>,
    ) -> Self {
        Self {
            store,
            search,
            ranges,
            calculators: default_calculators(),
        }
    }

    /// Score starred lands and lands under `full_code`, best first.
    #[instrument(skip(self, request), fields(full_code = ?request.full_code))]
    pub async fn analyze(&self, request: &LandAnalysisRequest) -> ApiResult<LandScoreRankingResponse> {
        inc_analysis_requests();
        let _timer = timer_land_analysis();

        request.validate_weights()?;
        let star_ids = parse_star_land_ids(&request.star_land_ids)?;
        let starred: HashSet<i64> = star_ids.iter().copied().collect();

        let mut lands: Vec<Land> = Vec::new();
        if !star_ids.is_empty() {
            let star_lands = self.store.find_lands_by_ids(&star_ids).await?;
            info!(count = star_lands.len(), "Starred lands loaded");
            lands.extend(star_lands);
        }

        match request.full_code.as_deref().filter(|c| !c.is_empty()) {
            Some(full_code) => {
                let searched = self.search_lands(full_code, request).await?;
                let found = searched.len();
                lands.extend(searched.into_iter().filter(|l| !starred.contains(&l.id)));
                info!(full_code, found, total = lands.len(), "Lands searched");
            }
            None if starred.is_empty() => {
                return Err(ApiError::bad_request(
                    "fullCode 또는 starLandIds 중 하나는 필수입니다.",
                ))
            }
            None => {}
        }

        let areas = self.area_details(&lands).await;

        let ranges = self.range_map(request).await?;
        let category_weights = category_normalized_weights(&ranges);
        let global_weights = global_normalized_weights(&ranges);
        let industry_type = IndustryType::from_code(request.industry_type.as_deref());

        let mut items = Vec::with_capacity(lands.len());
        for (index, batch) in lands.chunks(BATCH_SIZE).enumerate() {
            info!(
                batch = index + 1,
                size = batch.len(),
                total = lands.len(),
                "Scoring batch"
            );

            let ids: Vec<i64> = batch.iter().map(|l| l.id).collect();
            let power: HashMap<i64, PowerInfrastructureSummary> = self
                .store
                .find_power_infrastructure(&ids)
                .await?
                .into_iter()
                .map(|summary| (summary.land_id, summary))
                .collect();

            for land in batch {
                let summary = power.get(&land.id);
                let count = |pick: fn(&PowerInfrastructureSummary) -> Option<i32>| {
                    summary.and_then(pick).map_or(0, i64::from)
                };

                let data = LandAnalysisData {
                    land,
                    area: land
                        .full_code
                        .get(..RegionType::Sig.code_length())
                        .and_then(|prefix| areas.get(prefix)),
                    substation_count: count(|s| s.substation_count),
                    transmission_tower_count: count(|s| s.transmission_tower_count),
                    transmission_line_count: count(|s| s.transmission_line_count),
                    ranges: &ranges,
                    category_weights: &category_weights,
                    global_weights: &global_weights,
                    industry_type,
                };

                let scores = self.score(&data);
                items.push(score_item(land, &scores, &global_weights, starred.contains(&land.id)));
            }
        }

        add_lands_scored(items.len() as u64);
        Ok(rank(items))
    }

    async fn search_lands(
        &self,
        full_code: &str,
        request: &LandAnalysisRequest,
    ) -> ApiResult<Vec<Land>> {
        let filter = LandFilterRequest {
            land_area: partial(request.land_area_range.as_ref()),
            official_land_price: partial(request.land_price_range.as_ref()),
            use_zone_categories: UseZoneCategory::parse_list(&request.target_use_district_codes)?,
        };
        self.search.lands_by_full_code(full_code, filter).await
    }

    /// Area details keyed by SIG prefix. Regions that fail to load are
    /// left out and their lands score zero on area indicators.
    async fn area_details(&self, lands: &[Land]) -> HashMap<String, AreaDetailResponse> {
        let len = RegionType::Sig.code_length();
        let prefixes: BTreeSet<&str> = lands
            .iter()
            .filter_map(|l| l.full_code.get(..len))
            .collect();

        let lookups = prefixes.into_iter().map(|prefix| async move {
            (prefix, self.search.area_detail_by_prefix(prefix).await)
        });

        let mut areas = HashMap::new();
        for (prefix, result) in join_all(lookups).await {
            match result {
                Ok(detail) => {
                    debug!(prefix, "Area detail loaded");
                    areas.insert(prefix.to_string(), detail);
                }
                Err(e) => warn!(prefix, error = %e, "Area detail lookup failed"),
            }
        }
        info!(count = areas.len(), "Area details loaded");
        areas
    }

    /// Requested indicators with their ranges. Infrastructure, tariff and
    /// disaster bounds always come from the global statistics.
    async fn range_map(&self, request: &LandAnalysisRequest) -> ApiResult<RangeMap> {
        let mut map = RangeMap::new();

        if let Some(range) = request.land_area_range {
            map.insert(AnalysisStatisticsType::LandArea, range);
        }
        if let Some(range) = request.land_price_range {
            map.insert(AnalysisStatisticsType::OfficialLandPrice, range);
        }
        if let Some(range) = request.electricity_cost_range {
            let bounds = self.ranges.electric_bill_range(None).await?;
            map.insert(AnalysisStatisticsType::ElectricityCost, with_bounds(&range, bounds));
        }
        if let Some(range) = request.population_density_range {
            map.insert(AnalysisStatisticsType::PopulationDensity, range);
        }
        if let Some(range) = request.substation_count_range {
            let bounds = self.ranges.substation_count_range().await?;
            map.insert(AnalysisStatisticsType::SubstationCount, with_bounds(&range, bounds));
        }
        if let Some(range) = request.transmission_tower_count_range {
            let bounds = self.ranges.transmission_tower_count_range().await?;
            map.insert(
                AnalysisStatisticsType::TransmissionTowerCount,
                with_bounds(&range, bounds),
            );
        }
        if let Some(range) = request.transmission_line_count_range {
            let bounds = self.ranges.transmission_line_count_range().await?;
            map.insert(
                AnalysisStatisticsType::TransmissionLineCount,
                with_bounds(&range, bounds),
            );
        }
        if let Some(range) = request.disaster_count_range {
            let bounds = self.ranges.disaster_count_range().await?;
            map.insert(AnalysisStatisticsType::DisasterCount, with_bounds(&range, bounds));
        }

        Ok(map)
    }

    fn score(&self, data: &LandAnalysisData<'_>) -> ScoreMap {
        let mut scores = ScoreMap::new();
        for calculator in &self.calculators {
            match calculator.calculate(data) {
                Ok(Some(result)) => {
                    scores.insert(result.statistics_type, result);
                }
                Ok(None) => {}
                Err(e) => {
                    error!(
                        calculator = calculator.name(),
                        land_id = data.land.id,
                        error = %e,
                        "Score calculation failed"
                    );
                    inc_score_calculator_failures(calculator.name());
                    let stat = calculator.statistics_type();
                    scores.insert(stat, ScoreResult::zero(stat));
                }
            }
        }
        scores
    }
}

fn score_details(scores: &ScoreMap, pick: fn(&ScoreResult) -> f64) -> Vec<CategoryScoreDetail> {
    AnalysisCategory::iter()
        .filter_map(|category| {
            let type_scores: Vec<TypeScoreDetail> = AnalysisStatisticsType::in_category(category)
                .filter_map(|stat| scores.get(&stat))
                .map(|result| TypeScoreDetail {
                    type_name: result.statistics_type.display_name().to_string(),
                    score: pick(result),
                })
                .collect();

            if type_scores.is_empty() {
                return None;
            }

            Some(CategoryScoreDetail {
                category_name: category.display_name().to_string(),
                total_score: type_scores.iter().map(|t| t.score).sum(),
                type_scores,
            })
        })
        .collect()
}

fn score_item(land: &Land, scores: &ScoreMap, global_weights: &WeightMap, is_starred: bool) -> LandScoreItem {
    let total_score = if scores.is_empty() {
        0.0
    } else {
        let originals: BTreeMap<_, _> = scores
            .iter()
            .map(|(stat, result)| (*stat, result.original_score))
            .collect();
        final_weighted_score(&originals, global_weights)
    };

    LandScoreItem {
        land_id: land.id,
        address: land.address.clone(),
        land_area: land.land_area,
        official_land_price: land.official_land_price,
        total_score,
        category_scores: score_details(scores, |r| r.category_normalized_score),
        global_scores: score_details(scores, |r| r.global_normalized_score),
        is_starred,
        rank: 0,
    }
}

/// Sort best first (ties keep input order), assign ranks and split out
/// the starred lands and the top of the ranking.
pub fn rank(mut items: Vec<LandScoreItem>) -> LandScoreRankingResponse {
    items.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
    for (index, item) in items.iter_mut().enumerate() {
        item.rank = index + 1;
    }

    LandScoreRankingResponse {
        starred_lands: items.iter().filter(|i| i.is_starred).cloned().collect(),
        top_ranked_lands: items.iter().take(TOP_RANKED).cloned().collect(),
        total_count: items.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::mock::MockConfig;
    use crate::store::{MockStore, Region, StatType};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn services(store: &MockStore) -> LandAnalysisService {
        let config = Config::default();
        let store: Arc<dyn LandStore> = Arc::new(store.clone());
        let ranges = Arc::new(LandDataRangeService::new(
            Arc::clone(&store),
            Duration::from_secs(config.range_cache_ttl_seconds),
        ));
        let search = Arc::new(MapSearchService::new(
            Arc::clone(&store),
            Arc::clone(&ranges),
            config.land_marker_limit,
        ));
        LandAnalysisService::new(store, search, ranges)
    }

    fn land(id: i64, full_code: &str, area: i64) -> Land {
        Land {
            id,
            full_code: full_code.to_string(),
            address: Some(format!("주소 {}", id)),
            land_area: Some(Decimal::from(area)),
            official_land_price: Some(Decimal::from(50_000)),
            use_zone_category: Some("INDUSTRIAL".to_string()),
            land_use_code: Some(220),
            ..Land::default()
        }
    }

    fn seeded(store: &MockStore) {
        store.set_statistics(StatType::LandAreaRange, 0, 10_000);
        store.set_statistics(StatType::OfficialLandPriceRange, 0, 1_000_000);
        store.set_statistics(StatType::SubstationCountRange, 0, 10);
        store.add_region(Region {
            full_code: "5173000000".to_string(),
            korean_name: "강원특별자치도 횡성군".to_string(),
            region_type: RegionType::Sig,
            sido_name: None,
            sig_name: Some("횡성군".to_string()),
            emd_name: None,
            ri_name: None,
            parent_code: None,
            center_point: None,
        });
    }

    fn area_request(full_code: Option<&str>) -> LandAnalysisRequest {
        LandAnalysisRequest {
            full_code: full_code.map(str::to_string),
            land_area_range: Some(WeightedStatisticsRange::new(Some(0), Some(1000), Some(100))),
            ..LandAnalysisRequest::default()
        }
    }

    fn item(id: i64, score: f64, starred: bool) -> LandScoreItem {
        LandScoreItem {
            land_id: id,
            address: None,
            land_area: None,
            official_land_price: None,
            total_score: score,
            category_scores: Vec::new(),
            global_scores: Vec::new(),
            is_starred: starred,
            rank: 0,
        }
    }

    #[test]
    fn star_ids_must_be_numeric() {
        assert_eq!(
            parse_star_land_ids(&["1".to_string(), " 22 ".to_string()]).unwrap(),
            vec![1, 22]
        );
        assert!(matches!(
            parse_star_land_ids(&["x1".to_string()]),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn ranking_is_stable_and_truncated() {
        let mut items: Vec<_> = (1..=25).map(|id| item(id, 0.1, false)).collect();
        items.push(item(100, 0.9, true));
        items.push(item(101, 0.1, true));

        let response = rank(items);
        assert_eq!(response.total_count, 27);
        assert_eq!(response.top_ranked_lands.len(), TOP_RANKED);
        assert_eq!(response.top_ranked_lands[0].land_id, 100);
        assert_eq!(response.top_ranked_lands[1].land_id, 1);
        assert_eq!(response.top_ranked_lands[1].rank, 2);

        let starred: Vec<_> = response
            .starred_lands
            .iter()
            .map(|i| (i.land_id, i.rank))
            .collect();
        assert_eq!(starred, vec![(100, 1), (101, 27)]);
    }

    #[tokio::test]
    async fn requires_full_code_or_stars() {
        let store = MockStore::new();
        let result = services(&store).analyze(&LandAnalysisRequest::default()).await;
        match result {
            Err(ApiError::BadRequest(message)) => assert!(message.contains("fullCode")),
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn weight_over_hundred_is_rejected_before_loading() {
        let store = MockStore::new();
        seeded(&store);
        store.add_land(land(1, "5173036000", 200));
        let request = LandAnalysisRequest {
            full_code: Some("51730".to_string()),
            land_area_range: Some(WeightedStatisticsRange::new(Some(0), Some(1000), Some(101))),
            ..LandAnalysisRequest::default()
        };

        let result = services(&store).analyze(&request).await;
        assert!(matches!(result, Err(ApiError::BadRequest(m)) if m.contains("landAreaRange")));
    }

    #[tokio::test]
    async fn ranks_lands_by_area_score() {
        let store = MockStore::new();
        seeded(&store);
        store.add_land(land(1, "5173036000", 200));
        store.add_land(land(2, "5173036000", 900));
        store.add_land(land(3, "5173037000", 600));

        let response = services(&store)
            .analyze(&area_request(Some("51730")))
            .await
            .unwrap();

        let order: Vec<i64> = response.top_ranked_lands.iter().map(|i| i.land_id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(response.total_count, 3);
        assert!(response.starred_lands.is_empty());

        let best = &response.top_ranked_lands[0];
        assert!((best.total_score - 0.95).abs() < 1e-9);
        assert_eq!(best.category_scores.len(), 1);
        assert_eq!(best.category_scores[0].category_name, "입지조건");
        assert_eq!(best.global_scores[0].type_scores[0].type_name, "토지면적");
    }

    #[tokio::test]
    async fn starred_lands_are_not_duplicated() {
        let store = MockStore::new();
        seeded(&store);
        store.add_land(land(1, "5173036000", 200));
        store.add_land(land(2, "5173036000", 900));
        // Outside the searched region.
        store.add_land(land(9, "1168010100", 400));

        let mut request = area_request(Some("51730"));
        request.star_land_ids = vec!["1".to_string(), "9".to_string()];

        let response = services(&store).analyze(&request).await.unwrap();
        assert_eq!(response.total_count, 3);

        let starred: Vec<i64> = response.starred_lands.iter().map(|i| i.land_id).collect();
        assert_eq!(starred, vec![9, 1]);
    }

    #[tokio::test]
    async fn infrastructure_range_uses_statistics_bounds() {
        let store = MockStore::new();
        seeded(&store);
        store.add_land(land(1, "5173036000", 500));
        store.set_power_infrastructure(PowerInfrastructureSummary {
            land_id: 1,
            substation_count: Some(5),
            ..PowerInfrastructureSummary::default()
        });

        let request = LandAnalysisRequest {
            full_code: Some("51730".to_string()),
            substation_count_range: Some(WeightedStatisticsRange::new(Some(99), Some(100), Some(10))),
            ..LandAnalysisRequest::default()
        };
        let response = services(&store).analyze(&request).await.unwrap();

        let safety = &response.top_ranked_lands[0].category_scores[0];
        assert_eq!(safety.category_name, "안정성");
        assert!((safety.type_scores[0].score - 0.5).abs() < 1e-9);
        assert!((response.top_ranked_lands[0].total_score - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn failed_area_lookup_scores_zero() {
        let store = MockStore::with_config(MockConfig {
            fail_population: true,
            ..MockConfig::default()
        });
        seeded(&store);
        store.add_land(land(1, "5173036000", 500));

        let request = LandAnalysisRequest {
            full_code: Some("51730".to_string()),
            population_density_range: Some(WeightedStatisticsRange::new(None, None, Some(50))),
            ..LandAnalysisRequest::default()
        };
        let response = services(&store).analyze(&request).await.unwrap();

        let item = &response.top_ranked_lands[0];
        assert_eq!(item.total_score, 0.0);
        assert_eq!(item.category_scores[0].category_name, "인프라");
        assert_eq!(item.category_scores[0].type_scores[0].score, 0.0);
    }
}
