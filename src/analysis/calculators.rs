//! Per-indicator score calculators.
//!
//! Every calculator maps one indicator of a land to an original score in
//! [0, 1]. Category and global scores are the original score scaled by
//! the normalised weights.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::ScoreError;
use crate::search::AreaDetailResponse;
use crate::store::Land;

use super::types::{AnalysisStatisticsType, IndustryType};
use super::weights::{RangeMap, WeightMap};

/// Unit cost assumed when the region has no tariff, in won per kWh.
pub const DEFAULT_UNIT_COST: f64 = 170.0;

/// Everything a calculator may look at for one land.
#[derive(Debug, Clone, Copy)]
pub struct LandAnalysisData<'a> {
    pub land: &'a Land,
    /// SIG level facts, `None` when they could not be loaded.
    pub area: Option<&'a AreaDetailResponse>,
    pub substation_count: i64,
    pub transmission_tower_count: i64,
    pub transmission_line_count: i64,
    pub ranges: &'a RangeMap,
    pub category_weights: &'a WeightMap,
    pub global_weights: &'a WeightMap,
    pub industry_type: Option<IndustryType>,
}

impl LandAnalysisData<'_> {
    fn area_detail(&self) -> Result<&AreaDetailResponse, ScoreError> {
        self.area
            .ok_or_else(|| ScoreError::MissingAreaDetail(self.land.full_code.clone()))
    }
}

/// Score of one indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreResult {
    pub statistics_type: AnalysisStatisticsType,
    pub original_score: f64,
    pub category_normalized_score: f64,
    pub global_normalized_score: f64,
}

impl ScoreResult {
    /// Result recorded when a calculator fails.
    pub fn zero(statistics_type: AnalysisStatisticsType) -> Self {
        Self {
            statistics_type,
            original_score: 0.0,
            category_normalized_score: 0.0,
            global_normalized_score: 0.0,
        }
    }

    /// Scale an original score by the normalised weights. A missing weight
    /// leaves the score unscaled.
    pub fn weighted(
        statistics_type: AnalysisStatisticsType,
        original_score: f64,
        category_weights: &WeightMap,
        global_weights: &WeightMap,
    ) -> Self {
        let scale = |weights: &WeightMap| {
            weights
                .get(&statistics_type)
                .map_or(original_score, |w| original_score * w / 100.0)
        };

        Self {
            statistics_type,
            original_score,
            category_normalized_score: scale(category_weights),
            global_normalized_score: scale(global_weights),
        }
    }
}

/// Computes the score of one indicator.
pub trait ScoreCalculator: Send + Sync {
    /// Name used in logs and the failure metric.
    fn name(&self) -> &'static str;

    fn statistics_type(&self) -> AnalysisStatisticsType;

    /// Original score, `Ok(None)` when the indicator was not requested.
    fn original_score(&self, data: &LandAnalysisData<'_>) -> Result<Option<f64>, ScoreError>;

    fn calculate(&self, data: &LandAnalysisData<'_>) -> Result<Option<ScoreResult>, ScoreError> {
        let Some(original) = self.original_score(data)? else {
            return Ok(None);
        };

        let result = ScoreResult::weighted(
            self.statistics_type(),
            original,
            data.category_weights,
            data.global_weights,
        );
        debug!(
            calculator = self.name(),
            land_id = data.land.id,
            original = result.original_score,
            category = result.category_normalized_score,
            global = result.global_normalized_score,
            "Score calculated"
        );
        Ok(Some(result))
    }
}

/// `base + (x - min) / (max - min) * (1 - base)` clamped to [0, 1].
pub fn linear_score(value: f64, min: f64, max: f64, base: f64) -> f64 {
    if max == min {
        return base;
    }
    (base + (value - min) / (max - min) * (1.0 - base)).clamp(0.0, 1.0)
}

/// `(max - x) / (max - min)` clamped to [0, 1], 0.5 for an empty range.
pub fn reverse_linear_score(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 0.5;
    }
    ((max - value) / (max - min)).clamp(0.0, 1.0)
}

/// 0.5 inside `standard ± deviation`, rising to 1 one deviation above
/// the band and falling to 0 one deviation below it.
pub fn deviation_score(value: f64, standard: f64, deviation: f64) -> f64 {
    if deviation == 0.0 {
        return if value == standard { 0.5 } else { 0.0 };
    }

    let lower = standard - deviation;
    let upper = standard + deviation;
    if value >= lower && value <= upper {
        0.5
    } else if value > upper {
        (0.5 + (value - upper) / deviation * 0.5).min(1.0)
    } else {
        (0.5 - (lower - value) / deviation * 0.5).max(0.0)
    }
}

fn decimal_value(
    land: &Land,
    value: Option<Decimal>,
    field: &'static str,
) -> Result<f64, ScoreError> {
    let value = value.ok_or(ScoreError::MissingLandValue {
        land_id: land.id,
        field,
    })?;
    value
        .to_f64()
        .ok_or_else(|| ScoreError::OutOfRange(value.to_string()))
}

type ValueFn = fn(&LandAnalysisData<'_>) -> Result<f64, ScoreError>;

/// Higher values score higher, from `base` at the range minimum.
pub struct LinearScoreCalculator {
    name: &'static str,
    statistics_type: AnalysisStatisticsType,
    base: f64,
    value: ValueFn,
}

impl LinearScoreCalculator {
    pub fn land_area() -> Self {
        Self {
            name: "LandAreaScoreCalculator",
            statistics_type: AnalysisStatisticsType::LandArea,
            base: 0.5,
            value: |d| decimal_value(d.land, d.land.land_area, "land_area"),
        }
    }

    pub fn official_land_price() -> Self {
        Self {
            name: "OfficialLandPriceScoreCalculator",
            statistics_type: AnalysisStatisticsType::OfficialLandPrice,
            base: 0.5,
            value: |d| decimal_value(d.land, d.land.official_land_price, "official_land_price"),
        }
    }

    pub fn electricity_cost() -> Self {
        Self {
            name: "ElectricityCostScoreCalculator",
            statistics_type: AnalysisStatisticsType::ElectricityCost,
            base: 0.5,
            value: |d| {
                match d
                    .area
                    .and_then(|a| a.electricity_cost_info.unit_cost)
                {
                    Some(cost) => cost
                        .to_f64()
                        .ok_or_else(|| ScoreError::OutOfRange(cost.to_string())),
                    None => Ok(DEFAULT_UNIT_COST),
                }
            },
        }
    }

    pub fn substation_count() -> Self {
        Self {
            name: "SubstationCountScoreCalculator",
            statistics_type: AnalysisStatisticsType::SubstationCount,
            base: 0.0,
            value: |d| Ok(d.substation_count as f64),
        }
    }

    pub fn transmission_tower_count() -> Self {
        Self {
            name: "TransmissionTowerCountScoreCalculator",
            statistics_type: AnalysisStatisticsType::TransmissionTowerCount,
            base: 0.0,
            value: |d| Ok(d.transmission_tower_count as f64),
        }
    }

    pub fn transmission_line_count() -> Self {
        Self {
            name: "TransmissionLineCountScoreCalculator",
            statistics_type: AnalysisStatisticsType::TransmissionLineCount,
            base: 0.0,
            value: |d| Ok(d.transmission_line_count as f64),
        }
    }
}

impl ScoreCalculator for LinearScoreCalculator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn statistics_type(&self) -> AnalysisStatisticsType {
        self.statistics_type
    }

    fn original_score(&self, data: &LandAnalysisData<'_>) -> Result<Option<f64>, ScoreError> {
        let Some((min, max)) = data
            .ranges
            .get(&self.statistics_type)
            .and_then(|r| r.bounds())
        else {
            return Ok(None);
        };

        let value = (self.value)(data)?;
        Ok(Some(linear_score(value, min, max, self.base)))
    }
}

/// Fewer disasters in the region score higher.
pub struct DisasterCountScoreCalculator;

impl ScoreCalculator for DisasterCountScoreCalculator {
    fn name(&self) -> &'static str {
        "DisasterCountScoreCalculator"
    }

    fn statistics_type(&self) -> AnalysisStatisticsType {
        AnalysisStatisticsType::DisasterCount
    }

    fn original_score(&self, data: &LandAnalysisData<'_>) -> Result<Option<f64>, ScoreError> {
        let Some((min, max)) = data
            .ranges
            .get(&self.statistics_type())
            .and_then(|r| r.bounds())
        else {
            return Ok(None);
        };

        let count = data.area_detail()?.emergency_text_info.total_disaster_count as f64;
        Ok(Some(reverse_linear_score(count, min, max)))
    }
}

/// Middle-aged population compared with the industry's preferred band.
pub struct PopulationDensityScoreCalculator;

impl ScoreCalculator for PopulationDensityScoreCalculator {
    fn name(&self) -> &'static str {
        "PopulationDensityScoreCalculator"
    }

    fn statistics_type(&self) -> AnalysisStatisticsType {
        AnalysisStatisticsType::PopulationDensity
    }

    fn original_score(&self, data: &LandAnalysisData<'_>) -> Result<Option<f64>, ScoreError> {
        if !data.ranges.contains_key(&self.statistics_type()) {
            return Ok(None);
        }

        let population = data.area_detail()?.population_info.middle_aged() as f64;
        let industry = data.industry_type.unwrap_or_else(|| {
            warn!("Industry type missing, scoring against manufacturing");
            IndustryType::Manufacturing
        });

        Ok(Some(deviation_score(
            population,
            industry.standard_density(),
            industry.allowed_deviation(),
        )))
    }
}

/// The calculators run for every land, in reporting order.
pub fn default_calculators() -> Vec<Box<dyn ScoreCalculator>> {
    vec![
        Box::new(LinearScoreCalculator::land_area()),
        Box::new(LinearScoreCalculator::official_land_price()),
        Box::new(LinearScoreCalculator::electricity_cost()),
        Box::new(LinearScoreCalculator::transmission_tower_count()),
        Box::new(PopulationDensityScoreCalculator),
        Box::new(LinearScoreCalculator::substation_count()),
        Box::new(LinearScoreCalculator::transmission_line_count()),
        Box::new(DisasterCountScoreCalculator),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::WeightedStatisticsRange;
    use crate::search::{ElectricityCostInfo, EmergencyTextInfo, PopulationInfo};
    use crate::store::PopulationAggregate;
    use rust_decimal_macros::dec;
    use AnalysisStatisticsType::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn land() -> Land {
        Land {
            id: 1,
            full_code: "5173036000".to_string(),
            land_area: Some(dec!(750)),
            official_land_price: Some(dec!(40000)),
            ..Land::default()
        }
    }

    fn area(unit_cost: Option<Decimal>, disasters: i64, middle_aged: i64) -> AreaDetailResponse {
        let mut emergency = EmergencyTextInfo::none();
        emergency.total_disaster_count = disasters;
        AreaDetailResponse {
            full_code: "5173000000".to_string(),
            address: "강원특별자치도 횡성군".to_string(),
            electricity_cost_info: ElectricityCostInfo {
                unit_cost,
                reference_month: None,
            },
            emergency_text_info: emergency,
            population_info: PopulationInfo::from_aggregate(Some(PopulationAggregate {
                age_groups: [0, 0, 0, 0, middle_aged, 0, 0, 0, 0],
                ..PopulationAggregate::default()
            })),
        }
    }

    fn ranges(entries: &[(AnalysisStatisticsType, i64, i64)]) -> RangeMap {
        entries
            .iter()
            .map(|(t, min, max)| (*t, WeightedStatisticsRange::new(Some(*min), Some(*max), None)))
            .collect()
    }

    struct Fixture {
        land: Land,
        area: Option<AreaDetailResponse>,
        ranges: RangeMap,
        weights: WeightMap,
    }

    impl Fixture {
        fn data(&self) -> LandAnalysisData<'_> {
            LandAnalysisData {
                land: &self.land,
                area: self.area.as_ref(),
                substation_count: 2,
                transmission_tower_count: 0,
                transmission_line_count: 10,
                ranges: &self.ranges,
                category_weights: &self.weights,
                global_weights: &self.weights,
                industry_type: None,
            }
        }
    }

    fn fixture(ranges: RangeMap) -> Fixture {
        Fixture {
            land: land(),
            area: Some(area(Some(dec!(150)), 3, 3000)),
            ranges,
            weights: WeightMap::new(),
        }
    }

    #[test]
    fn linear_formula() {
        assert!(close(linear_score(500.0, 0.0, 1000.0, 0.5), 0.75));
        assert!(close(linear_score(2000.0, 0.0, 1000.0, 0.5), 1.0));
        assert!(close(linear_score(-3000.0, 0.0, 1000.0, 0.5), 0.0));
        assert!(close(linear_score(10.0, 5.0, 5.0, 0.5), 0.5));
        assert!(close(linear_score(5.0, 0.0, 10.0, 0.0), 0.5));
    }

    #[test]
    fn reverse_formula() {
        assert!(close(reverse_linear_score(2.0, 0.0, 10.0), 0.8));
        assert!(close(reverse_linear_score(20.0, 0.0, 10.0), 0.0));
        assert!(close(reverse_linear_score(3.0, 4.0, 4.0), 0.5));
    }

    #[test]
    fn deviation_formula() {
        assert!(close(deviation_score(3000.0, 3000.0, 700.0), 0.5));
        assert!(close(deviation_score(3700.0, 3000.0, 700.0), 0.5));
        assert!(close(deviation_score(4050.0, 3000.0, 700.0), 0.75));
        assert!(close(deviation_score(9000.0, 3000.0, 700.0), 1.0));
        assert!(close(deviation_score(1950.0, 3000.0, 700.0), 0.25));
        assert!(close(deviation_score(0.0, 3000.0, 700.0), 0.0));
        assert!(close(deviation_score(10.0, 10.0, 0.0), 0.5));
        assert!(close(deviation_score(11.0, 10.0, 0.0), 0.0));
    }

    #[test]
    fn unrequested_indicator_is_skipped() {
        let f = fixture(ranges(&[(LandArea, 0, 1000)]));
        let price = LinearScoreCalculator::official_land_price();
        assert_eq!(price.calculate(&f.data()).unwrap(), None);
        assert_eq!(
            PopulationDensityScoreCalculator.calculate(&f.data()).unwrap(),
            None
        );
    }

    #[test]
    fn land_area_score_and_weights() {
        let mut f = fixture(ranges(&[(LandArea, 0, 1000)]));
        f.weights.insert(LandArea, 40.0);

        let result = LinearScoreCalculator::land_area()
            .calculate(&f.data())
            .unwrap()
            .unwrap();
        assert!(close(result.original_score, 0.875));
        assert!(close(result.category_normalized_score, 0.35));
        assert!(close(result.global_normalized_score, 0.35));
    }

    #[test]
    fn missing_weight_keeps_original() {
        let f = fixture(ranges(&[(SubstationCount, 0, 4)]));
        let result = LinearScoreCalculator::substation_count()
            .calculate(&f.data())
            .unwrap()
            .unwrap();
        assert!(close(result.original_score, 0.5));
        assert!(close(result.global_normalized_score, 0.5));
    }

    #[test]
    fn electricity_falls_back_to_default_cost() {
        let mut f = fixture(ranges(&[(ElectricityCost, 120, 220)]));
        let calc = LinearScoreCalculator::electricity_cost();
        let with_cost = calc.original_score(&f.data()).unwrap().unwrap();
        assert!(close(with_cost, 0.65));

        f.area = None;
        let default = calc.original_score(&f.data()).unwrap().unwrap();
        assert!(close(default, 0.75));
    }

    #[test]
    fn missing_land_value_is_an_error() {
        let mut f = fixture(ranges(&[(LandArea, 0, 1000)]));
        f.land.land_area = None;
        assert!(matches!(
            LinearScoreCalculator::land_area().calculate(&f.data()),
            Err(ScoreError::MissingLandValue { field: "land_area", .. })
        ));
    }

    #[test]
    fn disaster_and_population_need_area() {
        let mut f = fixture(ranges(&[(DisasterCount, 0, 10), (PopulationDensity, 0, 0)]));
        let disaster = DisasterCountScoreCalculator.original_score(&f.data()).unwrap();
        assert!(close(disaster.unwrap(), 0.7));
        let population = PopulationDensityScoreCalculator
            .original_score(&f.data())
            .unwrap();
        assert!(close(population.unwrap(), 0.5));

        f.area = None;
        assert!(DisasterCountScoreCalculator.calculate(&f.data()).is_err());
        assert!(PopulationDensityScoreCalculator.calculate(&f.data()).is_err());
    }

    #[test]
    fn population_uses_industry_band() {
        let mut f = fixture(ranges(&[(PopulationDensity, 0, 0)]));
        f.area = Some(area(None, 0, 3000));
        let mut data = f.data();
        data.industry_type = Some(IndustryType::It);
        // 3000 is one deviation above the IT band [1500, 2500].
        let score = PopulationDensityScoreCalculator.original_score(&data).unwrap();
        assert!(close(score.unwrap(), 1.0));
    }

    #[test]
    fn default_set_covers_every_scored_type() {
        let types: Vec<_> = default_calculators()
            .iter()
            .map(|c| c.statistics_type())
            .collect();
        assert_eq!(types.len(), 8);
        assert!(!types.contains(&UseDistrict));
    }
}
