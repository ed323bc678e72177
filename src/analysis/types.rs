//! Scoring indicators, their categories and the industry profiles.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;

/// Weight assumed when a range carries none.
pub const DEFAULT_WEIGHT: u32 = 50;
/// Largest weight a client may send.
pub const MAX_WEIGHT: u32 = 100;

/// Group of indicators scored and reported together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisCategory {
    LocationCondition,
    Infrastructure,
    Safety,
}

impl AnalysisCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LocationCondition => "입지조건",
            Self::Infrastructure => "인프라",
            Self::Safety => "안정성",
        }
    }
}

/// One scored indicator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatisticsType {
    LandArea,
    OfficialLandPrice,
    UseDistrict,
    ElectricityCost,
    TransmissionTowerCount,
    PopulationDensity,
    SubstationCount,
    TransmissionLineCount,
    DisasterCount,
}

impl AnalysisStatisticsType {
    pub fn category(&self) -> AnalysisCategory {
        match self {
            Self::LandArea | Self::OfficialLandPrice | Self::UseDistrict | Self::ElectricityCost => {
                AnalysisCategory::LocationCondition
            }
            Self::TransmissionTowerCount | Self::PopulationDensity => {
                AnalysisCategory::Infrastructure
            }
            Self::SubstationCount | Self::TransmissionLineCount | Self::DisasterCount => {
                AnalysisCategory::Safety
            }
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LandArea => "토지면적",
            Self::OfficialLandPrice => "공시지가",
            Self::UseDistrict => "용도지역",
            Self::ElectricityCost => "전기요금",
            Self::TransmissionTowerCount => "송전탑개수",
            Self::PopulationDensity => "인구밀도",
            Self::SubstationCount => "변전소개수",
            Self::TransmissionLineCount => "전기선개수",
            Self::DisasterCount => "재해발생",
        }
    }

    /// Indicators of one category in declaration order.
    pub fn in_category(category: AnalysisCategory) -> impl Iterator<Item = Self> {
        Self::iter().filter(move |t| t.category() == category)
    }
}

/// Industry profile used by the population score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum IndustryType {
    Manufacturing,
    Logistics,
    #[strum(serialize = "IT")]
    It,
}

impl IndustryType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Manufacturing => "제조업",
            Self::Logistics => "물류업",
            Self::It => "정보통신업",
        }
    }

    /// Preferred middle-aged population.
    pub fn standard_density(&self) -> f64 {
        match self {
            Self::Manufacturing => 3000.0,
            Self::Logistics => 5000.0,
            Self::It => 2000.0,
        }
    }

    /// Half width of the band scored as neutral.
    pub fn allowed_deviation(&self) -> f64 {
        match self {
            Self::Manufacturing => 700.0,
            Self::Logistics => 900.0,
            Self::It => 500.0,
        }
    }

    /// Case-insensitive lookup. Unknown codes are `None`.
    pub fn from_code(code: Option<&str>) -> Option<Self> {
        code.and_then(|c| c.trim().parse().ok())
    }
}

/// Indicator range chosen by the client with its importance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WeightedStatisticsRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
    /// 0 to 100.
    #[schema(example = 50)]
    pub weight: Option<u32>,
}

impl WeightedStatisticsRange {
    pub fn new(min: Option<i64>, max: Option<i64>, weight: Option<u32>) -> Self {
        Self { min, max, weight }
    }

    /// Weight used in normalisation.
    pub fn effective_weight(&self) -> f64 {
        f64::from(self.weight.unwrap_or(DEFAULT_WEIGHT))
    }

    /// Both bounds, when present.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some((min as f64, max as f64)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_group_indicators() {
        let location: Vec<_> =
            AnalysisStatisticsType::in_category(AnalysisCategory::LocationCondition).collect();
        assert_eq!(
            location,
            vec![
                AnalysisStatisticsType::LandArea,
                AnalysisStatisticsType::OfficialLandPrice,
                AnalysisStatisticsType::UseDistrict,
                AnalysisStatisticsType::ElectricityCost,
            ]
        );
        assert_eq!(
            AnalysisStatisticsType::DisasterCount.category(),
            AnalysisCategory::Safety
        );
        assert_eq!(AnalysisCategory::Infrastructure.display_name(), "인프라");
    }

    #[test]
    fn industry_codes() {
        assert_eq!(
            IndustryType::from_code(Some("logistics")),
            Some(IndustryType::Logistics)
        );
        assert_eq!(IndustryType::from_code(Some("IT")), Some(IndustryType::It));
        assert_eq!(IndustryType::from_code(Some("FARMING")), None);
        assert_eq!(IndustryType::from_code(None), None);
    }

    #[test]
    fn weight_defaults_to_fifty() {
        assert_eq!(WeightedStatisticsRange::default().effective_weight(), 50.0);
        assert_eq!(
            WeightedStatisticsRange::new(Some(1), Some(9), Some(0)).effective_weight(),
            0.0
        );
        assert_eq!(WeightedStatisticsRange::new(Some(1), None, None).bounds(), None);
    }
}
