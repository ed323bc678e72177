//! Request and response bodies of the land analysis endpoint.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};

use super::types::{WeightedStatisticsRange, MAX_WEIGHT};

/// Search conditions and indicator weights of one analysis run.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LandAnalysisRequest {
    /// Region code prefix to search, e.g. `11680` or `5173036000`.
    #[schema(example = "51730")]
    pub full_code: Option<String>,
    /// Ids of lands the user starred. Always analysed.
    #[serde(default)]
    pub star_land_ids: Vec<String>,
    pub land_area_range: Option<WeightedStatisticsRange>,
    pub land_price_range: Option<WeightedStatisticsRange>,
    pub electricity_cost_range: Option<WeightedStatisticsRange>,
    pub substation_count_range: Option<WeightedStatisticsRange>,
    pub transmission_tower_count_range: Option<WeightedStatisticsRange>,
    pub transmission_line_count_range: Option<WeightedStatisticsRange>,
    pub population_density_range: Option<WeightedStatisticsRange>,
    pub disaster_count_range: Option<WeightedStatisticsRange>,
    /// `MANUFACTURING`, `LOGISTICS` or `IT`.
    #[schema(example = "MANUFACTURING")]
    pub industry_type: Option<String>,
    /// Use zone categories to search, enterprise-fit ones when empty.
    #[serde(default)]
    pub target_use_district_codes: Vec<String>,
}

impl LandAnalysisRequest {
    fn weighted_ranges(&self) -> [(&'static str, Option<&WeightedStatisticsRange>); 8] {
        [
            ("landAreaRange", self.land_area_range.as_ref()),
            ("landPriceRange", self.land_price_range.as_ref()),
            ("electricityCostRange", self.electricity_cost_range.as_ref()),
            ("substationCountRange", self.substation_count_range.as_ref()),
            (
                "transmissionTowerCountRange",
                self.transmission_tower_count_range.as_ref(),
            ),
            (
                "transmissionLineCountRange",
                self.transmission_line_count_range.as_ref(),
            ),
            ("populationDensityRange", self.population_density_range.as_ref()),
            ("disasterCountRange", self.disaster_count_range.as_ref()),
        ]
    }

    /// Rejects weights above [`MAX_WEIGHT`].
    pub fn validate_weights(&self) -> ApiResult<()> {
        for (field, range) in self.weighted_ranges() {
            if let Some(weight) = range.and_then(|r| r.weight).filter(|w| *w > MAX_WEIGHT) {
                return Err(ApiError::bad_request(format!(
                    "{field}.weight 는 0 이상 {MAX_WEIGHT} 이하여야 합니다: {weight}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeScoreDetail {
    #[schema(example = "토지면적")]
    pub type_name: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScoreDetail {
    #[schema(example = "입지조건")]
    pub category_name: String,
    pub total_score: f64,
    pub type_scores: Vec<TypeScoreDetail>,
}

/// Score of one land.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LandScoreItem {
    pub land_id: i64,
    pub address: Option<String>,
    pub land_area: Option<Decimal>,
    pub official_land_price: Option<Decimal>,
    /// 0.0 to 1.0.
    pub total_score: f64,
    /// Scores weighted within each category.
    pub category_scores: Vec<CategoryScoreDetail>,
    /// Contributions to the total score.
    pub global_scores: Vec<CategoryScoreDetail>,
    pub is_starred: bool,
    /// 1 for the best land.
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LandScoreRankingResponse {
    /// Starred lands with their overall rank.
    pub starred_lands: Vec<LandScoreItem>,
    /// The 20 best lands.
    pub top_ranked_lands: Vec<LandScoreItem>,
    /// Number of lands analysed.
    pub total_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_parses_camel_case() {
        let json = r#"{
            "fullCode": "51730",
            "starLandIds": ["12", "15"],
            "landAreaRange": {"min": 100, "max": 5000, "weight": 70},
            "electricityCostRange": {"weight": 30},
            "industryType": "LOGISTICS"
        }"#;
        let request: LandAnalysisRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.full_code.as_deref(), Some("51730"));
        assert_eq!(request.star_land_ids, vec!["12", "15"]);
        assert_eq!(request.land_area_range.unwrap().weight, Some(70));
        assert_eq!(request.electricity_cost_range.unwrap().min, None);
        assert!(request.land_price_range.is_none());
        assert!(request.target_use_district_codes.is_empty());
    }

    #[test]
    fn weights_above_hundred_are_rejected() {
        let request = LandAnalysisRequest {
            land_area_range: Some(WeightedStatisticsRange::new(None, None, Some(100))),
            disaster_count_range: Some(WeightedStatisticsRange::new(None, None, Some(0))),
            ..LandAnalysisRequest::default()
        };
        assert!(request.validate_weights().is_ok());

        let request = LandAnalysisRequest {
            substation_count_range: Some(WeightedStatisticsRange::new(Some(0), Some(5), Some(101))),
            ..LandAnalysisRequest::default()
        };
        match request.validate_weights() {
            Err(ApiError::BadRequest(message)) => {
                assert!(message.contains("substationCountRange"), "{message}");
            }
            other => panic!("expected bad request, got {other:?}"),
        }
    }
}
