//! Area level facts shown next to a selected land: electricity tariff,
//! disaster alerts and population.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::store::{Disaster, ElectricityCost, PopulationAggregate};

/// Age group labels in the order they are reported.
pub const AGE_GROUP_LABELS: [&str; 9] = [
    "0-9세",
    "10-19세",
    "20-29세",
    "30-39세",
    "40-49세",
    "50-59세",
    "60-69세",
    "70-79세",
    "80세 이상",
];

const MALE: &str = "남자";
const FEMALE: &str = "여자";

/// Latest industrial electricity tariff of a SIG region.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ElectricityCostInfo {
    /// Won per kWh.
    pub unit_cost: Option<Decimal>,
    /// Tariff month as `YYYY-MM`.
    #[schema(example = "2024-05")]
    pub reference_month: Option<String>,
}

impl ElectricityCostInfo {
    /// No tariff known for the area.
    pub fn none() -> Self {
        Self {
            unit_cost: None,
            reference_month: None,
        }
    }

    pub fn from_cost(cost: Option<ElectricityCost>) -> Self {
        let Some(cost) = cost else {
            return Self::none();
        };

        let reference_month = match (cost.year, cost.month) {
            (Some(year), Some(month)) => Some(format!("{year:04}-{month:02}")),
            _ => None,
        };

        Self {
            unit_cost: cost.unit_cost,
            reference_month,
        }
    }
}

/// Alert count of one disaster type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisasterBreakdownItem {
    #[schema(example = "호우")]
    pub disaster_type: String,
    pub count: i64,
}

/// Disaster alerts issued for a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyTextInfo {
    pub total_disaster_count: i64,
    /// Type of the single row with the largest count.
    pub primary_disaster_type: Option<String>,
    /// Counts summed per type, largest first.
    pub disaster_type_breakdown: Vec<DisasterBreakdownItem>,
}

impl EmergencyTextInfo {
    pub fn none() -> Self {
        Self {
            total_disaster_count: 0,
            primary_disaster_type: None,
            disaster_type_breakdown: Vec::new(),
        }
    }

    /// Summarise the disaster rows of one region.
    pub fn from_disasters(disasters: &[Disaster]) -> Self {
        if disasters.is_empty() {
            return Self::none();
        }

        let count_of = |d: &Disaster| i64::from(d.count.unwrap_or(0));

        let total_disaster_count = disasters.iter().map(count_of).sum();

        // First row wins ties.
        let primary_disaster_type = disasters
            .iter()
            .fold(None::<&Disaster>, |best, d| match best {
                Some(b) if count_of(b) >= count_of(d) => Some(b),
                _ => Some(d),
            })
            .and_then(|d| d.disaster_type.clone());

        let mut per_type: HashMap<&str, i64> = HashMap::new();
        for disaster in disasters {
            if let (Some(kind), Some(count)) = (disaster.disaster_type.as_deref(), disaster.count) {
                *per_type.entry(kind).or_insert(0) += i64::from(count);
            }
        }

        let mut disaster_type_breakdown: Vec<DisasterBreakdownItem> = per_type
            .into_iter()
            .map(|(kind, count)| DisasterBreakdownItem {
                disaster_type: kind.to_string(),
                count,
            })
            .collect();
        disaster_type_breakdown.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.disaster_type.cmp(&b.disaster_type))
        });

        Self {
            total_disaster_count,
            primary_disaster_type,
            disaster_type_breakdown,
        }
    }

    /// Count for one disaster type, 0 when absent.
    pub fn count_of(&self, disaster_type: &str) -> i64 {
        self.disaster_type_breakdown
            .iter()
            .find(|item| item.disaster_type == disaster_type)
            .map_or(0, |item| item.count)
    }
}

/// Population of one age group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgeGroupItem {
    #[schema(example = "40-49세")]
    pub age_group: String,
    pub count: i64,
}

/// Population of a SIG region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PopulationInfo {
    pub total_population: Option<i64>,
    #[schema(example = "202405")]
    pub reference_month: Option<String>,
    pub sido: Option<String>,
    pub sig: Option<String>,
    pub age_groups: Vec<AgeGroupItem>,
    /// Keyed by "남자" and "여자".
    pub gender_distribution: BTreeMap<String, i64>,
}

impl PopulationInfo {
    /// Population with no data.
    pub fn empty() -> Self {
        Self {
            total_population: None,
            reference_month: None,
            sido: None,
            sig: None,
            age_groups: Vec::new(),
            gender_distribution: BTreeMap::new(),
        }
    }

    pub fn from_aggregate(aggregate: Option<PopulationAggregate>) -> Self {
        let Some(aggregate) = aggregate else {
            return Self::empty();
        };

        let age_groups = AGE_GROUP_LABELS
            .iter()
            .zip(aggregate.age_groups)
            .map(|(label, count)| AgeGroupItem {
                age_group: label.to_string(),
                count,
            })
            .collect();

        let gender_distribution = BTreeMap::from([
            (MALE.to_string(), aggregate.male),
            (FEMALE.to_string(), aggregate.female),
        ]);

        Self {
            total_population: aggregate.total,
            reference_month: aggregate.reference_month,
            sido: aggregate.sido,
            sig: aggregate.sig,
            age_groups,
            gender_distribution,
        }
    }

    /// Population of one age group label, 0 when absent.
    pub fn by_age_group(&self, label: &str) -> i64 {
        self.age_groups
            .iter()
            .find(|item| item.age_group == label)
            .map_or(0, |item| item.count)
    }

    fn sum_of(&self, labels: &[&str]) -> i64 {
        labels.iter().map(|label| self.by_age_group(label)).sum()
    }

    /// Ages 20 to 39.
    pub fn youth(&self) -> i64 {
        self.sum_of(&AGE_GROUP_LABELS[2..4])
    }

    /// Ages 40 to 59.
    pub fn middle_aged(&self) -> i64 {
        self.sum_of(&AGE_GROUP_LABELS[4..6])
    }

    /// Ages 60 and over.
    pub fn senior(&self) -> i64 {
        self.sum_of(&AGE_GROUP_LABELS[6..])
    }
}

/// Everything known about the SIG region around a land.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AreaDetailResponse {
    /// SIG level region code.
    #[schema(example = "5173000000")]
    pub full_code: String,
    #[schema(example = "강원특별자치도 횡성군")]
    pub address: String,
    pub electricity_cost_info: ElectricityCostInfo,
    pub emergency_text_info: EmergencyTextInfo,
    pub population_info: PopulationInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn disaster(id: i64, kind: Option<&str>, count: Option<i32>) -> Disaster {
        Disaster {
            id,
            region_name: Some("강원특별자치도 횡성군".to_string()),
            disaster_type: kind.map(str::to_string),
            count,
            full_code: "5173000000".to_string(),
        }
    }

    #[test]
    fn electricity_reference_month_is_zero_padded() {
        let info = ElectricityCostInfo::from_cost(Some(ElectricityCost {
            full_code: "5173000000".to_string(),
            year: Some(2024),
            month: Some(5),
            metro: None,
            city: None,
            unit_cost: Some(dec!(168.3)),
        }));
        assert_eq!(info.reference_month.as_deref(), Some("2024-05"));
        assert_eq!(info.unit_cost, Some(dec!(168.3)));

        assert_eq!(ElectricityCostInfo::from_cost(None), ElectricityCostInfo::none());
    }

    #[test]
    fn disasters_are_summed_per_type() {
        let info = EmergencyTextInfo::from_disasters(&[
            disaster(1, Some("호우"), Some(3)),
            disaster(2, Some("산사태"), Some(1)),
            disaster(3, Some("산사태"), Some(1)),
            disaster(4, None, Some(2)),
            disaster(5, Some("태풍"), None),
        ]);

        assert_eq!(info.total_disaster_count, 7);
        assert_eq!(info.primary_disaster_type.as_deref(), Some("호우"));
        assert_eq!(
            info.disaster_type_breakdown,
            vec![
                DisasterBreakdownItem {
                    disaster_type: "호우".to_string(),
                    count: 3
                },
                DisasterBreakdownItem {
                    disaster_type: "산사태".to_string(),
                    count: 2
                },
            ]
        );
        assert_eq!(info.count_of("태풍"), 0);
    }

    #[test]
    fn no_disasters_is_none() {
        assert_eq!(EmergencyTextInfo::from_disasters(&[]), EmergencyTextInfo::none());
    }

    #[test]
    fn population_age_bands() {
        let info = PopulationInfo::from_aggregate(Some(PopulationAggregate {
            full_code: "51730".to_string(),
            total: Some(450),
            age_groups: [10, 20, 30, 40, 50, 60, 70, 80, 90],
            male: 200,
            female: 250,
            ..PopulationAggregate::default()
        }));

        assert_eq!(info.age_groups.len(), 9);
        assert_eq!(info.youth(), 70);
        assert_eq!(info.middle_aged(), 110);
        assert_eq!(info.senior(), 240);
        assert_eq!(info.gender_distribution["여자"], 250);
    }

    #[test]
    fn missing_population_is_empty() {
        let info = PopulationInfo::from_aggregate(None);
        assert_eq!(info.total_population, None);
        assert!(info.age_groups.is_empty());
        assert_eq!(info.middle_aged(), 0);
    }
}
