//! Use zone codes under the National Land Planning and Utilization Act.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;

use crate::error::ApiError;

/// Coarse grouping of use zones, stored in `land.use_zone_category`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, Serialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UseZoneCategory {
    Unspecified,
    Residential,
    Commercial,
    Industrial,
    Green,
    Management,
    Agricultural,
    Conservation,
    Other,
}

impl UseZoneCategory {
    /// Korean display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "미분류",
            Self::Residential => "주거지역",
            Self::Commercial => "상업지역",
            Self::Industrial => "공업지역",
            Self::Green => "녹지지역",
            Self::Management => "관리지역",
            Self::Agricultural => "농림지역",
            Self::Conservation => "자연환경보전지역",
            Self::Other => "기타",
        }
    }

    /// Whether businesses can generally build on this category.
    pub fn is_enterprise_fit(&self) -> bool {
        matches!(self, Self::Commercial | Self::Industrial | Self::Management)
    }

    /// Categories offered to enterprise users, in declaration order.
    pub fn enterprise_fit() -> Vec<UseZoneCategory> {
        Self::iter().filter(Self::is_enterprise_fit).collect()
    }

    /// Parse category names sent by a client.
    ///
    /// An empty list falls back to the enterprise-fit categories.
    pub fn parse_list(names: &[String]) -> Result<Vec<UseZoneCategory>, ApiError> {
        if names.is_empty() {
            return Ok(Self::enterprise_fit());
        }

        let mut categories = Vec::with_capacity(names.len());
        for name in names {
            let category = name
                .trim()
                .to_uppercase()
                .parse::<UseZoneCategory>()
                .map_err(|_| ApiError::bad_request(format!("invalid use zone category: {}", name)))?;
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        Ok(categories)
    }
}

/// A use zone code with its official name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseZoneCode {
    /// Numeric code stored in `use_district_code1`.
    pub code: i16,
    /// Official Korean name.
    pub name: &'static str,
    /// Category the zone belongs to.
    pub category: UseZoneCategory,
}

const fn zone(code: i16, name: &'static str, category: UseZoneCategory) -> UseZoneCode {
    UseZoneCode {
        code,
        name,
        category,
    }
}

/// All known use zone codes.
pub const USE_ZONE_CODES: &[UseZoneCode] = &[
    zone(100, "지정되지않음", UseZoneCategory::Unspecified),
    zone(11, "제1종전용주거지역", UseZoneCategory::Residential),
    zone(12, "제2종전용주거지역", UseZoneCategory::Residential),
    zone(13, "제1종일반주거지역", UseZoneCategory::Residential),
    zone(14, "제2종일반주거지역", UseZoneCategory::Residential),
    zone(15, "제3종일반주거지역", UseZoneCategory::Residential),
    zone(16, "준주거지역", UseZoneCategory::Residential),
    zone(21, "중심상업지역", UseZoneCategory::Commercial),
    zone(22, "일반상업지역", UseZoneCategory::Commercial),
    zone(23, "근린상업지역", UseZoneCategory::Commercial),
    zone(24, "유통상업지역", UseZoneCategory::Commercial),
    zone(31, "전용공업지역", UseZoneCategory::Industrial),
    zone(32, "일반공업지역", UseZoneCategory::Industrial),
    zone(33, "준공업지역", UseZoneCategory::Industrial),
    zone(41, "보전녹지지역", UseZoneCategory::Green),
    zone(42, "생산녹지지역", UseZoneCategory::Green),
    zone(43, "자연녹지지역", UseZoneCategory::Green),
    zone(44, "개발제한구역", UseZoneCategory::Green),
    zone(51, "용도미지정", UseZoneCategory::Other),
    zone(61, "관리지역", UseZoneCategory::Management),
    zone(62, "보전관리지역", UseZoneCategory::Management),
    zone(63, "생산관리지역", UseZoneCategory::Management),
    zone(64, "계획관리지역", UseZoneCategory::Management),
    zone(71, "농림지역", UseZoneCategory::Agricultural),
    zone(81, "자연환경보전지역", UseZoneCategory::Conservation),
];

impl UseZoneCode {
    /// Look up a code, falling back to "unspecified".
    pub fn from_code(code: i16) -> UseZoneCode {
        USE_ZONE_CODES
            .iter()
            .copied()
            .find(|z| z.code == code)
            .unwrap_or(USE_ZONE_CODES[0])
    }
}

/// Land use situation codes that are never offered as building sites
/// (roads, rivers, parks, cemeteries and similar).
pub const EXCLUDED_LAND_USE_CODES: &[i16] = &[
    910, 920, 930, 940, 950, 960, 970, 990, 850, 860, 870, 880, 881, 890, 891, 892, 893,
];

/// Whether a land use code is excluded from search results.
pub fn is_excluded_land_use(code: Option<i16>) -> bool {
    code.is_some_and(|c| EXCLUDED_LAND_USE_CODES.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enterprise_fit_categories() {
        assert_eq!(
            UseZoneCategory::enterprise_fit(),
            vec![
                UseZoneCategory::Commercial,
                UseZoneCategory::Industrial,
                UseZoneCategory::Management
            ]
        );
    }

    #[test]
    fn parse_list_defaults_and_rejects_unknown() {
        assert_eq!(UseZoneCategory::parse_list(&[]).unwrap().len(), 3);

        let parsed =
            UseZoneCategory::parse_list(&["industrial".to_string(), "INDUSTRIAL".to_string()]).unwrap();
        assert_eq!(parsed, vec![UseZoneCategory::Industrial]);

        assert!(UseZoneCategory::parse_list(&["FACTORY".to_string()]).is_err());
    }

    #[test]
    fn code_lookup() {
        assert_eq!(UseZoneCode::from_code(32).name, "일반공업지역");
        assert_eq!(UseZoneCode::from_code(99).category, UseZoneCategory::Unspecified);
        assert_eq!(UseZoneCode::from_code(64).category, UseZoneCategory::Management);
    }

    #[test]
    fn excluded_land_use() {
        assert!(is_excluded_land_use(Some(910)));
        assert!(!is_excluded_land_use(Some(220)));
        assert!(!is_excluded_land_use(None));
    }
}
