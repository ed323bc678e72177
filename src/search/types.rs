//! Administrative region levels and map zoom levels.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::ApiError;

/// Level of a legal administrative district (beopjeong-dong).
///
/// Region codes are 10 digits; each level is identified by a prefix of
/// that code and the rest is zero-filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RegionType {
    /// Province or metropolitan city.
    Sido,
    /// City, county or district.
    Sig,
    /// Town, township or neighbourhood.
    Emd,
    /// Village.
    Ri,
}

impl RegionType {
    /// Length of the significant code prefix for this level.
    pub fn code_length(&self) -> usize {
        match self {
            Self::Sido => 2,
            Self::Sig => 5,
            Self::Emd => 8,
            Self::Ri => 10,
        }
    }

    /// Significant prefix of `full_code` at this level.
    pub fn prefix_of<'a>(&self, full_code: &'a str) -> &'a str {
        full_code.get(..self.code_length()).unwrap_or(full_code)
    }
}

/// Map zoom level bucket, mapping a client zoom number to what is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ZoomLevel {
    /// Zoom 10 to 14: province markers.
    Sido,
    /// Zoom 7 to 9: city/county markers.
    Sig,
    /// Zoom 4 to 6: town markers.
    Emd,
    /// Zoom 0 to 3: individual land parcels.
    Land,
}

impl ZoomLevel {
    const ALL: [ZoomLevel; 4] = [Self::Sido, Self::Sig, Self::Emd, Self::Land];

    /// Inclusive zoom range covered by this level.
    pub fn range(&self) -> (i32, i32) {
        match self {
            Self::Sido => (10, 14),
            Self::Sig => (7, 9),
            Self::Emd => (4, 6),
            Self::Land => (0, 3),
        }
    }

    /// Resolve a client zoom number.
    pub fn from_zoom(zoom: i32) -> Result<Self, ApiError> {
        Self::ALL
            .into_iter()
            .find(|level| {
                let (min, max) = level.range();
                zoom >= min && zoom <= max
            })
            .ok_or_else(|| ApiError::bad_request(format!("invalid zoom level: {}", zoom)))
    }

    /// Region level whose markers are shown, `None` for parcel markers.
    pub fn region_type(&self) -> Option<RegionType> {
        match self {
            Self::Sido => Some(RegionType::Sido),
            Self::Sig => Some(RegionType::Sig),
            Self::Emd => Some(RegionType::Emd),
            Self::Land => None,
        }
    }
}

/// Marker kind returned by the map search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum MarkerType {
    /// Aggregated region marker.
    Group,
    /// Single land parcel marker.
    Land,
}

/// Truncate a region code to its SIG level (`5173036000` -> `5173000000`).
pub fn sig_code_of(full_code: &str) -> String {
    let prefix = RegionType::Sig.prefix_of(full_code);
    format!("{:0<10}", prefix)
}
