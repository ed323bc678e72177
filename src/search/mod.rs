//! Map search, land details and the reference data behind filters.

pub mod area;
pub mod dto;
pub mod ranges;
pub mod service;
pub mod types;
pub mod zone;

pub use area::{AreaDetailResponse, ElectricityCostInfo, EmergencyTextInfo, PopulationInfo};
pub use ranges::{LandDataRangeService, PartialRange};
pub use service::MapSearchService;
pub use types::{MarkerType, RegionType, ZoomLevel};
pub use zone::UseZoneCategory;
