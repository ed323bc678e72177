//! Land suitability analysis.
//!
//! Candidate lands are scored per indicator by the [`calculators`], the
//! client weights are normalised by [`weights`] and the
//! [`service::LandAnalysisService`] ranks the result.

pub mod calculators;
pub mod dto;
pub mod service;
pub mod types;
pub mod weights;

pub use calculators::{ScoreCalculator, ScoreResult};
pub use dto::{LandAnalysisRequest, LandScoreItem, LandScoreRankingResponse};
pub use service::LandAnalysisService;
pub use types::{AnalysisCategory, AnalysisStatisticsType, IndustryType, WeightedStatisticsRange};
