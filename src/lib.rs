//! Land search and industrial site analysis API.
//!
//! Serves map markers, parcel details and regional facts (electricity
//! tariffs, disaster alerts, population) for Korean land parcels grouped by
//! legal administrative districts, and ranks candidate parcels for a
//! factory site by weighted indicators.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`secrets`]: Database credentials from AWS Secrets Manager
//! - [`store`]: PostGIS persistence and an in-memory mock
//! - [`search`]: Map search, land details and filter ranges
//! - [`analysis`]: Land scoring and ranking
//! - [`api`]: HTTP API and OpenAPI documentation
//! - [`metrics`]: Prometheus metrics

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod geo;
pub mod metrics;
pub mod search;
pub mod secrets;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
