//! Unified error types for the land search service.

use thiserror::Error;

/// Top-level error for startup and command-line diagnostics.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration validation error.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Secret retrieval error.
    #[error("secrets error: {0}")]
    Secrets(#[from] SecretsError),

    /// Storage error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Metrics exporter could not be installed.
    #[error("metrics error: {0}")]
    Metrics(String),
}

/// Errors raised while resolving credentials from AWS.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// The AWS call itself failed.
    #[error("failed to fetch secret {secret_id}: {reason}")]
    FetchFailed {
        /// Secret identifier.
        secret_id: String,
        /// SDK error description.
        reason: String,
    },

    /// The secret has no string payload.
    #[error("secret {secret_id} has no secret string")]
    MissingSecretString {
        /// Secret identifier.
        secret_id: String,
    },

    /// The payload is not the expected JSON object.
    #[error("secret payload is not valid json: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A required key was absent from the payload.
    #[error("secret payload is missing key {0}")]
    MissingKey(&'static str),

    /// Secret loading was required but no secret id is configured.
    #[error("no secret id configured")]
    NotConfigured,

    /// STS identity lookup failed.
    #[error("sts call failed: {0}")]
    Identity(String),
}

/// Errors raised by the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Query or connection failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Geometry column could not be decoded.
    #[error("invalid geometry: {0}")]
    Geometry(String),

    /// A column held a value outside its domain.
    #[error("invalid column value: {0}")]
    Decode(String),
}

/// Errors surfaced to HTTP clients.
///
/// Every variant is rendered as a `BaseApiResponse` envelope, see
/// [`crate::api::response`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// The caller sent an invalid request.
    #[error("{0}")]
    BadRequest(String),

    /// The requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The persistence layer failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for a 400 error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Shorthand for a 404 error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(StoreError::Database(err))
    }
}

/// Errors raised while scoring a single land.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// A land column the indicator needs is NULL.
    #[error("land {land_id} has no {field}")]
    MissingLandValue {
        /// Land id.
        land_id: i64,
        /// Column name.
        field: &'static str,
    },

    /// Area level data could not be loaded for the land's region.
    #[error("no area detail for region {0}")]
    MissingAreaDetail(String),

    /// A decimal column does not fit in f64.
    #[error("value out of range: {0}")]
    OutOfRange(String),
}

/// Result of a startup or diagnostic call.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result of a storage call.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result of a request-serving call.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
