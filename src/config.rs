//! Application configuration loaded from environment variables.

use serde::Deserialize;

use crate::error::{AppError, Result};

/// Profiles that pull database credentials from AWS Secrets Manager.
const SECRET_PROFILES: &[&str] = &["dev", "prod"];

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Profiles ===
    /// Comma separated list of active profiles (local, dev, prod).
    #[serde(default = "default_profiles")]
    pub app_profiles: String,

    // === Database ===
    /// Full Postgres URL. Takes precedence over the individual DB_* fields.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Database host.
    #[serde(default = "default_db_host")]
    pub db_host: String,

    /// Database port.
    #[serde(default = "default_db_port")]
    pub db_port: u16,

    /// Database name.
    #[serde(default = "default_db_name")]
    pub db_name: String,

    /// Database user. Overwritten by the secret in dev/prod.
    #[serde(default)]
    pub db_username: Option<String>,

    /// Database password. Overwritten by the secret in dev/prod.
    #[serde(default)]
    pub db_password: Option<String>,

    /// Maximum pool size.
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_acquire_timeout")]
    pub db_acquire_timeout_seconds: u64,

    // === AWS ===
    /// Region for Secrets Manager and STS.
    #[serde(default = "default_aws_region")]
    pub aws_region: String,

    /// Secret holding `{"username": .., "password": ..}` for the database.
    #[serde(default)]
    pub db_secret_id: Option<String>,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path prefix for the analysis API (empty or starting with `/`).
    #[serde(default)]
    pub base_path: String,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Log output format: `text` or `json`.
    #[serde(default = "default_log_format")]
    pub log_format: String,

    // === Search ===
    /// Seconds a statistics range stays cached.
    #[serde(default = "default_range_cache_ttl")]
    pub range_cache_ttl_seconds: u64,

    /// Maximum number of land markers returned for one map viewport.
    #[serde(default = "default_land_marker_limit")]
    pub land_marker_limit: i64,
}

fn default_profiles() -> String {
    "local".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "izza".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_aws_region() -> String {
    "ap-northeast-2".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_range_cache_ttl() -> u64 {
    3600 // 1 hour
}

fn default_land_marker_limit() -> i64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_profiles: default_profiles(),
            database_url: None,
            db_host: default_db_host(),
            db_port: default_db_port(),
            db_name: default_db_name(),
            db_username: None,
            db_password: None,
            db_max_connections: default_max_connections(),
            db_acquire_timeout_seconds: default_acquire_timeout(),
            aws_region: default_aws_region(),
            db_secret_id: None,
            port: default_port(),
            base_path: String::new(),
            rust_log: default_log_level(),
            log_format: default_log_format(),
            range_cache_ttl_seconds: default_range_cache_ttl(),
            land_marker_limit: default_land_marker_limit(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| -> Result<()> { Err(AppError::InvalidConfig(message)) };

        if self.port == 0 {
            return invalid("PORT must be greater than 0".to_string());
        }

        if self.db_max_connections == 0 {
            return invalid("DB_MAX_CONNECTIONS must be at least 1".to_string());
        }

        if self.rust_log.trim().is_empty() {
            return invalid("RUST_LOG must not be empty".to_string());
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return invalid(format!(
                "LOG_FORMAT must be text or json, got {}",
                self.log_format
            ));
        }

        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return invalid("BASE_PATH must start with /".to_string());
        }

        if self.land_marker_limit <= 0 {
            return invalid("LAND_MARKER_LIMIT must be positive".to_string());
        }

        if self.requires_secrets() && self.db_secret_id.is_none() {
            return invalid(format!(
                "DB_SECRET_ID is required for profiles {}",
                self.app_profiles
            ));
        }

        Ok(())
    }

    /// Active profiles, trimmed and lowercased.
    pub fn profiles(&self) -> Vec<String> {
        self.app_profiles
            .split(',')
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Whether database credentials come from Secrets Manager.
    pub fn requires_secrets(&self) -> bool {
        self.profiles()
            .iter()
            .any(|p| SECRET_PROFILES.contains(&p.as_str()))
    }

    /// Database location without credentials, for diagnostics.
    pub fn database_target(&self) -> String {
        match &self.database_url {
            Some(url) => match url.rsplit_once('@') {
                Some((_, rest)) => rest.to_string(),
                None => url.trim_start_matches("postgres://").to_string(),
            },
            None => format!("{}:{}/{}", self.db_host, self.db_port, self.db_name),
        }
    }

    /// Whether logs are emitted as JSON lines.
    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }
}
