//! Database credentials from AWS Secrets Manager.
//!
//! Only the `dev` and `prod` profiles read the secret. Its string payload is
//! the RDS-managed JSON object `{"username": .., "password": ..}`.

use std::fmt;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::SecretsError;

/// Anything that can hand out a secret string by id.
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn secret_string(&self, secret_id: &str) -> Result<String, SecretsError>;
}

async fn sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// Secrets Manager client for one region.
#[derive(Debug, Clone)]
pub struct AwsSecretSource {
    client: aws_sdk_secretsmanager::Client,
}

impl AwsSecretSource {
    /// Build a client from the default credential chain.
    pub async fn new(region: &str) -> Self {
        let shared = sdk_config(region).await;
        Self {
            client: aws_sdk_secretsmanager::Client::new(&shared),
        }
    }
}

#[async_trait]
impl SecretSource for AwsSecretSource {
    #[instrument(skip(self))]
    async fn secret_string(&self, secret_id: &str) -> Result<String, SecretsError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| SecretsError::FetchFailed {
                secret_id: secret_id.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| SecretsError::MissingSecretString {
                secret_id: secret_id.to_string(),
            })
    }
}

/// Username and password pair read from a secret.
#[derive(Clone, PartialEq, Eq)]
pub struct DbCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parse the secret payload.
pub fn parse_db_credentials(secret: &str) -> Result<DbCredentials, SecretsError> {
    let value: serde_json::Value = serde_json::from_str(secret)?;

    let field = |key: &'static str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or(SecretsError::MissingKey(key))
    };

    Ok(DbCredentials {
        username: field("username")?,
        password: field("password")?,
    })
}

/// Override the configured database credentials with the secret when the
/// active profiles require it. Returns whether the secret was applied.
pub async fn resolve_database_credentials(
    config: &mut Config,
    source: &dyn SecretSource,
) -> Result<bool, SecretsError> {
    if !config.requires_secrets() {
        info!(profiles = %config.app_profiles, "Skipping secret loading");
        return Ok(false);
    }

    let secret_id = config
        .db_secret_id
        .clone()
        .ok_or(SecretsError::NotConfigured)?;

    info!(secret_id = %secret_id, "Loading database credentials from AWS Secrets Manager");
    let credentials = parse_db_credentials(&source.secret_string(&secret_id).await?)?;

    config.db_username = Some(credentials.username);
    config.db_password = Some(credentials.password);
    info!("Database credentials loaded");

    Ok(true)
}

/// Result of STS `GetCallerIdentity`.
#[derive(Debug, Clone, Default)]
pub struct CallerIdentity {
    pub account: Option<String>,
    pub arn: Option<String>,
    pub user_id: Option<String>,
}

/// Who the default credential chain resolves to.
pub async fn caller_identity(region: &str) -> Result<CallerIdentity, SecretsError> {
    let shared = sdk_config(region).await;
    let output = aws_sdk_sts::Client::new(&shared)
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| SecretsError::Identity(DisplayErrorContext(&e).to_string()))?;

    Ok(CallerIdentity {
        account: output.account().map(str::to_string),
        arn: output.arn().map(str::to_string),
        user_id: output.user_id().map(str::to_string),
    })
}
