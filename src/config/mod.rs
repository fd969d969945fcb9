//! Run configuration
//!
//! All environment reads happen here, once, when [`ReminderConfig`] is
//! built. The dispatcher only sees the resulting struct.

pub mod credentials;
pub mod error;
pub mod mapping;

pub use credentials::{resolve_credentials, ProjectCredentials};
pub use error::ConfigError;
pub use mapping::{MappingPair, NotificationMapping};

use crate::mdh_api::client::DEFAULT_BASE_URL;
use crate::mdh_api::token::DEFAULT_ASSERTION_VALIDITY_SECS;
use crate::secrets::DEFAULT_REGION;

pub const ENV_NODE_ENV: &str = "NODE_ENV";
pub const ENV_AWS_SECRET_NAME: &str = "AWS_SECRET_NAME";
pub const ENV_AWS_REGION: &str = "AWS_REGION";
pub const ENV_SERVICE_ACCOUNT: &str = "RKS_SERVICE_ACCOUNT";
pub const ENV_PRIVATE_KEY: &str = "RKS_PRIVATE_KEY";
pub const ENV_PROJECT_ID: &str = "RKS_PROJECT_ID";
pub const ENV_SURVEY_CATEGORY: &str = "EMA_CATEGORY";
pub const ENV_NOTIFICATION_SURVEY: &str = "NOTIFICATION_SURVEY";
pub const ENV_BASE_URL: &str = "MDH_BASE_URL";
pub const ENV_TOKEN_VALIDITY: &str = "RKS_TOKEN_VALIDITY_SECS";

/// Where credentials come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// Credentials are read from the secret store
    Production,
    /// Credentials are read from environment variables
    Local,
}

impl RuntimeEnvironment {
    fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some("production") => RuntimeEnvironment::Production,
            _ => RuntimeEnvironment::Local,
        }
    }
}

/// Credentials supplied directly through the environment
#[derive(Clone, Default)]
pub struct LocalCredentials {
    pub service_account: Option<String>,
    pub private_key: Option<String>,
    pub project_id: Option<String>,
}

impl std::fmt::Debug for LocalCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCredentials")
            .field("service_account", &self.service_account)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Configuration for one reminder run
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    pub environment: RuntimeEnvironment,
    /// Secret id consulted in production
    pub secret_name: Option<String>,
    pub aws_region: String,
    pub local_credentials: LocalCredentials,
    /// `surveyCategory` filter for the task query
    pub survey_category: Option<String>,
    pub notification_mapping: NotificationMapping,
    pub base_url: String,
    /// Client assertion lifetime in seconds
    pub token_validity_secs: i64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            environment: RuntimeEnvironment::Local,
            secret_name: None,
            aws_region: DEFAULT_REGION.to_string(),
            local_credentials: LocalCredentials::default(),
            survey_category: None,
            notification_mapping: NotificationMapping::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token_validity_secs: DEFAULT_ASSERTION_VALIDITY_SECS,
        }
    }
}

impl ReminderConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let environment = RuntimeEnvironment::from_node_env(get(ENV_NODE_ENV).as_deref());

        let base_url = match get(ENV_BASE_URL) {
            Some(raw) => parse_base_url(&raw)?,
            None => DEFAULT_BASE_URL.to_string(),
        };

        let token_validity_secs = match get(ENV_TOKEN_VALIDITY) {
            Some(raw) => parse_validity(&raw)?,
            None => DEFAULT_ASSERTION_VALIDITY_SECS,
        };

        let notification_mapping = match get(ENV_NOTIFICATION_SURVEY) {
            Some(raw) => NotificationMapping::parse(&raw),
            None => {
                tracing::warn!(
                    "{} is not set; no reminder notifications will be sent",
                    ENV_NOTIFICATION_SURVEY
                );
                NotificationMapping::default()
            }
        };

        let config = Self {
            environment,
            secret_name: get(ENV_AWS_SECRET_NAME),
            aws_region: get(ENV_AWS_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            local_credentials: LocalCredentials {
                service_account: get(ENV_SERVICE_ACCOUNT),
                private_key: get(ENV_PRIVATE_KEY),
                project_id: get(ENV_PROJECT_ID),
            },
            survey_category: get(ENV_SURVEY_CATEGORY),
            notification_mapping,
            base_url,
            token_validity_secs,
        };

        tracing::debug!(
            "Loaded configuration: environment={:?}, base_url={}, mapping_pairs={}",
            config.environment,
            config.base_url,
            config.notification_mapping.len()
        );
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == RuntimeEnvironment::Production
    }
}

fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = url::Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        name: ENV_BASE_URL.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            name: ENV_BASE_URL.to_string(),
            value: raw.to_string(),
            reason: "scheme must be http or https".to_string(),
        });
    }

    Ok(raw.trim().trim_end_matches('/').to_string())
}

fn parse_validity(raw: &str) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue {
            name: ENV_TOKEN_VALIDITY.to_string(),
            value: raw.to_string(),
            reason: "must be a positive number of seconds".to_string(),
        }),
    }
}
