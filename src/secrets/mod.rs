use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::Client as SecretsClient;

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Version stage fetched from AWS Secrets Manager
const CURRENT_VERSION_STAGE: &str = "AWSCURRENT";

/// Secret store trait for fetching credentials
///
/// This trait abstracts secret lookups so the credential resolution step can
/// run against AWS Secrets Manager in production and an in-memory map in
/// tests.
pub trait SecretStore: Send + Sync {
    /// Fetch the string value of the named secret
    fn get_secret(
        &self,
        name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<String, SecretError>> + Send + '_>>;
}

/// Secret store errors
#[derive(Debug)]
pub enum SecretError {
    /// No secret with this name exists
    NotFound(String),
    /// The caller may not read this secret
    AccessDenied(String),
    /// The secret exists but has no usable string value
    InvalidFormat(String),
    /// Any other backend failure
    Backend(String),
}

impl fmt::Display for SecretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretError::NotFound(name) => write!(f, "Secret not found: {}", name),
            SecretError::AccessDenied(name) => write!(f, "Access denied to secret: {}", name),
            SecretError::InvalidFormat(msg) => write!(f, "Invalid secret format: {}", msg),
            SecretError::Backend(msg) => write!(f, "Secret backend error: {}", msg),
        }
    }
}

impl std::error::Error for SecretError {}

/// AWS Secrets Manager backed store
///
/// Uses the default AWS credential chain (environment, profile, instance or
/// task role) and always reads the `AWSCURRENT` version. Nothing is cached:
/// each run performs a single lookup.
#[derive(Debug, Clone)]
pub struct AwsSecretsManager {
    client: SecretsClient,
}

impl AwsSecretsManager {
    /// Create a store for the given region
    pub async fn new(region: impl Into<String>) -> Self {
        let region = region.into();
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        tracing::info!("Initialized AWS Secrets Manager client in region {}", region);

        Self {
            client: SecretsClient::new(&config),
        }
    }

    /// Wrap an already configured SDK client
    pub fn from_client(client: SecretsClient) -> Self {
        Self { client }
    }
}

impl SecretStore for AwsSecretsManager {
    fn get_secret(
        &self,
        name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<String, SecretError>> + Send + '_>> {
        let name = name.to_string();

        Box::pin(async move {
            tracing::debug!("Fetching secret {} from AWS Secrets Manager", name);

            let response = self
                .client
                .get_secret_value()
                .secret_id(&name)
                .version_stage(CURRENT_VERSION_STAGE)
                .send()
                .await
                .map_err(|e| {
                    let error_msg = format!("{:?}", e);
                    tracing::error!("Failed to fetch secret {}: {}", name, e);
                    if error_msg.contains("ResourceNotFoundException") {
                        SecretError::NotFound(name.clone())
                    } else if error_msg.contains("AccessDeniedException") {
                        SecretError::AccessDenied(name.clone())
                    } else {
                        SecretError::Backend(e.to_string())
                    }
                })?;

            let value = response
                .secret_string()
                .ok_or_else(|| {
                    SecretError::InvalidFormat(format!("Secret {} is binary, not string", name))
                })?
                .to_string();

            tracing::debug!(
                "Fetched secret {} (version={:?})",
                name,
                response.version_id()
            );
            Ok(value)
        })
    }
}

/// In-memory store for tests and local wiring
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretStore {
    secrets: HashMap<String, String>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret (builder pattern)
    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

impl SecretStore for InMemorySecretStore {
    fn get_secret(
        &self,
        name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<String, SecretError>> + Send + '_>> {
        let result = self
            .secrets
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(name.to_string()));

        Box::pin(async move { result })
    }
}
