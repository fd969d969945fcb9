use serde::Deserialize;

use crate::config::{ReminderConfig, ENV_AWS_SECRET_NAME, ENV_PROJECT_ID};
use crate::mdh_api::token::ServiceAccountCredential;
use crate::mdh_api::types::MdhError;
use crate::secrets::{SecretError, SecretStore};

/// Everything needed to authenticate and address one project
#[derive(Debug, Clone)]
pub struct ProjectCredentials {
    pub project_id: String,
    pub credential: ServiceAccountCredential,
}

/// JSON layout of the production secret
#[derive(Deserialize)]
struct ProjectSecret {
    #[serde(rename = "RKS_PROJECT_ID", default)]
    project_id: Option<String>,
    #[serde(rename = "RKS_SERVICE_ACCOUNT", default)]
    service_account: Option<String>,
    #[serde(rename = "RKS_PRIVATE_KEY", default)]
    private_key: Option<String>,
}

/// Resolve service account credentials for this run
///
/// In production the secret named by `AWS_SECRET_NAME` is fetched from
/// `secrets` and parsed as JSON. Otherwise `RKS_SERVICE_ACCOUNT` and
/// `RKS_PRIVATE_KEY` must both be set in the environment. Either way a
/// missing value is fatal for the run and no platform call is made.
pub async fn resolve_credentials(
    config: &ReminderConfig,
    secrets: Option<&dyn SecretStore>,
) -> Result<ProjectCredentials, MdhError> {
    let (service_account, private_key, project_id) = if config.is_production() {
        let secret_name = config.secret_name.as_deref().ok_or_else(|| {
            fatal(format!("{} must be set in production", ENV_AWS_SECRET_NAME))
        })?;
        let store = secrets
            .ok_or_else(|| fatal("No secret store available in production".to_string()))?;

        let raw = store.get_secret(secret_name).await.map_err(|e| {
            tracing::error!("Fatal Error: could not read secret {}: {}", secret_name, e);
            MdhError::Secret(e)
        })?;

        let secret: ProjectSecret = serde_json::from_str(&raw).map_err(|e| {
            tracing::error!("Fatal Error: secret {} is not valid JSON", secret_name);
            MdhError::Secret(SecretError::InvalidFormat(e.to_string()))
        })?;

        (secret.service_account, secret.private_key, secret.project_id)
    } else {
        let local = &config.local_credentials;
        if local.service_account.is_some() && local.private_key.is_some() {
            tracing::info!("Using MDH credentials from environment variables");
        }
        (
            local.service_account.clone(),
            local.private_key.clone(),
            local.project_id.clone(),
        )
    };

    let (service_account, private_key) = match (service_account, private_key) {
        (Some(account), Some(key)) if !account.is_empty() && !key.is_empty() => (account, key),
        _ => {
            return Err(fatal(
                "RKS service account and RKS private key must be set".to_string(),
            ))
        }
    };

    let project_id = project_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| fatal(format!("{} must be set", ENV_PROJECT_ID)))?;

    Ok(ProjectCredentials {
        project_id,
        credential: ServiceAccountCredential::new(service_account, private_key),
    })
}

fn fatal(message: String) -> MdhError {
    tracing::error!("Fatal Error: {}", message);
    MdhError::Config(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LocalCredentials, RuntimeEnvironment};
    use crate::secrets::InMemorySecretStore;

    fn local_config(
        account: Option<&str>,
        key: Option<&str>,
        project: Option<&str>,
    ) -> ReminderConfig {
        ReminderConfig {
            local_credentials: LocalCredentials {
                service_account: account.map(str::to_string),
                private_key: key.map(str::to_string),
                project_id: project.map(str::to_string),
            },
            ..ReminderConfig::default()
        }
    }

    fn production_config(secret_name: Option<&str>) -> ReminderConfig {
        ReminderConfig {
            environment: RuntimeEnvironment::Production,
            secret_name: secret_name.map(str::to_string),
            ..ReminderConfig::default()
        }
    }

    #[tokio::test]
    async fn test_local_credentials_resolved_and_key_unescaped() {
        let config = local_config(Some("svc"), Some("line1\\nline2"), Some("proj"));
        let resolved = resolve_credentials(&config, None).await.unwrap();

        assert_eq!(resolved.project_id, "proj");
        assert_eq!(resolved.credential.issuer_id(), "svc");
        assert_eq!(resolved.credential.private_key(), "line1\nline2");
    }

    #[tokio::test]
    async fn test_local_missing_private_key_is_fatal() {
        let config = local_config(Some("svc"), None, Some("proj"));
        let result = resolve_credentials(&config, None).await;
        assert!(matches!(result, Err(MdhError::Config(_))));
    }

    #[tokio::test]
    async fn test_local_missing_service_account_is_fatal() {
        let config = local_config(None, Some("key"), Some("proj"));
        assert!(resolve_credentials(&config, None).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_project_id_is_fatal() {
        let config = local_config(Some("svc"), Some("key"), None);
        let err = resolve_credentials(&config, None).await.unwrap_err();
        assert!(err.to_string().contains("RKS_PROJECT_ID"));
    }

    #[tokio::test]
    async fn test_local_mode_ignores_secret_store() {
        let store = InMemorySecretStore::new().with_secret(
            "mdh/prod",
            r#"{"RKS_PROJECT_ID":"p","RKS_SERVICE_ACCOUNT":"s","RKS_PRIVATE_KEY":"k"}"#,
        );
        let config = local_config(None, None, None);
        assert!(resolve_credentials(&config, Some(&store)).await.is_err());
    }

    #[tokio::test]
    async fn test_production_reads_secret_json() {
        let store = InMemorySecretStore::new().with_secret(
            "mdh/prod",
            r#"{"RKS_PROJECT_ID":"proj-9","RKS_SERVICE_ACCOUNT":"svc-9","RKS_PRIVATE_KEY":"a\\nb"}"#,
        );
        let config = production_config(Some("mdh/prod"));
        let resolved = resolve_credentials(&config, Some(&store)).await.unwrap();

        assert_eq!(resolved.project_id, "proj-9");
        assert_eq!(resolved.credential.issuer_id(), "svc-9");
        assert_eq!(resolved.credential.private_key(), "a\nb");
    }

    #[tokio::test]
    async fn test_production_without_secret_name_is_fatal() {
        let store = InMemorySecretStore::new();
        let result = resolve_credentials(&production_config(None), Some(&store)).await;
        assert!(matches!(result, Err(MdhError::Config(_))));
    }

    #[tokio::test]
    async fn test_production_missing_secret_propagates() {
        let store = InMemorySecretStore::new();
        let config = production_config(Some("mdh/prod"));
        let result = resolve_credentials(&config, Some(&store)).await;
        assert!(matches!(result, Err(MdhError::Secret(SecretError::NotFound(_)))));
    }

    #[tokio::test]
    async fn test_production_secret_not_json() {
        let store = InMemorySecretStore::new().with_secret("mdh/prod", "plain text");
        let result = resolve_credentials(&production_config(Some("mdh/prod")), Some(&store)).await;
        assert!(matches!(result, Err(MdhError::Secret(SecretError::InvalidFormat(_)))));
    }

    #[tokio::test]
    async fn test_production_secret_missing_field() {
        let store = InMemorySecretStore::new()
            .with_secret("mdh/prod", r#"{"RKS_PROJECT_ID":"p","RKS_SERVICE_ACCOUNT":"s"}"#);
        let result = resolve_credentials(&production_config(Some("mdh/prod")), Some(&store)).await;
        assert!(matches!(result, Err(MdhError::Config(_))));
    }
}
