//! MyDataHelps survey reminders
//!
//! A Rust library for sending reminder notifications to participants of a
//! MyDataHelps project who still have incomplete survey tasks.
//!
//! This crate provides:
//! - Service account authentication (RS256 client assertion exchanged for an access token)
//! - An authenticated administration API client with uniform error handling
//! - Survey to notification mapping and the reminder dispatch loop
//! - Credential resolution from the environment or AWS Secrets Manager
//!
//! # Example
//!
//! ```no_run
//! use mdh_reminders::{
//!     run_reminders, AwsSecretsManager, InvocationArgs, ReminderConfig, SecretStore,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ReminderConfig::from_env()?;
//!
//! let store = if config.is_production() {
//!     Some(AwsSecretsManager::new(config.aws_region.clone()).await)
//! } else {
//!     None
//! };
//!
//! let args = InvocationArgs::for_participant("participant-123");
//! let summary = run_reminders(
//!     &config,
//!     store.as_ref().map(|s| s as &dyn SecretStore),
//!     &args,
//! )
//! .await?;
//!
//! println!("Sent {} reminder(s)", summary.notifications_sent);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatch;
pub mod mdh_api;
pub mod secrets;

// Re-export commonly used types and functions
pub use config::{
    resolve_credentials, ConfigError, MappingPair, NotificationMapping, ProjectCredentials,
    ReminderConfig, RuntimeEnvironment,
};
pub use dispatch::{
    plan_notifications, run_reminders, DispatchSummary, InvocationArgs,
    SurveyNotificationDispatcher,
};
pub use mdh_api::{
    client::MdhClient,
    resources::{
        NewSurveyTask, NotificationRequest, Participant, ParticipantPage, SurveyTask,
        SurveyTaskPage, SurveyTaskQuery,
    },
    token::{sign_assertion, AccessToken, Assertion, ServiceAccountCredential, TokenIssuer},
    types::{ApiError, MdhError},
};
pub use secrets::{AwsSecretsManager, InMemorySecretStore, SecretError, SecretStore};
