//! Survey reminder dispatch
//!
//! A run is strictly linear: resolve credentials, issue a token, read the
//! participant's incomplete survey tasks, then walk tasks × mapping pairs in
//! order and send one notification per matching pair. Only a missing
//! credential or a failed token issuance aborts the run. A failed task read
//! or a failed send is logged and the run still completes.
//!
//! Nothing is remembered between runs, so running again after a partial
//! failure resends every notification that matches.

use crate::config::{resolve_credentials, NotificationMapping, ProjectCredentials, ReminderConfig};
use crate::mdh_api::client::MdhClient;
use crate::mdh_api::resources::{NotificationRequest, SurveyTask, SurveyTaskQuery};
use crate::mdh_api::token::TokenIssuer;
use crate::mdh_api::types::MdhError;
use crate::secrets::SecretStore;

/// Per-invocation arguments
#[derive(Debug, Clone, Default)]
pub struct InvocationArgs {
    /// Survey identifier; accepted but not used by the dispatch path
    pub survey_id: Option<String>,
    /// Notification identifier; recorded only, mapped ids are what get sent
    pub notification_id: Option<String>,
    /// Participant whose tasks are checked and who receives reminders
    pub participant_id: String,
}

impl InvocationArgs {
    pub fn for_participant(participant_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            ..Self::default()
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// The task read failed and was treated as an empty list
    pub task_read_failed: bool,
    pub tasks_examined: usize,
    pub notifications_attempted: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

/// Sends reminder notifications for incomplete survey tasks
#[derive(Debug, Clone)]
pub struct SurveyNotificationDispatcher {
    client: MdhClient,
    issuer: TokenIssuer,
    mapping: NotificationMapping,
    survey_category: Option<String>,
}

impl SurveyNotificationDispatcher {
    /// Build a dispatcher from loaded configuration
    pub fn new(config: &ReminderConfig) -> Self {
        let http = reqwest::Client::new();
        let client = MdhClient::with_client(config.base_url.clone(), http.clone());
        let issuer = TokenIssuer::with_client(config.base_url.clone(), http)
            .with_validity_secs(config.token_validity_secs);

        Self::from_parts(
            client,
            issuer,
            config.notification_mapping.clone(),
            config.survey_category.clone(),
        )
    }

    pub fn from_parts(
        client: MdhClient,
        issuer: TokenIssuer,
        mapping: NotificationMapping,
        survey_category: Option<String>,
    ) -> Self {
        Self {
            client,
            issuer,
            mapping,
            survey_category,
        }
    }

    pub fn mapping(&self) -> &NotificationMapping {
        &self.mapping
    }

    /// Run the reminder flow for one participant
    ///
    /// Returns `Err` only when no access token could be obtained, in which
    /// case no API call has been made.
    pub async fn run(
        &self,
        credentials: &ProjectCredentials,
        args: &InvocationArgs,
    ) -> Result<DispatchSummary, MdhError> {
        if let Some(sid) = &args.survey_id {
            tracing::debug!("Survey identifier {} supplied; not used for dispatch", sid);
        }
        if let Some(nid) = &args.notification_id {
            tracing::debug!(
                "Notification identifier {} supplied; mapped identifiers are sent instead",
                nid
            );
        }

        let token = self.issuer.issue_token(&credentials.credential).await?;
        let project_id = credentials.project_id.as_str();
        let participant = args.participant_id.as_str();

        let mut summary = DispatchSummary::default();

        let query = SurveyTaskQuery::incomplete(participant, self.survey_category.clone());
        let tasks = match self
            .client
            .get_survey_tasks(&token, project_id, &query)
            .await
        {
            Ok(page) => page.survey_tasks,
            Err(e) => {
                tracing::warn!(
                    "Could not read incomplete survey tasks for participant {}: {}",
                    participant,
                    e
                );
                summary.task_read_failed = true;
                Vec::new()
            }
        };

        summary.tasks_examined = tasks.len();
        tracing::info!(
            "Participant {} has {} incomplete survey task(s)",
            participant,
            tasks.len()
        );

        for request in plan_notifications(&tasks, &self.mapping, participant) {
            summary.notifications_attempted += 1;

            match self
                .client
                .send_notifications(&token, project_id, std::slice::from_ref(&request))
                .await
            {
                Ok(_) => {
                    summary.notifications_sent += 1;
                    tracing::info!(
                        "Sending out reminder notification with ID - {} to participant {}",
                        request.notification_identifier,
                        participant
                    );
                }
                Err(e) => {
                    summary.notifications_failed += 1;
                    tracing::error!(
                        "Failed to send notification {} to participant {}: {}",
                        request.notification_identifier,
                        participant,
                        e
                    );
                }
            }
        }

        tracing::info!(
            "Reminder run complete: {} attempted, {} sent, {} failed",
            summary.notifications_attempted,
            summary.notifications_sent,
            summary.notifications_failed
        );
        Ok(summary)
    }
}

/// Notification requests for every (task, matching pair) combination
///
/// Ordered by task, then by configured pair order. A task can yield zero,
/// one, or several requests.
pub fn plan_notifications(
    tasks: &[SurveyTask],
    mapping: &NotificationMapping,
    participant_id: &str,
) -> Vec<NotificationRequest> {
    tasks
        .iter()
        .filter_map(|task| match task.survey_name.as_deref() {
            Some(survey_name) => Some(survey_name),
            None => {
                tracing::warn!("Skipping survey task without a survey name: {:?}", task.id);
                None
            }
        })
        .flat_map(|survey_name| {
            mapping.matches(survey_name).map(move |pair| {
                NotificationRequest::new(participant_id, pair.notification_id.clone())
            })
        })
        .collect()
}

/// Resolve credentials and run the dispatcher built from `config`
///
/// `secrets` is only consulted in production.
pub async fn run_reminders(
    config: &ReminderConfig,
    secrets: Option<&dyn SecretStore>,
    args: &InvocationArgs,
) -> Result<DispatchSummary, MdhError> {
    let credentials = resolve_credentials(config, secrets).await?;
    SurveyNotificationDispatcher::new(config)
        .run(&credentials, args)
        .await
}
