//! Wire types for the MyDataHelps administration API.
//!
//! Field names follow the platform's camelCase JSON. Fields the reminder
//! flow does not read are kept in `extra` so nothing is lost when a
//! resource is logged or passed back.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Survey task status used when querying for pending work
pub const STATUS_INCOMPLETE: &str = "incomplete";

/// Survey task status used when closing a task
pub const STATUS_CLOSED: &str = "closed";

/// A participant's survey task
///
/// Every field is optional: a task the platform returns without a survey
/// name simply matches no mapping pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SurveyTask {
    /// Convenience constructor for a task with no extra fields
    pub fn new(
        participant_identifier: impl Into<String>,
        survey_name: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            participant_identifier: Some(participant_identifier.into()),
            survey_name: Some(survey_name.into()),
            status: Some(status.into()),
            extra: Map::new(),
        }
    }
}

/// Response of the survey task listing endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyTaskPage {
    #[serde(default, deserialize_with = "tolerant_tasks")]
    pub survey_tasks: Vec<SurveyTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_survey_tasks: Option<u64>,
}

/// Decode each listed task on its own, dropping only the ones that are not
/// task objects at all
fn tolerant_tasks<'de, D>(deserializer: D) -> Result<Vec<SurveyTask>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(task) => Some(task),
            Err(e) => {
                tracing::warn!("Skipping unreadable survey task at index {}: {}", index, e);
                None
            }
        })
        .collect())
}

/// Query parameters for the survey task listing endpoint
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyTaskQuery {
    pub participant_identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_category: Option<String>,
}

impl SurveyTaskQuery {
    /// Incomplete tasks for a participant, optionally limited to one category
    pub fn incomplete(
        participant_identifier: impl Into<String>,
        survey_category: Option<String>,
    ) -> Self {
        Self {
            participant_identifier: participant_identifier.into(),
            status: Some(STATUS_INCOMPLETE.to_string()),
            survey_category,
        }
    }
}

/// A survey task to assign to a participant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSurveyTask {
    pub participant_identifier: String,
    pub survey_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of a task status update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusUpdate {
    pub status: String,
}

/// One entry of a notification create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub participant_identifier: String,
    pub notification_identifier: String,
    /// Always sent as an empty object
    #[serde(default)]
    pub notification_fields: Map<String, Value>,
}

impl NotificationRequest {
    pub fn new(
        participant_identifier: impl Into<String>,
        notification_identifier: impl Into<String>,
    ) -> Self {
        Self {
            participant_identifier: participant_identifier.into(),
            notification_identifier: notification_identifier.into(),
            notification_fields: Map::new(),
        }
    }
}

/// A project participant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub participant_identifier: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of the participant listing endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantPage {
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_participants: Option<u64>,
}
