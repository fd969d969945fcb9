use crate::mdh_api::resources::{
    NewSurveyTask, NotificationRequest, ParticipantPage, SurveyTaskPage, SurveyTaskQuery,
    TaskStatusUpdate, STATUS_CLOSED,
};
use crate::mdh_api::token::AccessToken;
use crate::mdh_api::types::{ApiError, MdhError};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Default MyDataHelps platform base URL
pub const DEFAULT_BASE_URL: &str = "https://designer.mydatahelps.org";

const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// HTTP client for the MyDataHelps administration API
///
/// Every request carries `Authorization: Bearer <token>`, `Accept:
/// application/json` and `Content-Type: application/json; charset=utf-8`.
/// Only HTTP 200 counts as success: any other status is logged with its body
/// and returned as [`ApiError::Http`], and the body is never handed back as
/// data. Transport failures are logged and returned the same way. There is
/// no retry and no timeout beyond the transport defaults.
#[derive(Debug, Clone)]
pub struct MdhClient {
    /// Base URL for the platform (scheme + host)
    base_url: String,
    /// HTTP client for making requests
    client: reqwest::Client,
}

impl MdhClient {
    /// Create a new client for the given base URL
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mdh_reminders::MdhClient;
    ///
    /// let client = MdhClient::new("https://designer.mydatahelps.org");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client sharing an existing HTTP client
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::debug!("Creating MdhClient with base URL: {}", base_url);

        Self { base_url, client }
    }

    /// Get the base URL for this client
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` with the given query parameters
    pub async fn read<T, Q>(
        &self,
        token: &AccessToken,
        path: &str,
        query: &Q,
    ) -> Result<T, MdhError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, token, path).query(query);
        self.execute(request, "GET", path).await
    }

    /// POST `body` as JSON to `path`
    pub async fn create<T, B>(
        &self,
        token: &AccessToken,
        path: &str,
        body: &B,
    ) -> Result<T, MdhError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.json_request(Method::POST, token, path, body)?;
        self.execute(request, "POST", path).await
    }

    /// PUT `body` as JSON to `path`
    pub async fn update<T, B>(
        &self,
        token: &AccessToken,
        path: &str,
        body: &B,
    ) -> Result<T, MdhError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.json_request(Method::PUT, token, path, body)?;
        self.execute(request, "PUT", path).await
    }

    fn request(&self, method: Method, token: &AccessToken, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);

        self.client
            .request(method, url)
            .header("Authorization", token.bearer())
            .header("Accept", "application/json")
            .header("Content-Type", CONTENT_TYPE_JSON)
    }

    fn json_request<B>(
        &self,
        method: Method,
        token: &AccessToken,
        path: &str,
        body: &B,
    ) -> Result<RequestBuilder, MdhError>
    where
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body).map_err(|e| {
            tracing::error!("Failed to serialize request body for {}: {}", path, e);
            ApiError::Request(format!("Failed to serialize request body: {}", e))
        })?;

        Ok(self.request(method, token, path).body(payload))
    }

    async fn execute<T>(
        &self,
        request: RequestBuilder,
        verb: &str,
        path: &str,
    ) -> Result<T, MdhError>
    where
        T: DeserializeOwned,
    {
        tracing::debug!("Sending {} request to: {}{}", verb, self.base_url, path);

        let response = request.send().await.map_err(|e| {
            let err = ApiError::from(e);
            tracing::error!("{} {} failed: {}", verb, path, err);
            err
        })?;

        let status = response.status();
        tracing::debug!("Received response with status: {}", status);

        if status != StatusCode::OK {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                "{} {} failed: HTTP {} - {}",
                verb,
                path,
                status.as_u16(),
                error_body
            );
            return Err(MdhError::Api(ApiError::Http {
                status: status.as_u16(),
                message: error_body,
            }));
        }

        let response_text = response.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            ApiError::Parse(format!("Failed to read response: {}", e))
        })?;

        let value = if response_text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response_text).map_err(|e| {
                tracing::error!(
                    "Failed to parse response from {}: {} - Response body: {}",
                    path,
                    e,
                    response_text
                );
                ApiError::Parse(format!("Failed to parse response: {}", e))
            })?
        };

        serde_json::from_value(value).map_err(|e| {
            tracing::error!("Unexpected response shape from {}: {}", path, e);
            MdhError::Api(ApiError::Parse(format!("Unexpected response shape: {}", e)))
        })
    }

    /// List survey tasks matching the query
    pub async fn get_survey_tasks(
        &self,
        token: &AccessToken,
        project_id: &str,
        query: &SurveyTaskQuery,
    ) -> Result<SurveyTaskPage, MdhError> {
        self.read(token, &project_path(project_id, "/surveytasks"), query)
            .await
    }

    /// Assign new survey tasks to participants
    pub async fn create_survey_tasks(
        &self,
        token: &AccessToken,
        project_id: &str,
        tasks: &[NewSurveyTask],
    ) -> Result<Value, MdhError> {
        tracing::info!("Creating {} survey task(s) in project {}", tasks.len(), project_id);
        self.create(token, &project_path(project_id, "/surveytasks"), tasks)
            .await
    }

    /// Mark a survey task as closed
    pub async fn close_survey_task(
        &self,
        token: &AccessToken,
        project_id: &str,
        task_id: &str,
    ) -> Result<Value, MdhError> {
        let body = TaskStatusUpdate {
            status: STATUS_CLOSED.to_string(),
        };
        tracing::info!("Closing survey task {} in project {}", task_id, project_id);
        self.update(
            token,
            &format!(
                "{}/{}",
                project_path(project_id, "/surveytasks"),
                urlencoding::encode(task_id)
            ),
            &body,
        )
        .await
    }

    /// List all participants of the project
    pub async fn get_participants(
        &self,
        token: &AccessToken,
        project_id: &str,
    ) -> Result<ParticipantPage, MdhError> {
        let no_query: [(&str, &str); 0] = [];
        self.read(token, &project_path(project_id, "/participants"), &no_query)
            .await
    }

    /// Update participants; each entry must carry a `participantIdentifier`
    pub async fn update_participants<B>(
        &self,
        token: &AccessToken,
        project_id: &str,
        body: &B,
    ) -> Result<Value, MdhError>
    where
        B: Serialize + ?Sized,
    {
        self.update(token, &project_path(project_id, "/participants"), body)
            .await
    }

    /// Query device data points
    pub async fn get_device_data<Q>(
        &self,
        token: &AccessToken,
        project_id: &str,
        query: &Q,
    ) -> Result<Value, MdhError>
    where
        Q: Serialize + ?Sized,
    {
        self.read(token, &project_path(project_id, "/devicedatapoints"), query)
            .await
    }

    /// Send notifications to participants
    pub async fn send_notifications(
        &self,
        token: &AccessToken,
        project_id: &str,
        requests: &[NotificationRequest],
    ) -> Result<Value, MdhError> {
        self.create(token, &project_path(project_id, "/notifications"), requests)
            .await
    }
}

/// Path of a project-scoped administration resource
///
/// `project_id` is percent-encoded as a single path segment; `resource` is
/// appended as given.
pub fn project_path(project_id: &str, resource: &str) -> String {
    format!(
        "/api/v1/administration/projects/{}{}",
        urlencoding::encode(project_id),
        resource
    )
}
