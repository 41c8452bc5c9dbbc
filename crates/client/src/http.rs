use crate::response::ApiResponse;
use async_trait::async_trait;
use attempt_sync_core::{
    AttemptApi, ExecutionProcess, FollowUpRequest, ProfileCatalog, ProfileVariant, SyncError,
    TaskAttempt,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Backend info as served by `/api/info`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemInfo {
    #[serde(flatten)]
    pub catalog: ProfileCatalog,
    #[serde(default)]
    pub config: BackendConfig,
}

/// The part of the user's backend configuration follow-ups care about.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BackendConfig {
    /// Profile the user picked as their default agent.
    #[serde(default)]
    pub profile: Option<ProfileVariant>,
}

#[derive(Debug, Serialize)]
struct OpenEditorRequest<'a> {
    editor_type: Option<&'a str>,
}

/// [`AttemptApi`] over the backend's JSON HTTP API.
pub struct HttpAttemptApi {
    client: Client,
    base_url: String,
}

impl HttpAttemptApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Network(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_system_info(&self) -> Result<SystemInfo, SyncError> {
        self.send(self.client.get(self.url("/api/info")))
            .await?
            .into_data()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, SyncError> {
        let response = request
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = response.status();
        let url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;
        tracing::debug!("{} {} ({} bytes)", status, url.path(), body.len());

        // Error statuses usually still carry the envelope.
        match serde_json::from_str::<ApiResponse<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => {
                Err(SyncError::Api(format!("{}: {}", status, body)))
            }
            Err(e) => Err(SyncError::Decode(e.to_string())),
        }
    }

    async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), SyncError> {
        self.send::<serde_json::Value>(self.client.post(self.url(path)).json(body))
            .await?
            .into_unit()
    }
}

#[async_trait]
impl AttemptApi for HttpAttemptApi {
    async fn list_processes(&self, attempt_id: Uuid) -> Result<Vec<ExecutionProcess>, SyncError> {
        let request = self
            .client
            .get(self.url("/api/execution-processes"))
            .query(&[("task_attempt_id", attempt_id.to_string())]);
        self.send(request).await?.into_data()
    }

    async fn get_process(&self, process_id: Uuid) -> Result<ExecutionProcess, SyncError> {
        let path = format!("/api/execution-processes/{}", process_id);
        self.send(self.client.get(self.url(&path))).await?.into_data()
    }

    async fn get_attempt(&self, attempt_id: Uuid) -> Result<TaskAttempt, SyncError> {
        let path = format!("/api/task-attempts/{}", attempt_id);
        self.send(self.client.get(self.url(&path))).await?.into_data()
    }

    async fn submit_follow_up(
        &self,
        attempt_id: Uuid,
        request: &FollowUpRequest,
    ) -> Result<(), SyncError> {
        let path = format!("/api/task-attempts/{}/follow-up", attempt_id);
        self.post_unit(&path, request).await
    }

    async fn stop_attempt(&self, attempt_id: Uuid) -> Result<(), SyncError> {
        let path = format!("/api/task-attempts/{}/stop", attempt_id);
        self.post_unit(&path, &serde_json::json!({})).await
    }

    async fn open_editor(
        &self,
        attempt_id: Uuid,
        editor_type: Option<&str>,
    ) -> Result<(), SyncError> {
        let path = format!("/api/task-attempts/{}/open-editor", attempt_id);
        self.post_unit(&path, &OpenEditorRequest { editor_type }).await
    }
}
