//! REST client for `taskzenith-server`.
//!
//! Fetches a project's tasks with `GET /api/projects/{id}/tasks` and submits
//! partial updates with `PATCH /api/tasks/{id}`. Error bodies of the form
//! `{ "message": ... }` are surfaced in [`StoreError::Status`]. Ids are
//! opaque and always sent as one percent-encoded path segment.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use url::Url;

use taskzenith_proto::api;
use taskzenith_proto::codec;
use taskzenith_proto::task::{Task, TaskId, TaskPatch};

use super::{StoreError, TaskStore};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// [`TaskStore`] backed by the `TaskZenith` REST API.
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    http: Client,
    base: Url,
}

impl HttpTaskStore {
    /// Creates a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transport`] if the URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let mut base =
            Url::parse(base_url).map_err(|e| StoreError::Transport(format!("invalid url: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("taskzenith/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self { http, base })
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(StoreError::Rejected(format!("invalid id {bad:?}")));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                StoreError::Transport(format!("base url {} cannot hold a path", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, StoreError> {
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if status.is_success() {
            return Ok(body.to_vec());
        }
        let message = codec::error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string()
        });
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(message));
        }
        Err(StoreError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

impl TaskStore for HttpTaskStore {
    async fn fetch_by_project(&self, project_id: &str) -> Result<Vec<Task>, StoreError> {
        let url = self.endpoint(&api::project_tasks_segments(project_id))?;
        tracing::debug!(%url, "fetching project tasks");
        let response = self.http.get(url).send().await.map_err(map_reqwest_error)?;
        let body = Self::read_body(response).await?;
        Ok(codec::decode_tasks(&body)?)
    }

    async fn update(&self, task_id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        let url = self.endpoint(&api::task_segments(task_id.as_str()))?;
        let payload = codec::encode_patch(patch)?;
        tracing::debug!(%url, task_id = %task_id, "patching task");
        let response = self
            .http
            .patch(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body = Self::read_body(response).await?;
        Ok(codec::decode_task(&body)?)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Transport(e.to_string())
    }
}
