//! Client for the board REST API.
//!
//! The API owns every piece of state. [`BoardApi`] is the seam the view
//! talks through; [`HttpBoardApi`] is the reqwest implementation used by the
//! binary.

use crate::error::{ApiError, AppError};
use crate::model::{BoardSnapshot, Column, ProjectId, TagId, TaskId, UserId};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Body of `PUT /api/tasks/{id}`. Only the fields that are set are sent.
#[derive(Debug, Serialize, Default, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<Column>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// `Some(None)` is sent as `null` and clears the assignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<Option<UserId>>,
}

impl TaskUpdate {
    pub fn moved(column: Column, position: usize) -> Self {
        Self {
            column: Some(column),
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn assign(user: Option<UserId>) -> Self {
        Self {
            assigned_user_id: Some(user),
            ..Self::default()
        }
    }
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub project_id: ProjectId,
    pub column: Column,
}

#[derive(Debug, Serialize)]
struct TagLink {
    tag_id: TagId,
}

#[async_trait]
pub trait BoardApi: Send + Sync {
    async fn fetch_board(&self, project_code: &str) -> Result<BoardSnapshot, ApiError>;
    async fn update_task(&self, id: TaskId, update: &TaskUpdate) -> Result<(), ApiError>;
    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError>;
    async fn create_task(&self, task: &NewTask) -> Result<(), ApiError>;
    async fn add_tag(&self, task: TaskId, tag: TagId) -> Result<(), ApiError>;
    async fn remove_tag(&self, task: TaskId, tag: TagId) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct HttpBoardApi {
    client: Client,
    base: Url,
    base_url: String,
}

impl HttpBoardApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("invalid API URL {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(AppError::Config(format!("invalid API URL {base_url}")));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::HttpClient)?;
        Ok(Self {
            client,
            base,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The project code is user input, so it goes in as one escaped segment.
    fn project_url(&self, project_code: &str) -> String {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "projects", project_code]);
        }
        url.into()
    }

    async fn send(
        &self,
        method: &'static str,
        url: String,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        debug!(method, url = %url, "sending request");
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method,
                url,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    async fn fetch_board(&self, project_code: &str) -> Result<BoardSnapshot, ApiError> {
        let url = self.project_url(project_code);
        let request = self.client.get(&url);
        let response = self.send("GET", url.clone(), request).await?;
        let body = response.text().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;
        let snapshot: BoardSnapshot =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode {
                url,
                message: e.to_string(),
            })?;
        Ok(snapshot.normalized())
    }

    async fn update_task(&self, id: TaskId, update: &TaskUpdate) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/tasks/{id}"));
        let request = self.client.put(&url).json(update);
        self.send("PUT", url, request).await?;
        Ok(())
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/tasks/{id}"));
        let request = self.client.delete(&url);
        self.send("DELETE", url, request).await?;
        Ok(())
    }

    async fn create_task(&self, task: &NewTask) -> Result<(), ApiError> {
        let url = self.url("/api/tasks");
        let request = self.client.post(&url).json(task);
        self.send("POST", url, request).await?;
        Ok(())
    }

    async fn add_tag(&self, task: TaskId, tag: TagId) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/tasks/{task}/tags"));
        let body = TagLink { tag_id: tag };
        let request = self.client.post(&url).json(&body);
        self.send("POST", url, request).await?;
        Ok(())
    }

    async fn remove_tag(&self, task: TaskId, tag: TagId) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/tasks/{task}/tags/{tag}"));
        let request = self.client.delete(&url);
        self.send("DELETE", url, request).await?;
        Ok(())
    }
}
