//! Analysis service access.
//!
//! [`AnalysisService`] is the seam between the synchronization engine and
//! the remote service. [`HttpAnalysisService`] speaks the service's JSON
//! API over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::ServiceError;
use crate::state::{Payload, Snapshot, TaskId, TaskStatus};

/// The two operations the engine needs from the analysis service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisService: Send + Sync + 'static {
    /// Starts an analysis of `url` and returns the id to poll.
    async fn submit(&self, url: &str) -> Result<TaskId, ServiceError>;

    /// Fetches the current state of a task.
    async fn poll(&self, task_id: &TaskId) -> Result<Snapshot, ServiceError>;
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    task_id: Option<String>,
}

/// Body of `GET /status/{task_id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    status: String,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    logs: Option<Vec<String>>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl StatusBody {
    pub(crate) fn into_snapshot(self) -> Result<Snapshot, ServiceError> {
        let status = match self.status.as_str() {
            // The service reports "pending" until its worker picks the job up.
            "pending" | "processing" => TaskStatus::Processing,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            _ => return Err(ServiceError::UnknownStatus(self.status)),
        };

        let progress = self
            .progress
            .filter(|p| p.is_finite())
            .map(|p| p.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(0);

        let mut snapshot = Snapshot::new(status, progress).observed_at(Utc::now());
        snapshot.logs = self.logs;
        snapshot.error = self.error;

        if status == TaskStatus::Completed {
            match self.data {
                Some(data) if !data.is_null() => snapshot.payload = Some(Payload::new(data)),
                _ => return Err(ServiceError::MissingPayload),
            }
        }

        Ok(snapshot)
    }
}

/// HTTP client for the analysis service.
#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        Self::new(config.base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn submit(&self, url: &str) -> Result<TaskId, ServiceError> {
        let response = self
            .client
            .post(self.endpoint("analyze"))
            .json(&SubmitRequest { url })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                code: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let parsed: SubmitResponse = serde_json::from_slice(&body)?;
        let task_id = parsed
            .task_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(ServiceError::MissingTaskId)?;

        debug!(task_id = %task_id, "analysis accepted");
        Ok(TaskId::new(task_id))
    }

    async fn poll(&self, task_id: &TaskId) -> Result<Snapshot, ServiceError> {
        let response = self
            .client
            .get(self.endpoint(&format!("status/{task_id}")))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(ServiceError::UnknownTask(task_id.clone())),
            status if !status.is_success() => {
                return Err(ServiceError::Status {
                    code: status.as_u16(),
                })
            }
            _ => {}
        }

        let body = response.bytes().await?;
        let parsed: StatusBody = serde_json::from_slice(&body)?;
        parsed.into_snapshot()
    }
}
