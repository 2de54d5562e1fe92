//! Job submission against the processing backend.
//!
//! This module is intentionally thin — it packages accepted input into the
//! wire format, attaches a fresh idempotency token, and maps HTTP outcomes
//! onto the error taxonomy. Endpoint resolution and the invalidate-and-retry
//! cycle live in [`crate::endpoint`]; admission policy lives in
//! [`crate::quota`].

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::endpoint::{EndpointResolver, HttpDiscovery};
use crate::error::IngestError;
use crate::job::{Job, JobStatus, TaskKind};

/// Input for one job submission: the task to run and where the packaged
/// batch lives. Upload and ZIP packaging happen upstream; only the locator
/// crosses this boundary.
#[derive(Debug, Clone)]
pub struct Submission {
    pub task: TaskKind,
    pub zip_url: String,
    pub session_id: String,
    pub owner_id: String,
}

/// Wire shape of the job-creation request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
    task: TaskKind,
    zip_url: String,
    session_id: String,
    user_id: String,
}

/// Wire shape of the job-creation response.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
    status: JobStatus,
}

/// Submits jobs to the processing backend through the resolved endpoint.
pub struct JobSubmitter {
    resolver: Arc<EndpointResolver>,
    http: reqwest::Client,
}

impl JobSubmitter {
    /// Build a submitter with HTTP endpoint discovery from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, IngestError> {
        let discovery = Arc::new(HttpDiscovery::new(config)?);
        Self::with_resolver(Arc::new(EndpointResolver::new(discovery)), config)
    }

    /// Build a submitter around an existing resolver (shared cache, custom
    /// discovery).
    pub fn with_resolver(
        resolver: Arc<EndpointResolver>,
        config: &ClientConfig,
    ) -> Result<Self, IngestError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| IngestError::Internal(e.to_string()))?;
        Ok(Self { resolver, http })
    }

    /// The endpoint resolver backing this submitter.
    pub fn resolver(&self) -> &Arc<EndpointResolver> {
        &self.resolver
    }

    /// Submit a job and return the client-held record with status `STARTED`.
    ///
    /// Every call generates a fresh idempotency token — a new logical
    /// submission is never deduplicated client-side; collapsing duplicate
    /// retries of the same request is the backend's job, keyed off the token.
    ///
    /// # Errors
    /// * [`IngestError::SubmissionRejected`] — any non-2xx response, body
    ///   verbatim
    /// * [`IngestError::ConfigUnavailable`] — both resolution attempts failed
    /// * [`IngestError::Network`] — transport failure after the retry cycle
    pub async fn submit(&self, submission: &Submission) -> Result<Job, IngestError> {
        let idempotency_key = Uuid::new_v4().to_string();
        info!(
            "submitting {} job for session {} (key {})",
            submission.task, submission.session_id, idempotency_key
        );

        let response = self
            .resolver
            .with_retry(|base| {
                let http = self.http.clone();
                let key = idempotency_key.clone();
                let body = SubmitRequest {
                    task: submission.task,
                    zip_url: submission.zip_url.clone(),
                    session_id: submission.session_id.clone(),
                    user_id: submission.owner_id.clone(),
                };
                async move {
                    let url = jobs_url(&base);
                    debug!("POST {}", url);
                    let resp = http
                        .post(&url)
                        .header("X-Idempotency-Key", key.as_str())
                        .json(&body)
                        .send()
                        .await
                        .map_err(|e| IngestError::Network {
                            detail: e.to_string(),
                        })?;

                    let status = resp.status();
                    if !status.is_success() {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(IngestError::SubmissionRejected {
                            status: status.as_u16(),
                            body,
                        });
                    }

                    resp.json::<SubmitResponse>()
                        .await
                        .map_err(|e| IngestError::Internal(format!(
                            "malformed submission response: {e}"
                        )))
                }
            })
            .await?;

        info!("job {} accepted", response.job_id);
        let now = Utc::now();
        Ok(Job {
            id: response.job_id,
            task: submission.task,
            status: response.status,
            result_url: None,
            error: None,
            session_id: submission.session_id.clone(),
            owner_id: submission.owner_id.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Job-creation URL under a backend base, tolerant of a trailing slash.
fn jobs_url(base: &str) -> String {
    format!("{}/jobs", base.trim_end_matches('/'))
}
