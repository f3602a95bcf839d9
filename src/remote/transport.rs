use async_trait::async_trait;
use thiserror::Error;

use crate::foundation::error::MotionError;
use crate::remote::wire::{CreateJobRequest, CreatedJob, JobSnapshot, ProviderErrorBody};

/// Provider-level failures, before classification into [`MotionError`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection, TLS or timeout failure.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status.
    #[error("provider error (status {status}): {}", .detail.as_deref().unwrap_or(.body))]
    Api {
        /// HTTP status code.
        status: u16,
        /// `detail` from the error payload, when present.
        detail: Option<String>,
        /// Raw response body.
        body: String,
    },

    /// Response body did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

impl ProviderError {
    /// Build an `Api` error from a status and raw body, extracting `detail` when the body is the
    /// provider's JSON error payload.
    pub fn api(status: u16, body: String) -> Self {
        let detail = serde_json::from_str::<ProviderErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail_text());
        ProviderError::Api {
            status,
            detail,
            body,
        }
    }

    /// Classify a failed submission. The provider's `detail` is kept verbatim.
    pub fn into_submit_error(self) -> MotionError {
        match self {
            ProviderError::Api {
                detail: Some(detail),
                ..
            } => MotionError::provider_unavailable(detail),
            ProviderError::Api { status, .. } => {
                tracing::debug!(status, "submission rejected without detail");
                MotionError::provider_unavailable("Failed to start job.")
            }
            other => MotionError::provider_unavailable(other.to_string()),
        }
    }

    /// `true` for failures a later status request may not repeat: network errors, `429` and
    /// `5xx` responses.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Network(_) => true,
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Parse(_) => false,
        }
    }

    /// Classify a failed status request.
    pub fn into_poll_error(self) -> MotionError {
        MotionError::provider_unavailable(self.to_string())
    }
}

/// Outbound calls to the inference provider.
#[async_trait]
pub trait JobTransport: Send + Sync {
    /// `POST /jobs`.
    async fn create_job(&self, request: &CreateJobRequest) -> Result<CreatedJob, ProviderError>;

    /// `GET /jobs/{id}`.
    async fn get_job(&self, job_id: &str) -> Result<JobSnapshot, ProviderError>;
}

/// [`JobTransport`] over HTTPS with bearer authentication.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Transport rooted at `base_url` (for example `https://api.deapi.ai/v2`).
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    /// Transport sharing an existing `reqwest` client.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            token: token.into(),
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ProviderError::api(status.as_u16(), body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl JobTransport for HttpTransport {
    async fn create_job(&self, request: &CreateJobRequest) -> Result<CreatedJob, ProviderError> {
        let url = format!("{}/jobs", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn get_job(&self, job_id: &str) -> Result<JobSnapshot, ProviderError> {
        let url = format!("{}/jobs/{}", self.base_url, job_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::read_json(resp).await
    }
}
