use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::encode::sink::VideoArtifact;
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{MotionError, MotionResult};
use crate::generate::request::GenerationRequest;
use crate::remote::transport::{JobTransport, ProviderError};
use crate::remote::wire::{CreateJobRequest, JobSnapshot, JobStatus, MotionIntensity};

/// Message used when a succeeded job carries no usable output.
pub const NO_VIDEO_REFERENCE: &str = "no video reference produced";
/// Message used when a failed job carries no detail.
pub const UNKNOWN_JOB_ERROR: &str = "Unknown error";

/// A submitted remote job, updated by each poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    /// Provider-assigned identifier.
    pub id: String,
    /// Last observed status.
    pub status: JobStatus,
    /// Output reference, present once succeeded.
    pub output_url: Option<String>,
    /// Failure detail, present once failed.
    pub error_detail: Option<String>,
    /// Status requests performed so far.
    pub polls: u32,
}

impl Job {
    fn observe(&mut self, snapshot: &JobSnapshot) {
        self.polls += 1;
        self.status = snapshot.state();
        match self.status {
            JobStatus::Succeeded => {
                self.output_url = snapshot.video_url().map(str::to_string);
            }
            JobStatus::Failed => {
                self.error_detail = snapshot.error_detail().map(str::to_string);
            }
            JobStatus::Queued | JobStatus::Running => {}
        }
    }

    /// Terminal outcome of the job, or `None` while pending.
    pub fn outcome(&self) -> Option<MotionResult<VideoArtifact>> {
        match self.status {
            JobStatus::Queued | JobStatus::Running => None,
            JobStatus::Succeeded => Some(
                self.output_url
                    .clone()
                    .map(VideoArtifact::Url)
                    .ok_or_else(|| MotionError::job_failed(NO_VIDEO_REFERENCE)),
            ),
            JobStatus::Failed => Some(Err(MotionError::job_failed(
                self.error_detail
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_JOB_ERROR.to_string()),
            ))),
        }
    }
}

/// Bounds for [`RemoteJobClient::wait`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before each status request.
    pub interval: Duration,
    /// Total wait budget from the first poll delay; `None` waits indefinitely.
    pub max_wait: Option<Duration>,
    /// Maximum status requests; `None` is unbounded.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_wait: Some(Duration::from_secs(600)),
            max_attempts: None,
        }
    }
}

/// Provider parameters that do not vary per request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteJobSettings {
    /// Provider model identifier.
    pub model: String,
    /// Requested output width.
    pub width: u32,
    /// Requested output height.
    pub height: u32,
    /// Provider frame rate used to derive `num_frames`.
    pub provider_fps: u32,
}

impl Default for RemoteJobSettings {
    fn default() -> Self {
        Self {
            model: "Ltxv_13B_0_9_8_Distilled_FP8".to_string(),
            width: 1024,
            height: 576,
            provider_fps: 24,
        }
    }
}

/// Submit/poll client for one provider.
///
/// Each [`Job`] is owned by the caller; polls against a job are sequential because `poll` takes
/// it by `&mut`.
pub struct RemoteJobClient {
    transport: Arc<dyn JobTransport>,
    settings: RemoteJobSettings,
    policy: PollPolicy,
}

impl RemoteJobClient {
    /// Client over `transport`.
    pub fn new(
        transport: Arc<dyn JobTransport>,
        settings: RemoteJobSettings,
        policy: PollPolicy,
    ) -> Self {
        Self {
            transport,
            settings,
            policy,
        }
    }

    /// Poll bounds in effect.
    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Provider payload for `request`.
    pub fn job_request(&self, request: &GenerationRequest) -> MotionResult<CreateJobRequest> {
        Ok(CreateJobRequest {
            model: self.settings.model.clone(),
            prompt: request.provider_prompt(),
            image: request.image.to_data_uri()?,
            height: self.settings.height,
            width: self.settings.width,
            num_frames: request.duration.secs() * self.settings.provider_fps,
            motion_intensity: MotionIntensity::from_stabilized(request.camera_stabilized),
        })
    }

    /// Create the job. A non-success response is fatal and never retried.
    pub async fn submit(&self, request: &GenerationRequest) -> MotionResult<Job> {
        let payload = self.job_request(request)?;
        let created = self
            .transport
            .create_job(&payload)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "job submission failed");
                e.into_submit_error()
            })?;

        if created.id.trim().is_empty() {
            return Err(MotionError::provider_unavailable(
                "provider returned an empty job id",
            ));
        }

        let status = created
            .status
            .as_deref()
            .map(JobStatus::parse)
            .filter(|s| !s.is_terminal())
            .unwrap_or(JobStatus::Queued);
        tracing::info!(
            job_id = %created.id,
            model = %payload.model,
            num_frames = payload.num_frames,
            "remote job submitted"
        );

        Ok(Job {
            id: created.id,
            status,
            output_url: None,
            error_detail: None,
            polls: 0,
        })
    }

    /// One status request. Updates `job` and returns the observed status.
    pub async fn poll(&self, job: &mut Job) -> MotionResult<JobStatus> {
        self.try_poll(job)
            .await
            .map_err(ProviderError::into_poll_error)
    }

    async fn try_poll(&self, job: &mut Job) -> Result<JobStatus, ProviderError> {
        let snapshot = self.transport.get_job(&job.id).await?;
        job.observe(&snapshot);

        if job.status.is_terminal() {
            tracing::info!(job_id = %job.id, status = ?job.status, polls = job.polls, "remote job finished");
        } else {
            tracing::debug!(job_id = %job.id, status = %snapshot.status, polls = job.polls, "remote job pending");
        }
        Ok(job.status)
    }

    /// Poll `job` until it reaches a terminal state, the policy budget runs out, or `cancel`
    /// fires.
    ///
    /// Each iteration sleeps one interval and then polls. The last sleep is shortened to the
    /// remaining budget so one final poll happens at the deadline. A transient status-request
    /// failure (see [`ProviderError::is_transient`]) counts as an attempt and the job stays
    /// pending; any other failure ends the wait with `ProviderUnavailable`.
    pub async fn wait(&self, job: &mut Job, cancel: &CancelToken) -> MotionResult<VideoArtifact> {
        let started = Instant::now();

        loop {
            if let Some(outcome) = job.outcome() {
                return outcome.inspect_err(|e| {
                    tracing::warn!(job_id = %job.id, error = %e, "remote job unsuccessful");
                });
            }

            let waited = started.elapsed();
            let over_attempts = self.policy.max_attempts.is_some_and(|max| job.polls >= max);
            let remaining = self.policy.max_wait.map(|max| max.saturating_sub(waited));
            if over_attempts || remaining.is_some_and(|r| r.is_zero()) {
                tracing::warn!(job_id = %job.id, polls = job.polls, ?waited, "remote job wait exhausted");
                return Err(MotionError::Timeout {
                    waited,
                    attempts: job.polls,
                });
            }

            let delay = remaining.map_or(self.policy.interval, |r| r.min(self.policy.interval));
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(job)),
                _ = tokio::time::sleep(delay) => {}
            }
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                polled = self.try_poll(job) => Some(polled),
            };
            match polled {
                None => return Err(self.cancelled(job)),
                Some(Ok(_)) => {}
                Some(Err(e)) if e.is_transient() => {
                    job.polls += 1;
                    tracing::warn!(job_id = %job.id, polls = job.polls, error = %e, "status request failed, still pending");
                }
                Some(Err(e)) => {
                    tracing::warn!(job_id = %job.id, polls = job.polls, error = %e, "status request rejected");
                    return Err(e.into_poll_error());
                }
            }
        }
    }

    fn cancelled(&self, job: &Job) -> MotionError {
        tracing::info!(job_id = %job.id, polls = job.polls, "remote job wait cancelled");
        MotionError::Cancelled
    }
}

#[cfg(test)]
#[path = "../../tests/unit/remote/client.rs"]
mod tests;
