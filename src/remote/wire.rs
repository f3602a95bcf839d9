//! JSON shapes exchanged with the inference provider.

use serde::{Deserialize, Serialize};

/// Body of `POST /jobs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateJobRequest {
    /// Provider model identifier.
    pub model: String,
    /// Text prompt, including the camera-movement hint.
    pub prompt: String,
    /// Source image as a base64 data URI.
    pub image: String,
    /// Output height in pixels.
    pub height: u32,
    /// Output width in pixels.
    pub width: u32,
    /// Number of frames the provider should generate.
    pub num_frames: u32,
    /// Camera motion strength.
    pub motion_intensity: MotionIntensity,
}

/// Provider motion-intensity hint derived from the camera-stability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionIntensity {
    /// Stabilized camera.
    Low,
    /// Natural, handheld-like movement.
    High,
}

impl MotionIntensity {
    /// Stabilized camera maps to low intensity, natural to high.
    pub fn from_stabilized(stabilized: bool) -> Self {
        if stabilized { Self::Low } else { Self::High }
    }
}

/// Response to `POST /jobs`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedJob {
    /// Opaque job identifier.
    pub id: String,
    /// Initial status, when reported.
    #[serde(default)]
    pub status: Option<String>,
}

/// Coarse job lifecycle as seen by the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, not started.
    Queued,
    /// In progress.
    Running,
    /// Finished with an output.
    Succeeded,
    /// Finished with an error.
    Failed,
}

impl JobStatus {
    /// Map a provider status string. Unrecognized values count as still running.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" | "pending" | "submitted" | "starting" => Self::Queued,
            "running" | "processing" | "in_progress" => Self::Running,
            "succeeded" | "success" | "completed" | "done" => Self::Succeeded,
            "failed" | "error" | "canceled" | "cancelled" => Self::Failed,
            other => {
                tracing::debug!(status = other, "unrecognized job status; treating as running");
                Self::Running
            }
        }
    }

    /// `true` for `Succeeded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// One entry of the `outputs` array.
#[derive(Debug, Clone, Deserialize)]
pub struct JobOutput {
    /// Location of the generated video.
    #[serde(default)]
    pub url: Option<String>,
}

/// The direct `output` field: either a bare URL or an object carrying one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OutputField {
    /// `"output": "https://..."`
    Url(String),
    /// `"output": {"url": "https://..."}`
    Object {
        /// Location of the generated video.
        #[serde(default)]
        url: Option<String>,
    },
}

/// Response to `GET /jobs/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSnapshot {
    /// Job identifier, when echoed back.
    #[serde(default)]
    pub id: Option<String>,
    /// Raw provider status string.
    pub status: String,
    /// Output collection (preferred shape).
    #[serde(default)]
    pub outputs: Option<Vec<JobOutput>>,
    /// Direct output field (fallback shape).
    #[serde(default)]
    pub output: Option<OutputField>,
    /// Failure detail for failed jobs.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl JobSnapshot {
    /// Parsed lifecycle state.
    pub fn state(&self) -> JobStatus {
        JobStatus::parse(&self.status)
    }

    /// Video reference of a finished job: `outputs[0].url` first, then `output`.
    /// Blank values count as absent.
    pub fn video_url(&self) -> Option<&str> {
        let from_outputs = self
            .outputs
            .as_deref()
            .and_then(|outputs| outputs.first())
            .and_then(|o| o.url.as_deref());
        let from_output = match &self.output {
            Some(OutputField::Url(url)) => Some(url.as_str()),
            Some(OutputField::Object { url }) => url.as_deref(),
            None => None,
        };
        from_outputs
            .filter(|u| !u.trim().is_empty())
            .or_else(|| from_output.filter(|u| !u.trim().is_empty()))
    }

    /// Non-blank failure detail.
    pub fn error_detail(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// Error payload returned with non-success responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderErrorBody {
    /// Human-readable reason; some providers send a structured value.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ProviderErrorBody {
    /// `detail` rendered as text; structured details are serialized back to JSON.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.trim().is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/remote/wire.rs"]
mod tests;
