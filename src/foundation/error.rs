use std::time::Duration;

/// Convenience result type used across motionforge.
pub type MotionResult<T> = Result<T, MotionError>;

/// Error taxonomy surfaced to callers of the generation pipeline.
///
/// Strategy internals may produce [`MotionError::Other`] while plumbing lower-level failures;
/// strategies normalize those into one of the classified kinds before returning.
#[derive(thiserror::Error, Debug)]
pub enum MotionError {
    /// Malformed input (empty or undecodable image, disallowed duration, bad config value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The inference provider rejected or could not accept the job.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The remote job reached `failed`, or succeeded without a usable output reference.
    #[error("job failed: {0}")]
    JobFailed(String),

    /// The local encoder could not start or errored mid-stream.
    #[error("encoder failure: {0}")]
    EncoderFailure(String),

    /// The caller abandoned the operation before completion.
    #[error("generation cancelled")]
    Cancelled,

    /// The configured wait budget was exhausted before a terminal state was reached.
    #[error("generation timed out after {waited:?} ({attempts} status polls)")]
    Timeout {
        /// Time spent waiting.
        waited: Duration,
        /// Status polls performed before giving up (0 when the deadline was caller-imposed).
        attempts: u32,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Copyable classification of a [`MotionError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`MotionError::InvalidRequest`].
    InvalidRequest,
    /// See [`MotionError::ProviderUnavailable`].
    ProviderUnavailable,
    /// See [`MotionError::JobFailed`].
    JobFailed,
    /// See [`MotionError::EncoderFailure`].
    EncoderFailure,
    /// See [`MotionError::Cancelled`].
    Cancelled,
    /// See [`MotionError::Timeout`].
    Timeout,
    /// An unclassified internal error. Never returned by `Generator::generate`.
    Internal,
}

impl ErrorKind {
    /// `true` for user-initiated cancellation, which callers usually should not report as a failure.
    pub fn is_user_cancellation(self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl MotionError {
    /// Build a [`MotionError::InvalidRequest`] value.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Build a [`MotionError::ProviderUnavailable`] value.
    pub fn provider_unavailable(msg: impl Into<String>) -> Self {
        Self::ProviderUnavailable(msg.into())
    }

    /// Build a [`MotionError::JobFailed`] value.
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    /// Build a [`MotionError::EncoderFailure`] value.
    pub fn encoder_failure(msg: impl Into<String>) -> Self {
        Self::EncoderFailure(msg.into())
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::ProviderUnavailable(_) => ErrorKind::ProviderUnavailable,
            Self::JobFailed(_) => ErrorKind::JobFailed,
            Self::EncoderFailure(_) => ErrorKind::EncoderFailure,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// The human-readable detail without the kind prefix.
    ///
    /// For provider-originated errors this is the provider's message verbatim.
    pub fn message(&self) -> String {
        match self {
            Self::InvalidRequest(m)
            | Self::ProviderUnavailable(m)
            | Self::JobFailed(m)
            | Self::EncoderFailure(m) => m.clone(),
            Self::Other(e) => format!("{e:#}"),
            Self::Cancelled | Self::Timeout { .. } => self.to_string(),
        }
    }

    /// Re-home an unclassified [`MotionError::Other`] under `fallback`; classified errors pass
    /// through unchanged.
    pub fn classify_other(self, fallback: fn(String) -> MotionError) -> Self {
        match self {
            Self::Other(e) => fallback(format!("{e:#}")),
            classified => classified,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
