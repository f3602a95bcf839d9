use crate::assets::decode::{PreparedImage, SourceImage};
use crate::foundation::error::{MotionError, MotionResult};
use crate::motion::model::MotionStyle;

/// Allowed clip lengths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum DurationSecs {
    /// Five seconds.
    #[default]
    Five,
    /// Ten seconds.
    Ten,
}

impl DurationSecs {
    /// Length in whole seconds.
    pub fn secs(self) -> u32 {
        match self {
            Self::Five => 5,
            Self::Ten => 10,
        }
    }
}

impl TryFrom<u32> for DurationSecs {
    type Error = MotionError;

    fn try_from(secs: u32) -> Result<Self, Self::Error> {
        match secs {
            5 => Ok(Self::Five),
            10 => Ok(Self::Ten),
            other => Err(MotionError::invalid_request(format!(
                "duration must be 5 or 10 seconds, got {other}"
            ))),
        }
    }
}

impl From<DurationSecs> for u32 {
    fn from(d: DurationSecs) -> Self {
        d.secs()
    }
}

/// Everything a caller supplies for one clip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Source still image.
    pub image: SourceImage,
    /// Optional scene description (remote strategy only).
    pub prompt: Option<String>,
    /// Camera movement.
    pub motion: MotionStyle,
    /// Clip length.
    pub duration: DurationSecs,
    /// Keep the camera steady (remote strategy: low motion intensity).
    pub camera_stabilized: bool,
}

impl GenerationRequest {
    /// Request with default motion, no prompt and a natural camera.
    pub fn new(image: SourceImage, duration: DurationSecs) -> Self {
        Self {
            image,
            prompt: None,
            motion: MotionStyle::default(),
            duration,
            camera_stabilized: false,
        }
    }

    /// Build from loosely typed inputs as received at an outer boundary.
    ///
    /// The motion identifier is lenient; the duration is not.
    pub fn from_parts(
        image: SourceImage,
        prompt: Option<String>,
        motion: &str,
        duration_secs: u32,
        camera_stabilized: bool,
    ) -> MotionResult<Self> {
        Ok(Self {
            image,
            prompt,
            motion: MotionStyle::parse(motion),
            duration: DurationSecs::try_from(duration_secs)?,
            camera_stabilized,
        })
    }

    /// Set the prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the motion style.
    pub fn with_motion(mut self, motion: MotionStyle) -> Self {
        self.motion = motion;
        self
    }

    /// Set the camera-stability flag.
    pub fn with_camera_stabilized(mut self, stabilized: bool) -> Self {
        self.camera_stabilized = stabilized;
        self
    }

    /// Check the request and decode its image. Performs no I/O beyond decoding.
    pub fn validate(&self) -> MotionResult<PreparedImage> {
        self.image.decode()
    }

    /// Prompt sent to the provider: the caller's text followed by the style's camera hint.
    pub fn provider_prompt(&self) -> String {
        let hint = self.motion.prompt_hint();
        match self.prompt.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => format!("{p}, {hint}"),
            _ => hint.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/request.rs"]
mod tests;
