//! Generator configuration: which strategy runs and how it is parameterized.
//!
//! Configuration is plain JSON. Credentials are carried in [`Secret`] so they never show up in
//! `Debug` output or logs.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::encode::ffmpeg::{Container, FfmpegEncoder, FfmpegEncoderOpts};
use crate::encode::sink::EncoderBackend;
use crate::encode::y4m::Y4mEncoder;
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{MotionError, MotionResult};
use crate::remote::client::{PollPolicy, RemoteJobSettings};
use crate::synth::clock::Pacing;

/// A credential string. `Debug` prints a placeholder.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a credential.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw credential.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `true` when no credential is set.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Top-level configuration for [`crate::Generator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// The one strategy every `generate` call uses.
    pub strategy: StrategyConfig,
}

/// Strategy selection, tagged by `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StrategyConfig {
    /// Delegate to a remote inference provider.
    Remote(RemoteConfig),
    /// Synthesize frames locally and encode them.
    Local(LocalConfig),
}

/// Remote provider settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// API root; `/jobs` is appended.
    pub base_url: String,
    /// Provider model identifier.
    pub model: String,
    /// Bearer token. Usually injected from the environment rather than stored in the file.
    #[serde(skip_serializing)]
    pub token: Secret,
    /// Requested output width.
    pub width: u32,
    /// Requested output height.
    pub height: u32,
    /// Provider frame rate; `num_frames = duration * provider_fps`.
    pub provider_fps: u32,
    /// Delay between status requests.
    pub poll_interval_ms: u64,
    /// Total wait budget; `None` polls until a terminal state.
    pub max_wait_secs: Option<u64>,
    /// Maximum status requests.
    pub max_attempts: Option<u32>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        let settings = RemoteJobSettings::default();
        Self {
            base_url: "https://api.deapi.ai/v2".to_string(),
            model: settings.model,
            token: Secret::default(),
            width: settings.width,
            height: settings.height,
            provider_fps: settings.provider_fps,
            poll_interval_ms: 2000,
            max_wait_secs: Some(600),
            max_attempts: None,
        }
    }
}

impl RemoteConfig {
    /// Per-request provider parameters.
    pub fn settings(&self) -> RemoteJobSettings {
        RemoteJobSettings {
            model: self.model.clone(),
            width: self.width,
            height: self.height,
            provider_fps: self.provider_fps,
        }
    }

    /// Poll bounds.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_wait: self.max_wait_secs.map(Duration::from_secs),
            max_attempts: self.max_attempts,
        }
    }

    fn validate(&self) -> MotionResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(MotionError::invalid_request("remote.base_url must be set"));
        }
        if self.model.trim().is_empty() {
            return Err(MotionError::invalid_request("remote.model must be set"));
        }
        if self.token.is_empty() {
            return Err(MotionError::invalid_request("remote.token must be set"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(MotionError::invalid_request(
                "remote.width/height must be non-zero",
            ));
        }
        if self.provider_fps == 0 {
            return Err(MotionError::invalid_request("remote.provider_fps must be > 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(MotionError::invalid_request(
                "remote.poll_interval_ms must be > 0",
            ));
        }
        if self.max_attempts == Some(0) {
            return Err(MotionError::invalid_request("remote.max_attempts must be > 0"));
        }
        Ok(())
    }
}

/// Local synthesis settings.
///
/// The frame rate is not configurable: local clips always run at
/// [`SYNTH_FPS`](crate::synth::synthesizer::SYNTH_FPS).
///
/// The default [`EncoderChoice::Y4m`] buffers the whole uncompressed stream in memory until
/// `finish` (about 530 MB for ten seconds at 1024x576, see [`Y4mEncoder::stream_len`]). Pick
/// [`EncoderChoice::Ffmpeg`] with an `out_path` for long or tall clips.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Working canvas width; height follows the source aspect ratio.
    pub working_width: u32,
    /// Frame pacing.
    pub pacing: Pacing,
    /// Output encoder.
    pub encoder: EncoderChoice,
    /// Straight-alpha RGBA used behind uncovered regions.
    pub background: [u8; 4],
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            working_width: 1024,
            pacing: Pacing::default(),
            encoder: EncoderChoice::default(),
            background: [0, 0, 0, 255],
        }
    }
}

impl LocalConfig {
    /// Background as premultiplied RGBA.
    pub fn background(&self) -> Rgba8Premul {
        let [r, g, b, a] = self.background;
        Rgba8Premul::from_straight_rgba(r, g, b, a)
    }

    fn validate(&self) -> MotionResult<()> {
        if self.working_width < 2 || !self.working_width.is_multiple_of(2) {
            return Err(MotionError::invalid_request(format!(
                "local.working_width must be even and >= 2, got {}",
                self.working_width
            )));
        }
        Ok(())
    }
}

/// Which encoder a local run writes to, tagged by `format`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum EncoderChoice {
    /// In-process YUV4MPEG2.
    #[default]
    Y4m,
    /// System `ffmpeg`.
    Ffmpeg {
        /// Output container.
        #[serde(default)]
        container: Container,
        /// Write to this file instead of returning bytes.
        #[serde(default)]
        out_path: Option<PathBuf>,
    },
}

impl EncoderChoice {
    /// Instantiate the backend.
    pub fn backend(&self, background: [u8; 4]) -> Arc<dyn EncoderBackend> {
        match self {
            Self::Y4m => Arc::new(Y4mEncoder),
            Self::Ffmpeg {
                container,
                out_path,
            } => Arc::new(FfmpegEncoder::new(FfmpegEncoderOpts {
                container: *container,
                out_path: out_path.clone(),
                bg_rgba: background,
                ..FfmpegEncoderOpts::default()
            })),
        }
    }
}

impl GeneratorConfig {
    /// Remote strategy with default provider settings.
    pub fn remote(token: impl Into<String>) -> Self {
        Self {
            strategy: StrategyConfig::Remote(RemoteConfig {
                token: Secret::new(token),
                ..RemoteConfig::default()
            }),
        }
    }

    /// Local strategy with default settings.
    pub fn local() -> Self {
        Self {
            strategy: StrategyConfig::Local(LocalConfig::default()),
        }
    }

    /// Parse from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> MotionResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| MotionError::invalid_request(format!("parse generator config JSON: {e}")))
    }

    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> MotionResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> MotionResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MotionError::invalid_request(format!(
                "open generator config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check value ranges and required fields.
    pub fn validate(&self) -> MotionResult<()> {
        match &self.strategy {
            StrategyConfig::Remote(remote) => remote.validate(),
            StrategyConfig::Local(local) => local.validate(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
