use std::path::PathBuf;

use crate::foundation::core::{Fps, FrameIndex, FrameRGBA};
use crate::foundation::error::{MotionError, MotionResult};

/// Configuration provided when an encoder session is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// A finished, addressable video.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoArtifact {
    /// The complete encoded stream held in memory.
    Bytes {
        /// MIME type of `data`.
        mime: String,
        /// Encoded container bytes.
        data: Vec<u8>,
    },
    /// An encoded file written to disk.
    File {
        /// Output path.
        path: PathBuf,
        /// MIME type of the file contents.
        mime: String,
    },
    /// A remotely hosted video.
    Url(String),
}

impl VideoArtifact {
    /// MIME type, when known.
    pub fn mime(&self) -> Option<&str> {
        match self {
            Self::Bytes { mime, .. } | Self::File { mime, .. } => Some(mime),
            Self::Url(_) => None,
        }
    }

    /// The URL for remote artifacts.
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Self::Url(u) => Some(u),
            _ => None,
        }
    }

    /// `true` when the artifact cannot be dereferenced to any content.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes { data, .. } => data.is_empty(),
            Self::File { path, .. } => path.as_os_str().is_empty(),
            Self::Url(u) => u.trim().is_empty(),
        }
    }
}

/// Factory for encoder sessions. One backend may serve many concurrent runs; each run opens its
/// own session.
pub trait EncoderBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Start a session. Unsupported formats or missing tooling fail here, before any frame is
    /// rendered.
    fn open(&self, cfg: EncoderConfig) -> MotionResult<Box<dyn EncoderSession>>;
}

/// One in-flight encode.
///
/// Ordering contract: `submit_frame` is called in strictly increasing `FrameIndex` order.
/// Dropping a session without calling [`EncoderSession::finish`] discards everything it buffered.
pub trait EncoderSession: Send {
    /// Encode one frame.
    fn submit_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> MotionResult<()>;

    /// Seal the stream and return the concatenated artifact.
    fn finish(self: Box<Self>) -> MotionResult<VideoArtifact>;

    /// Release the session, discarding partial output.
    fn abort(self: Box<Self>) {}
}

/// Shared frame-admission checks: strict ordering and matching dimensions.
#[derive(Debug)]
pub(crate) struct FrameGate {
    cfg: EncoderConfig,
    last_idx: Option<FrameIndex>,
    admitted: u64,
}

impl FrameGate {
    pub(crate) fn new(cfg: EncoderConfig) -> Self {
        Self {
            cfg,
            last_idx: None,
            admitted: 0,
        }
    }

    pub(crate) fn admit(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> MotionResult<()> {
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(MotionError::encoder_failure(format!(
                "out-of-order frame index {} after {}",
                idx.0, last.0
            )));
        }
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(MotionError::encoder_failure(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }
        if frame.data.len() != frame.canvas().rgba8_len() {
            return Err(MotionError::encoder_failure(
                "frame.data size mismatch with width*height*4",
            ));
        }
        self.last_idx = Some(idx);
        self.admitted += 1;
        Ok(())
    }

    pub(crate) fn admitted(&self) -> u64 {
        self.admitted
    }
}

pub(crate) fn validate_config(cfg: &EncoderConfig, encoder: &str) -> MotionResult<()> {
    if cfg.fps.num == 0 || cfg.fps.den == 0 {
        return Err(MotionError::encoder_failure(format!(
            "{encoder}: fps must be non-zero"
        )));
    }
    if cfg.width == 0 || cfg.height == 0 {
        return Err(MotionError::encoder_failure(format!(
            "{encoder}: width/height must be non-zero"
        )));
    }
    if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
        return Err(MotionError::encoder_failure(format!(
            "{encoder}: width/height must be even for 4:2:0 output, got {}x{}",
            cfg.width, cfg.height
        )));
    }
    Ok(())
}
