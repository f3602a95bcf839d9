//! motionforge turns a still image into a short video clip.
//!
//! Two strategies sit behind one entry point:
//!
//! - **remote**: submit an image-to-video job to an inference provider and poll it until it
//!   succeeds or fails
//! - **local**: render a deterministic camera move over the image at 60 fps and stream the
//!   frames into an encoder
//!
//! Build a [`Generator`] from a [`GeneratorConfig`], hand it a [`GenerationRequest`], and get a
//! [`VideoArtifact`] or a classified [`MotionError`] back.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Image decoding and the working-canvas rule.
pub mod assets;
/// Strategy selection and provider/encoder settings.
pub mod config;
/// Video encoders for the local strategy.
pub mod encode;
/// Core types, errors, cancellation.
pub mod foundation;
/// Generation orchestrator.
pub mod generate;
/// Motion model.
pub mod motion;
/// Remote job client.
pub mod remote;
/// Frame rendering.
pub mod render;
/// Frame clock and synthesizer.
pub mod synth;

pub use assets::decode::{PreparedImage, SourceImage};
pub use config::{
    EncoderChoice, GeneratorConfig, LocalConfig, RemoteConfig, Secret, StrategyConfig,
};
pub use encode::ffmpeg::{Container, FfmpegEncoder, FfmpegEncoderOpts};
pub use encode::sink::{EncoderBackend, EncoderConfig, EncoderSession, VideoArtifact};
pub use encode::y4m::Y4mEncoder;
pub use foundation::cancel::{CancelHandle, CancelToken};
pub use foundation::core::{Canvas, Fps, FrameIndex, FrameRGBA, Rgba8Premul};
pub use foundation::error::{ErrorKind, MotionError, MotionResult};
pub use generate::generator::{GenerationResult, Generator};
pub use generate::request::{DurationSecs, GenerationRequest};
pub use generate::strategy::{GenerationStrategy, LocalStrategy, RemoteStrategy};
pub use motion::model::{AffineParameters, MotionStyle, transform};
pub use remote::client::{Job, PollPolicy, RemoteJobClient, RemoteJobSettings};
pub use remote::transport::{HttpTransport, JobTransport, ProviderError};
pub use remote::wire::JobStatus;
pub use synth::clock::{FrameClock, Pacing};
pub use synth::synthesizer::{FrameSynthesizer, SYNTH_FPS, SynthStats};
