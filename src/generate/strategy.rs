use std::sync::Arc;

use async_trait::async_trait;

use crate::assets::decode::{PreparedImage, working_canvas};
use crate::config::{LocalConfig, RemoteConfig};
use crate::encode::sink::{EncoderBackend, EncoderConfig, VideoArtifact};
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Fps, Rgba8Premul};
use crate::foundation::error::{MotionError, MotionResult};
use crate::generate::request::GenerationRequest;
use crate::remote::client::RemoteJobClient;
use crate::remote::transport::{HttpTransport, JobTransport};
use crate::render::cpu::CpuFrameRenderer;
use crate::synth::clock::Pacing;
use crate::synth::synthesizer::FrameSynthesizer;

/// One way of turning a validated request into a video.
///
/// Implementations return classified errors only; [`MotionError::Other`] is normalized before
/// it leaves `run`.
#[async_trait]
pub trait GenerationStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Produce the clip for `request`. `image` is the request's already decoded source.
    async fn run(
        &self,
        request: &GenerationRequest,
        image: PreparedImage,
        cancel: &CancelToken,
    ) -> MotionResult<VideoArtifact>;
}

/// Submit the request to an inference provider and wait for the job.
pub struct RemoteStrategy {
    client: RemoteJobClient,
}

impl RemoteStrategy {
    /// Strategy over an existing client.
    pub fn new(client: RemoteJobClient) -> Self {
        Self { client }
    }

    /// HTTP-backed strategy from configuration.
    pub fn from_config(cfg: &RemoteConfig) -> Self {
        let transport = HttpTransport::new(cfg.base_url.clone(), cfg.token.expose());
        Self::with_transport(cfg, Arc::new(transport))
    }

    /// Strategy from configuration over a caller-supplied transport.
    pub fn with_transport(cfg: &RemoteConfig, transport: Arc<dyn JobTransport>) -> Self {
        Self::new(RemoteJobClient::new(
            transport,
            cfg.settings(),
            cfg.poll_policy(),
        ))
    }
}

#[async_trait]
impl GenerationStrategy for RemoteStrategy {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        _image: PreparedImage,
        cancel: &CancelToken,
    ) -> MotionResult<VideoArtifact> {
        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            job = self.client.submit(request) => Some(job),
        };
        let Some(job) = submitted else {
            return Err(MotionError::Cancelled);
        };
        let mut job = job?;
        self.client
            .wait(&mut job, cancel)
            .await
            .map_err(|e| e.classify_other(MotionError::ProviderUnavailable))
    }
}

/// Render the motion locally and encode it.
pub struct LocalStrategy {
    encoder: Arc<dyn EncoderBackend>,
    synthesizer: FrameSynthesizer,
    working_width: u32,
    pacing: Pacing,
    background: Rgba8Premul,
}

impl LocalStrategy {
    /// Strategy writing to `encoder` with default synthesis settings.
    pub fn new(encoder: Arc<dyn EncoderBackend>) -> Self {
        Self::with_encoder(&LocalConfig::default(), encoder)
    }

    /// Strategy from configuration, using the configured encoder.
    pub fn from_config(cfg: &LocalConfig) -> Self {
        let encoder = cfg.encoder.backend(cfg.background);
        Self::with_encoder(cfg, encoder)
    }

    /// Strategy from configuration with a caller-supplied encoder.
    pub fn with_encoder(cfg: &LocalConfig, encoder: Arc<dyn EncoderBackend>) -> Self {
        Self {
            encoder,
            synthesizer: FrameSynthesizer::default(),
            working_width: cfg.working_width,
            pacing: cfg.pacing,
            background: cfg.background(),
        }
    }

    /// Override the working canvas width.
    pub fn with_working_width(mut self, width: u32) -> Self {
        self.working_width = width;
        self
    }

    /// Override the frame pacing.
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    fn fps(&self) -> Fps {
        self.synthesizer.fps()
    }
}

#[async_trait]
impl GenerationStrategy for LocalStrategy {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        image: PreparedImage,
        cancel: &CancelToken,
    ) -> MotionResult<VideoArtifact> {
        let canvas = working_canvas(image.width, image.height, self.working_width)?;
        let mut session = self
            .encoder
            .open(EncoderConfig {
                width: canvas.width,
                height: canvas.height,
                fps: self.fps(),
            })
            .map_err(|e| e.classify_other(MotionError::EncoderFailure))?;
        tracing::debug!(
            encoder = self.encoder.name(),
            width = canvas.width,
            height = canvas.height,
            "encoder session opened"
        );

        let mut renderer = match CpuFrameRenderer::new(&image, canvas, self.background) {
            Ok(r) => r,
            Err(e) => {
                session.abort();
                return Err(e.classify_other(MotionError::EncoderFailure));
            }
        };
        let mut clock = self.pacing.clock(self.fps());

        let synthesized = self
            .synthesizer
            .synthesize(
                &mut renderer,
                request.motion,
                request.duration.secs(),
                session.as_mut(),
                clock.as_mut(),
                cancel,
            )
            .await;

        match synthesized {
            Ok(stats) => {
                tracing::debug!(frames = stats.frames_rendered, "synthesis finished");
                session
                    .finish()
                    .map_err(|e| e.classify_other(MotionError::EncoderFailure))
            }
            Err(e) => {
                session.abort();
                Err(e.classify_other(MotionError::EncoderFailure))
            }
        }
    }
}
