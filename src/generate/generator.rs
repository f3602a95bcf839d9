use std::time::Duration;

use crate::config::{GeneratorConfig, StrategyConfig};
use crate::encode::sink::VideoArtifact;
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{MotionError, MotionResult};
use crate::generate::request::GenerationRequest;
use crate::generate::strategy::{GenerationStrategy, LocalStrategy, RemoteStrategy};

/// Terminal outcome of one `generate` call.
pub type GenerationResult = MotionResult<VideoArtifact>;

/// Single entry point: validates a request, runs the configured strategy, and returns a
/// classified result.
///
/// A `Generator` holds no per-call state, so one instance may serve concurrent calls.
pub struct Generator {
    strategy: Box<dyn GenerationStrategy>,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

impl Generator {
    /// Generator over an explicit strategy.
    pub fn new(strategy: impl GenerationStrategy + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
        }
    }

    /// Validate `config` and build the strategy it selects.
    pub fn from_config(config: &GeneratorConfig) -> MotionResult<Self> {
        config.validate()?;
        Ok(match &config.strategy {
            StrategyConfig::Remote(remote) => Self::new(RemoteStrategy::from_config(remote)),
            StrategyConfig::Local(local) => Self::new(LocalStrategy::from_config(local)),
        })
    }

    /// Name of the selected strategy.
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Generate a clip, running until the strategy reaches a terminal state.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        self.generate_with(request, &CancelToken::never(), None).await
    }

    /// Generate a clip, observing `cancel` and an optional overall `deadline`.
    ///
    /// Validation failures return before any outbound call or encoder is opened. Dropping the
    /// returned future releases the run's encoder session and stops polling.
    #[tracing::instrument(
        name = "generate",
        skip_all,
        fields(
            strategy = self.strategy.name(),
            motion = %request.motion,
            duration = request.duration.secs(),
        )
    )]
    pub async fn generate_with(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
        deadline: Option<Duration>,
    ) -> GenerationResult {
        let image = request.validate().inspect_err(|e| {
            tracing::warn!(error = %e, "request rejected");
        })?;

        let run = self.strategy.run(request, image, cancel);
        let result = match deadline {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(r) => r,
                Err(_) => Err(MotionError::Timeout {
                    waited: limit,
                    attempts: 0,
                }),
            },
            None => run.await,
        };

        let result = result.map_err(|e| e.classify_other(MotionError::ProviderUnavailable));
        match &result {
            Ok(artifact) => tracing::info!(mime = ?artifact.mime(), "generation finished"),
            Err(e) if e.kind().is_user_cancellation() => tracing::info!("generation cancelled"),
            Err(e) => tracing::warn!(kind = ?e.kind(), error = %e, "generation failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/generator.rs"]
mod tests;
