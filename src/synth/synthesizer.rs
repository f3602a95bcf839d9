use crate::encode::sink::EncoderSession;
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{MotionError, MotionResult};
use crate::motion::model::{MotionStyle, transform};
use crate::render::backend::FrameRenderer;
use crate::synth::clock::FrameClock;

/// Fixed synthesis rate in frames per second.
pub const SYNTH_FPS: u32 = 60;

/// Bookkeeping for one run's frames: hands out indices in order and seals after the last one.
#[derive(Debug)]
pub struct FrameSequence {
    total: u64,
    next: u64,
    sealed: bool,
}

impl FrameSequence {
    /// Sequence of `total` frames.
    pub fn new(total: u64) -> Self {
        Self {
            total,
            next: 0,
            sealed: total == 0,
        }
    }

    /// Number of frames in the sequence.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Frames already handed out.
    pub fn produced(&self) -> u64 {
        self.next
    }

    /// `true` once every frame has been produced.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Progress fraction `f / total` for `idx`.
    pub fn progress(&self, idx: FrameIndex) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        idx.0 as f64 / self.total as f64
    }

    /// Claim the next index. Fails once the sequence is sealed.
    pub fn advance(&mut self) -> MotionResult<FrameIndex> {
        if self.sealed {
            return Err(MotionError::encoder_failure(format!(
                "frame sequence sealed after {} frames",
                self.total
            )));
        }
        let idx = FrameIndex(self.next);
        self.next += 1;
        if self.next == self.total {
            self.sealed = true;
        }
        Ok(idx)
    }
}

/// Counters reported by a completed synthesis run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SynthStats {
    /// Frames the run was asked to produce.
    pub frames_total: u64,
    /// Frames rendered and accepted by the encoder.
    pub frames_rendered: u64,
}

/// Drives the frame loop: motion model, renderer, encoder, clock.
#[derive(Clone, Copy, Debug)]
pub struct FrameSynthesizer {
    fps: Fps,
}

impl Default for FrameSynthesizer {
    fn default() -> Self {
        Self {
            fps: Fps {
                num: SYNTH_FPS,
                den: 1,
            },
        }
    }
}

impl FrameSynthesizer {
    /// Synthesizer running at `fps`.
    pub fn new(fps: Fps) -> Self {
        Self { fps }
    }

    /// Frame rate of the produced sequence.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Number of frames for a clip of `duration_secs`.
    pub fn frame_count(&self, duration_secs: u32) -> u64 {
        self.fps.frames_in_secs(duration_secs)
    }

    /// Render every frame of the clip and stream it into `session` in index order.
    ///
    /// Cancellation is checked before each frame; the clock is awaited after each frame. The
    /// session is left open: the caller finishes it on success and aborts it on error.
    pub async fn synthesize(
        &self,
        renderer: &mut dyn FrameRenderer,
        style: MotionStyle,
        duration_secs: u32,
        session: &mut dyn EncoderSession,
        clock: &mut dyn FrameClock,
        cancel: &CancelToken,
    ) -> MotionResult<SynthStats> {
        let canvas = renderer.canvas();
        let mut seq = FrameSequence::new(self.frame_count(duration_secs));
        let log_every = u64::from(self.fps.num / self.fps.den.max(1)).max(1);

        tracing::debug!(
            frames = seq.total(),
            width = canvas.width,
            height = canvas.height,
            style = %style,
            "synthesis started"
        );

        while !seq.is_sealed() {
            if cancel.is_cancelled() {
                tracing::debug!(frames_rendered = seq.produced(), "synthesis cancelled");
                return Err(MotionError::Cancelled);
            }

            let idx = seq.advance()?;
            let motion = transform(style, seq.progress(idx)).to_affine(canvas);
            let frame = renderer.render(motion)?;
            session.submit_frame(idx, frame)?;

            if (idx.0 + 1) % log_every == 0 {
                tracing::debug!(frame = idx.0 + 1, total = seq.total(), "synthesis progress");
            }

            clock.tick().await;
        }

        Ok(SynthStats {
            frames_total: seq.total(),
            frames_rendered: seq.produced(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/synth/synthesizer.rs"]
mod tests;
