use super::*;
use crate::encode::sink::VideoArtifact;
use crate::foundation::cancel::CancelHandle;
use crate::foundation::core::{Affine, Canvas, FrameRGBA};
use crate::synth::clock::CooperativeClock;

struct StubRenderer {
    frame: FrameRGBA,
    motions: Vec<Affine>,
}

impl StubRenderer {
    fn new() -> Self {
        Self {
            frame: FrameRGBA::blank(Canvas {
                width: 8,
                height: 4,
            }),
            motions: Vec::new(),
        }
    }
}

impl FrameRenderer for StubRenderer {
    fn canvas(&self) -> Canvas {
        self.frame.canvas()
    }

    fn render(&mut self, motion: Affine) -> MotionResult<&FrameRGBA> {
        self.motions.push(motion);
        Ok(&self.frame)
    }
}

#[derive(Default)]
struct RecordingSession {
    indices: Vec<u64>,
    fail_at: Option<u64>,
}

impl EncoderSession for RecordingSession {
    fn submit_frame(&mut self, idx: FrameIndex, _frame: &FrameRGBA) -> MotionResult<()> {
        if self.fail_at == Some(idx.0) {
            return Err(MotionError::encoder_failure("disk full"));
        }
        self.indices.push(idx.0);
        Ok(())
    }

    fn finish(self: Box<Self>) -> MotionResult<VideoArtifact> {
        Ok(VideoArtifact::Url("memory://test".into()))
    }
}

/// Clock that cancels the run after a fixed number of ticks.
struct CancelAfter {
    remaining: u32,
    handle: CancelHandle,
}

#[async_trait::async_trait]
impl FrameClock for CancelAfter {
    async fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.handle.cancel();
        }
    }
}

#[test]
fn frame_count_is_sixty_per_second() {
    let s = FrameSynthesizer::default();
    assert_eq!(s.fps(), Fps::integer(60).unwrap());
    assert_eq!(s.frame_count(5), 300);
    assert_eq!(s.frame_count(10), 600);
}

#[test]
fn sequence_seals_after_last_frame() {
    let mut seq = FrameSequence::new(3);
    assert_eq!(seq.advance().unwrap(), FrameIndex(0));
    assert_eq!(seq.advance().unwrap(), FrameIndex(1));
    assert!(!seq.is_sealed());
    assert_eq!(seq.advance().unwrap(), FrameIndex(2));
    assert!(seq.is_sealed());
    assert!(seq.advance().is_err());
    assert_eq!(seq.produced(), 3);
    assert!((seq.progress(FrameIndex(2)) - 2.0 / 3.0).abs() < 1e-12);
}

#[tokio::test]
async fn five_seconds_yields_three_hundred_ordered_frames() {
    let mut renderer = StubRenderer::new();
    let mut session = RecordingSession::default();
    let stats = FrameSynthesizer::default()
        .synthesize(
            &mut renderer,
            MotionStyle::ZoomIn,
            5,
            &mut session,
            &mut CooperativeClock,
            &CancelToken::never(),
        )
        .await
        .unwrap();

    assert_eq!(
        stats,
        SynthStats {
            frames_total: 300,
            frames_rendered: 300
        }
    );
    assert_eq!(session.indices, (0..300).collect::<Vec<_>>());

    // Progress starts at zero, so the first frame is untransformed.
    assert_eq!(renderer.motions[0], Affine::IDENTITY);
    let first = renderer.motions[1].as_coeffs()[0];
    let last = renderer.motions[299].as_coeffs()[0];
    assert!(first > 1.0 && last > first && last < 1.3);
}

#[tokio::test]
async fn cancellation_stops_between_frames() {
    let (handle, token) = CancelHandle::pair();
    let mut clock = CancelAfter {
        remaining: 10,
        handle,
    };
    let mut session = RecordingSession::default();
    let err = FrameSynthesizer::default()
        .synthesize(
            &mut StubRenderer::new(),
            MotionStyle::Pan,
            5,
            &mut session,
            &mut clock,
            &token,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MotionError::Cancelled));
    assert_eq!(session.indices.len(), 10);
}

#[tokio::test]
async fn encoder_error_aborts_run() {
    let mut session = RecordingSession {
        fail_at: Some(42),
        ..RecordingSession::default()
    };
    let err = FrameSynthesizer::default()
        .synthesize(
            &mut StubRenderer::new(),
            MotionStyle::Orbit,
            5,
            &mut session,
            &mut CooperativeClock,
            &CancelToken::never(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::EncoderFailure);
    assert_eq!(session.indices.len(), 42);
}
