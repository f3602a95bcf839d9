use crate::foundation::core::{Affine, Canvas, FrameRGBA};
use crate::foundation::error::MotionResult;

/// Produces one frame of the working canvas for a given motion transform.
///
/// The returned frame borrows the renderer's output buffer and is only valid until the next call.
pub trait FrameRenderer: Send {
    /// Output dimensions of every rendered frame.
    fn canvas(&self) -> Canvas;

    /// Render the source with `motion` (pixel space of the working canvas) applied on top of
    /// the fit-to-canvas base transform.
    fn render(&mut self, motion: Affine) -> MotionResult<&FrameRGBA>;
}
