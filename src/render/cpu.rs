use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Affine, Canvas, FrameRGBA, Rgba8Premul};
use crate::foundation::error::{MotionError, MotionResult};
use crate::foundation::math::flatten_premul_over_bg;
use crate::render::backend::FrameRenderer;

/// CPU renderer for one synthesis run.
///
/// The source pixmap, render context and output buffers are allocated once and reused for every
/// frame of the run.
pub struct CpuFrameRenderer {
    canvas: Canvas,
    src_w: u32,
    src_h: u32,
    base: Affine,
    background: [u8; 4],
    paint: vello_cpu::Image,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    frame: FrameRGBA,
}

impl CpuFrameRenderer {
    /// Prepare a renderer drawing `image` scaled to fill `canvas`, flattened over `background`.
    pub fn new(image: &PreparedImage, canvas: Canvas, background: Rgba8Premul) -> MotionResult<Self> {
        let (w, h) = canvas_dims_u16(canvas)?;
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        let base = Affine::scale_non_uniform(
            f64::from(canvas.width) / f64::from(image.width),
            f64::from(canvas.height) / f64::from(image.height),
        );

        let mut bg = background.to_array();
        bg[3] = 255;

        Ok(Self {
            canvas,
            src_w: image.width,
            src_h: image.height,
            base,
            background: bg,
            paint,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            frame: FrameRGBA::blank(canvas),
        })
    }
}

impl FrameRenderer for CpuFrameRenderer {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn render(&mut self, motion: Affine) -> MotionResult<&FrameRGBA> {
        self.ctx.reset();
        self.ctx.set_transform(affine_to_cpu(motion * self.base));
        self.ctx.set_paint(self.paint.clone());
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.src_w),
            f64::from(self.src_h),
        ));
        self.ctx.flush();

        self.pixmap.data_as_u8_slice_mut().fill(0);
        self.ctx.render_to_pixmap(&mut self.pixmap);

        flatten_premul_over_bg(
            &mut self.frame.data,
            self.pixmap.data_as_u8_slice(),
            self.background,
        )?;
        Ok(&self.frame)
    }
}

fn canvas_dims_u16(canvas: Canvas) -> MotionResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| MotionError::encoder_failure("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| MotionError::encoder_failure("canvas height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(MotionError::encoder_failure("canvas must be non-empty"));
    }
    Ok((w, h))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> MotionResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| MotionError::invalid_request("source image width exceeds 65535px"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| MotionError::invalid_request("source image height exceeds 65535px"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(MotionError::invalid_request("source pixel buffer length mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
