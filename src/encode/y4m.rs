use crate::encode::sink::{
    EncoderBackend, EncoderConfig, EncoderSession, FrameGate, VideoArtifact, validate_config,
};
use crate::foundation::core::{FrameIndex, FrameRGBA};
use crate::foundation::error::{MotionError, MotionResult};

/// MIME type of YUV4MPEG2 streams.
pub const Y4M_MIME: &str = "video/x-yuv4mpeg";

/// In-process YUV4MPEG2 encoder (`C420jpeg`, full-range BT.601).
///
/// Needs no external tooling, so it is always available. Each frame becomes one buffered chunk;
/// `finish` concatenates the header and chunks into a single playable stream.
///
/// The stream is uncompressed and held in memory until `finish`, so peak usage is roughly twice
/// [`Y4mEncoder::stream_len`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Y4mEncoder;

impl Y4mEncoder {
    /// Size in bytes of a finished stream of `frames` frames for `cfg`.
    pub fn stream_len(cfg: &EncoderConfig, frames: u64) -> u64 {
        stream_header(cfg).len() as u64 + frames * frame_chunk_len(cfg.width, cfg.height)
    }
}

fn stream_header(cfg: &EncoderConfig) -> String {
    format!(
        "YUV4MPEG2 W{} H{} F{}:{} Ip A1:1 C420jpeg\n",
        cfg.width, cfg.height, cfg.fps.num, cfg.fps.den
    )
}

fn frame_chunk_len(width: u32, height: u32) -> u64 {
    let (w, h) = (u64::from(width), u64::from(height));
    6 + w * h + 2 * (w / 2) * (h / 2)
}

impl EncoderBackend for Y4mEncoder {
    fn name(&self) -> &'static str {
        "y4m"
    }

    fn open(&self, cfg: EncoderConfig) -> MotionResult<Box<dyn EncoderSession>> {
        validate_config(&cfg, "y4m")?;
        let header = stream_header(&cfg);
        Ok(Box::new(Y4mSession {
            gate: FrameGate::new(cfg),
            cfg,
            header: header.into_bytes(),
            chunks: Vec::new(),
        }))
    }
}

struct Y4mSession {
    gate: FrameGate,
    cfg: EncoderConfig,
    header: Vec<u8>,
    chunks: Vec<Vec<u8>>,
}

impl EncoderSession for Y4mSession {
    fn submit_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> MotionResult<()> {
        self.gate.admit(idx, frame)?;
        self.chunks
            .push(encode_frame_chunk(&frame.data, self.cfg.width, self.cfg.height));
        Ok(())
    }

    fn finish(self: Box<Self>) -> MotionResult<VideoArtifact> {
        if self.gate.admitted() == 0 {
            return Err(MotionError::encoder_failure("y4m: no frames submitted"));
        }
        let total = self.header.len() + self.chunks.iter().map(Vec::len).sum::<usize>();
        let mut data = Vec::with_capacity(total);
        data.extend_from_slice(&self.header);
        for chunk in &self.chunks {
            data.extend_from_slice(chunk);
        }
        Ok(VideoArtifact::Bytes {
            mime: Y4M_MIME.to_string(),
            data,
        })
    }
}

/// `FRAME` marker followed by planar Y, Cb, Cr (chroma subsampled 2x2).
fn encode_frame_chunk(rgba: &[u8], width: u32, height: u32) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let (cw, ch) = (w / 2, h / 2);
    let mut out = Vec::with_capacity(6 + w * h + 2 * cw * ch);
    out.extend_from_slice(b"FRAME\n");

    for px in rgba.chunks_exact(4) {
        out.push(luma(px[0], px[1], px[2]));
    }

    let mut cb = Vec::with_capacity(cw * ch);
    let mut cr = Vec::with_capacity(cw * ch);
    for cy in 0..ch {
        for cx in 0..cw {
            let mut sum = [0u32; 3];
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let i = ((cy * 2 + dy) * w + (cx * 2 + dx)) * 4;
                sum[0] += u32::from(rgba[i]);
                sum[1] += u32::from(rgba[i + 1]);
                sum[2] += u32::from(rgba[i + 2]);
            }
            let r = ((sum[0] + 2) / 4) as u8;
            let g = ((sum[1] + 2) / 4) as u8;
            let b = ((sum[2] + 2) / 4) as u8;
            cb.push(chroma_b(r, g, b));
            cr.push(chroma_r(r, g, b));
        }
    }
    out.extend_from_slice(&cb);
    out.extend_from_slice(&cr);
    out
}

// JFIF full-range coefficients in 16.16 fixed point; each row sums to 65536.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 19595 * i32::from(r) + 38470 * i32::from(g) + 7471 * i32::from(b);
    ((y + 32768) >> 16).clamp(0, 255) as u8
}

fn chroma_b(r: u8, g: u8, b: u8) -> u8 {
    let v = -11059 * i32::from(r) - 21709 * i32::from(g) + 32768 * i32::from(b);
    ((v + (128 << 16) + 32768) >> 16).clamp(0, 255) as u8
}

fn chroma_r(r: u8, g: u8, b: u8) -> u8 {
    let v = 32768 * i32::from(r) - 27439 * i32::from(g) - 5329 * i32::from(b);
    ((v + (128 << 16) + 32768) >> 16).clamp(0, 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/encode/y4m.rs"]
mod tests;
