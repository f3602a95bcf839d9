use std::borrow::Cow;
use std::sync::Arc;

use anyhow::Context;
use base64::Engine as _;

use crate::foundation::core::Canvas;
use crate::foundation::error::{MotionError, MotionResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Largest working-canvas edge the CPU renderer accepts (its pixmaps are `u16`-sized).
pub const MAX_CANVAS_EDGE: u32 = u16::MAX as u32;

/// Decoded source image in premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes, tightly packed, row-major.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Source image as supplied by the caller: raw encoded bytes or a `data:` URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceImage {
    /// Encoded image bytes (PNG, JPEG, WebP, ...).
    Bytes(Vec<u8>),
    /// A `data:<mime>;base64,<payload>` URI, as produced by browser file readers.
    DataUri(String),
}

impl SourceImage {
    /// Wrap encoded image bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Wrap a base64 `data:` URI.
    pub fn from_data_uri(uri: impl Into<String>) -> Self {
        Self::DataUri(uri.into())
    }

    /// `true` when there is no payload at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(b) => b.is_empty(),
            Self::DataUri(s) => s.trim().is_empty(),
        }
    }

    /// The encoded image bytes, base64-decoding a data URI when needed.
    pub fn encoded_bytes(&self) -> MotionResult<Cow<'_, [u8]>> {
        match self {
            Self::Bytes(b) => Ok(Cow::Borrowed(b.as_slice())),
            Self::DataUri(uri) => {
                let (_, payload) = split_data_uri(uri)?;
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(payload.trim())
                    .map_err(|e| {
                        MotionError::invalid_request(format!("data URI payload is not base64: {e}"))
                    })?;
                Ok(Cow::Owned(bytes))
            }
        }
    }

    /// Render as a `data:` URI for JSON provider payloads.
    pub fn to_data_uri(&self) -> MotionResult<String> {
        match self {
            Self::DataUri(uri) => {
                split_data_uri(uri)?;
                Ok(uri.clone())
            }
            Self::Bytes(bytes) => {
                let mime = image::guess_format(bytes)
                    .map(|f| f.to_mime_type())
                    .map_err(|e| {
                        MotionError::invalid_request(format!("unrecognized image format: {e}"))
                    })?;
                let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
                Ok(format!("data:{mime};base64,{payload}"))
            }
        }
    }

    /// Decode into premultiplied RGBA8.
    ///
    /// Every failure here is the caller's input, so it is reported as `InvalidRequest`.
    pub fn decode(&self) -> MotionResult<PreparedImage> {
        if self.is_empty() {
            return Err(MotionError::invalid_request("source image is empty"));
        }
        let bytes = self.encoded_bytes()?;
        decode_image(&bytes).map_err(|e| MotionError::invalid_request(e.message()))
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> MotionResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(MotionError::invalid_request("source image has zero area"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Working canvas for a source of `src_width x src_height`: width fixed at `working_width`,
/// height following the source aspect ratio, rounded up to an even pixel count.
pub fn working_canvas(src_width: u32, src_height: u32, working_width: u32) -> MotionResult<Canvas> {
    if src_width == 0 || src_height == 0 {
        return Err(MotionError::invalid_request("source image has zero area"));
    }
    if working_width < 2 || !working_width.is_multiple_of(2) {
        return Err(MotionError::invalid_request(format!(
            "working width must be even and >= 2, got {working_width}"
        )));
    }
    let h = (f64::from(working_width) * f64::from(src_height) / f64::from(src_width)).round();
    let mut height = (h as u32).max(2);
    if !height.is_multiple_of(2) {
        height += 1;
    }
    if working_width > MAX_CANVAS_EDGE || height > MAX_CANVAS_EDGE {
        return Err(MotionError::invalid_request(format!(
            "working canvas {working_width}x{height} exceeds {MAX_CANVAS_EDGE}px"
        )));
    }
    Ok(Canvas {
        width: working_width,
        height,
    })
}

fn split_data_uri(uri: &str) -> MotionResult<(&str, &str)> {
    let rest = uri
        .trim_start()
        .strip_prefix("data:")
        .ok_or_else(|| MotionError::invalid_request("image string is not a data: URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| MotionError::invalid_request("data URI has no payload separator"))?;
    let mime = header.strip_suffix(";base64").ok_or_else(|| {
        MotionError::invalid_request("only base64-encoded data URIs are supported")
    })?;
    if payload.trim().is_empty() {
        return Err(MotionError::invalid_request("data URI payload is empty"));
    }
    Ok((mime, payload))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
