//! Image boundary: encoded source bytes / data URIs in, premultiplied RGBA8 out.

/// Source decoding and working-canvas sizing.
pub mod decode;
