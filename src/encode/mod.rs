//! Stream encoder adapters.
//!
//! Sessions consume rendered frames in timeline order and produce one addressable
//! [`VideoArtifact`](sink::VideoArtifact) on `finish`.

/// `ffmpeg`-based encoder (MP4/WebM via system `ffmpeg`).
pub mod ffmpeg;
/// Encoder traits, configuration and the artifact type.
pub mod sink;
/// In-process YUV4MPEG2 encoder.
pub mod y4m;
