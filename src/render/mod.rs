//! Frame rendering: draws the source image under a per-frame transform.

/// Renderer trait shared by the synthesizer and tests.
pub mod backend;
/// CPU raster renderer powered by `vello_cpu`.
pub mod cpu;
