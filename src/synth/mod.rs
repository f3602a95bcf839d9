//! Local strategy frame loop.

/// Per-frame pacing.
pub mod clock;
/// Frame synthesizer and sequence bookkeeping.
pub mod synthesizer;
