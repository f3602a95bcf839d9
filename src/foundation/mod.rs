//! Shared primitives: frame/time types, the error taxonomy, cancellation, pixel math.

/// Cooperative cancellation shared by both strategies.
pub mod cancel;
/// Frame, rate and canvas types.
pub mod core;
/// The `MotionError` taxonomy.
pub mod error;
pub(crate) mod math;
