//! Generation orchestrator: one entry point, one strategy per call.

/// [`Generator`](generator::Generator) entry point.
pub mod generator;
/// Caller-facing request type.
pub mod request;
/// Remote and local strategies behind [`GenerationStrategy`](strategy::GenerationStrategy).
pub mod strategy;
