//! Remote job strategy: submit an image-to-video job to an inference provider and poll it to a
//! terminal state.

/// Submit/poll client and the bounded wait loop.
pub mod client;
/// HTTP transport and provider-level errors.
pub mod transport;
/// Provider JSON payloads.
pub mod wire;
