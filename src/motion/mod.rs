//! Motion model: pure mapping from a motion style and progress fraction to a 2-D transform.

/// Motion styles and the progress-to-transform mapping.
pub mod model;
