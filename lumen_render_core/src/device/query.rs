/// Backend query contract

use std::fmt::Debug;

/// Query variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Signals when the GPU reaches the point where the query ended
    Event,
    /// Measures GPU time between begin and end
    Timer,
    /// Counts samples passing depth/stencil tests
    ///
    /// A binary query only reports 0 or 1 and may complete earlier than a
    /// precise one.
    Occlusion { binary: bool },
}

/// Result read back from a completed query
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryResult {
    Event,
    Timer { elapsed_ms: f32 },
    Occlusion { num_samples: u64 },
}

/// Backend query object
///
/// Owned by a `Query` and only touched on the render thread.
pub trait BackendQuery: Send + Debug {
    /// Start recording (no-op for event queries)
    fn begin(&mut self);

    /// Stop recording; the GPU signals completion later
    fn end(&mut self);

    /// True once the GPU finished the work recorded between begin and end
    fn is_ready(&self) -> bool;

    /// Read the result (only meaningful once `is_ready()` returns true)
    fn result(&self) -> QueryResult;
}
