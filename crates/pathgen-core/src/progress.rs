//! Progress reporting boundary
//!
//! Long-running stages report units of work (lines parsed, paths counted,
//! paths written) through [`Progress`]. Every method takes `&self`, so a
//! reporter can observe a stage but never reach back into its state.

pub trait Progress {
    /// Set (or clear) the expected number of units.
    fn set_total(&self, total: Option<u64>);
    /// Record `delta` finished units.
    fn advance(&self, delta: u64);
    /// Called once when the stage completes.
    fn finish(&self) {}
}

/// Reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn set_total(&self, _total: Option<u64>) {}

    fn advance(&self, _delta: u64) {}
}
