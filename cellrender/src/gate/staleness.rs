//! Monotonic staleness gate.

/// Drops updates that are not strictly newer than what is displayed.
///
/// Updates travel over an asynchronous channel and can arrive out of order;
/// a slow, older update must never overwrite a newer one. Equal timestamps
/// are duplicates, not re-renders.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StalenessGate {
    displayed: f64,
}

impl StalenessGate {
    /// Creates a gate that has displayed nothing yet (timestamp `0`).
    #[must_use]
    pub const fn new() -> Self {
        Self { displayed: 0.0 }
    }

    /// Returns the timestamp of the last applied update.
    #[must_use]
    pub const fn displayed(&self) -> f64 {
        self.displayed
    }

    /// Returns true iff `candidate` is strictly newer than the displayed
    /// timestamp. NaN is never admitted.
    #[must_use]
    pub fn admit(&self, candidate: f64) -> bool {
        candidate > self.displayed
    }

    /// Records that an update with `timestamp` has been applied.
    ///
    /// Never lowers the high-water mark.
    pub fn mark_displayed(&mut self, timestamp: f64) {
        if timestamp > self.displayed {
            self.displayed = timestamp;
        }
    }
}
