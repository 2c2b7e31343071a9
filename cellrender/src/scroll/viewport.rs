//! The scrollable viewport.

use parking_lot::Mutex;

/// A window that can be scrolled vertically.
#[cfg_attr(test, mockall::automock)]
pub trait Viewport: Send + Sync {
    /// Scrolls by `dy` pixels; positive moves content up.
    fn scroll_by(&self, dy: f64);

    /// Returns the current vertical scroll offset.
    fn scroll_offset(&self) -> f64;
}

/// A viewport that only tracks its offset.
#[derive(Debug, Default)]
pub struct TrackedViewport {
    offset: Mutex<f64>,
}

impl TrackedViewport {
    /// Creates a viewport at offset `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a viewport at `offset`.
    #[must_use]
    pub fn at(offset: f64) -> Self {
        Self {
            offset: Mutex::new(offset),
        }
    }
}

impl Viewport for TrackedViewport {
    fn scroll_by(&self, dy: f64) {
        *self.offset.lock() += dy;
    }

    fn scroll_offset(&self) -> f64 {
        *self.offset.lock()
    }
}
