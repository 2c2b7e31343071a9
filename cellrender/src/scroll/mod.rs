//! Scroll compensation.
//!
//! When an output above the reader's focus changes height, the page below
//! it jumps. The compensator measures the output before and after a
//! re-render and scrolls the viewport by the difference.

mod compensator;
mod layout;
mod viewport;

pub use compensator::{HeightCapture, ScrollCompensator, ScrollDecision};
pub use layout::{BlockLayout, Layout};
pub use viewport::{TrackedViewport, Viewport};

#[cfg(test)]
pub use viewport::MockViewport;
