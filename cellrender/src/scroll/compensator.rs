//! Keeps the viewport steady while an output changes height.

use super::{Layout, Viewport};
use crate::dom::{Document, NodeId};
use serde::{Deserialize, Serialize};

/// Height of an output container captured before re-rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightCapture {
    /// The captured height in pixels.
    pub height: f64,
}

/// Whether and how the viewport is adjusted after a re-render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ScrollDecision {
    /// Scroll by `delta` pixels.
    Scroll {
        /// `new_height - old_height`.
        delta: f64,
    },
    /// The height did not change.
    Unchanged,
    /// No cell has keyboard focus, so there is no reading position to keep.
    NoFocus,
    /// The output belongs to a cell after the focused one; the reader is
    /// looking above it, so nothing moves.
    BelowFocus,
}

/// Scroll compensation around a re-render.
///
/// Cells are `<cell>` elements sharing a parent, each with its output in a
/// `<celloutput>` child.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollCompensator;

impl ScrollCompensator {
    /// Measures `container` before its content is replaced.
    #[must_use]
    pub fn capture(layout: &dyn Layout, document: &Document, container: NodeId) -> HeightCapture {
        HeightCapture {
            height: layout.scroll_height(document, container),
        }
    }

    /// Decides the adjustment once the synchronous replacement is done.
    #[must_use]
    pub fn decide(
        document: &Document,
        container: NodeId,
        before: HeightCapture,
        new_height: f64,
    ) -> ScrollDecision {
        let Some(focused_cell) = Self::focused_cell(document) else {
            return ScrollDecision::NoFocus;
        };
        if Self::outputs_after(document, focused_cell).contains(&container) {
            return ScrollDecision::BelowFocus;
        }
        let delta = new_height - before.height;
        if delta.abs() < f64::EPSILON {
            ScrollDecision::Unchanged
        } else {
            ScrollDecision::Scroll { delta }
        }
    }

    /// Applies a decision. Only [`ScrollDecision::Scroll`] touches the
    /// viewport.
    pub fn apply(decision: ScrollDecision, viewport: &dyn Viewport) {
        if let ScrollDecision::Scroll { delta } = decision {
            viewport.scroll_by(delta);
        }
    }

    /// Returns the cell that has focus within it.
    #[must_use]
    pub fn focused_cell(document: &Document) -> Option<NodeId> {
        document.focused().and_then(|node| document.closest(node, "cell"))
    }

    /// Returns the output containers of every cell after `cell`.
    #[must_use]
    pub fn outputs_after(document: &Document, cell: NodeId) -> Vec<NodeId> {
        document
            .following_siblings(cell)
            .into_iter()
            .filter(|sibling| document.tag_name(*sibling) == Some("cell"))
            .flat_map(|sibling| document.element_children(sibling))
            .filter(|child| document.tag_name(*child) == Some("celloutput"))
            .collect()
    }
}
