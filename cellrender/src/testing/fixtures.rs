//! Notebook fixtures for widget tests.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::activation::ScriptActivationPipeline;
use crate::core::{CellId, CellOutput, UpdateEnvelope};
use crate::dom::{Document, NodeId, SharedDocument};
use crate::errors::DomError;
use crate::scroll::Layout;
use crate::widget::OutputWidget;

/// A document with a row of `<cell>` elements, each holding an editor.
///
/// ```text
/// body > notebook > cell* > editor
/// ```
#[derive(Debug, Clone)]
pub struct NotebookFixture {
    document: SharedDocument,
    cells: Vec<NodeId>,
    editors: Vec<NodeId>,
    ids: Vec<CellId>,
}

impl NotebookFixture {
    /// Creates a notebook with `cells` empty cells.
    #[must_use]
    pub fn new(cells: usize) -> Self {
        let mut doc = Document::new();
        let notebook = doc.create_element("notebook");
        let body = doc.body();
        let mut cell_nodes = Vec::with_capacity(cells);
        let mut editors = Vec::with_capacity(cells);

        // Freshly created nodes, so linking cannot fail.
        let _ = doc.append_child(body, notebook);
        for _ in 0..cells {
            let cell = doc.create_element("cell");
            let editor = doc.create_element("editor");
            let _ = doc.append_child(notebook, cell);
            let _ = doc.append_child(cell, editor);
            cell_nodes.push(cell);
            editors.push(editor);
        }

        Self {
            document: doc.into_shared(),
            cells: cell_nodes,
            editors,
            ids: (0..cells).map(|_| CellId::new()).collect(),
        }
    }

    /// Returns the shared document.
    #[must_use]
    pub fn document(&self) -> SharedDocument {
        Arc::clone(&self.document)
    }

    /// Returns the `<cell>` element at `index`.
    #[must_use]
    pub fn cell(&self, index: usize) -> NodeId {
        self.cells[index]
    }

    /// Returns the id of the cell at `index`.
    #[must_use]
    pub fn cell_id(&self, index: usize) -> CellId {
        self.ids[index]
    }

    /// Mounts an output widget in the cell at `index`.
    pub fn mount(&self, index: usize, pipeline: ScriptActivationPipeline) -> Result<OutputWidget, DomError> {
        OutputWidget::mount(self.document(), self.cells[index], self.ids[index], pipeline)
    }

    /// Focuses the editor of the cell at `index`.
    pub fn focus(&self, index: usize) -> Result<(), DomError> {
        self.document.lock().focus(self.editors[index])
    }

    /// Clears focus.
    pub fn blur(&self) {
        self.document.lock().blur();
    }

    /// Builds an envelope for the cell at `index`.
    #[must_use]
    pub fn envelope(&self, index: usize, mime: &str, body: &str, timestamp: f64) -> UpdateEnvelope {
        UpdateEnvelope::new(CellOutput::new(self.ids[index], mime, body, timestamp))
    }

    /// Builds an HTML envelope for the cell at `index`.
    #[must_use]
    pub fn html(&self, index: usize, markup: &str, timestamp: f64) -> UpdateEnvelope {
        self.envelope(index, "text/html", markup, timestamp)
    }

    /// Builds a plain text envelope for the cell at `index`.
    #[must_use]
    pub fn plain(&self, index: usize, text: &str, timestamp: f64) -> UpdateEnvelope {
        self.envelope(index, "text/plain", text, timestamp)
    }

    /// Serializes the body of a widget's output.
    #[must_use]
    pub fn output_html(&self, widget: &OutputWidget) -> String {
        self.document.lock().inner_html(widget.container())
    }
}

/// A layout that returns queued heights, one per measurement.
///
/// Once the queue runs dry the last height is repeated. Useful for scroll
/// tests that need exact before/after values.
#[derive(Debug, Default)]
pub struct FixedLayout {
    heights: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
}

impl FixedLayout {
    /// Creates a layout that reports `heights` in order.
    #[must_use]
    pub fn new(heights: impl IntoIterator<Item = f64>) -> Self {
        Self {
            heights: Mutex::new(heights.into_iter().collect()),
            last: Mutex::new(0.0),
        }
    }
}

impl Layout for FixedLayout {
    fn scroll_height(&self, _document: &Document, _node: NodeId) -> f64 {
        let mut last = self.last.lock();
        if let Some(next) = self.heights.lock().pop_front() {
            *last = next;
        }
        *last
    }
}
