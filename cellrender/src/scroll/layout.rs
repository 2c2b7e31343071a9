//! Height measurement.

use crate::config::LayoutConfig;
use crate::dom::{Document, NodeId, NodeKind};

/// Measures the rendered height of a node.
pub trait Layout: Send + Sync {
    /// Returns the scroll height of `node` in pixels.
    fn scroll_height(&self, document: &Document, node: NodeId) -> f64;
}

/// Deterministic block-flow height estimate.
///
/// Text contributes one line per non-blank line (every line inside
/// `<pre>`), `<br>` one line, replaced elements (`img`, `svg`, `canvas`,
/// `video`, `iframe`) the configured image height, and elements that never
/// render nothing. A numeric `height` attribute overrides the estimate for
/// its element.
#[derive(Debug, Clone, Default)]
pub struct BlockLayout {
    config: LayoutConfig,
}

const REPLACED: &[&str] = &["img", "svg", "canvas", "video", "iframe"];
const HIDDEN: &[&str] = &["script", "style", "template", "head", "meta", "link"];

impl BlockLayout {
    /// Creates a layout with the given metrics.
    #[must_use]
    pub const fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    fn height(&self, document: &Document, node: NodeId) -> f64 {
        let mut total = 0.0;
        let mut pending = vec![(node, false)];
        while let Some((id, preformatted)) = pending.pop() {
            match document.kind(id) {
                Some(NodeKind::Text(text)) => total += self.text_height(text, preformatted),
                Some(NodeKind::Element(el)) => {
                    let name = el.name();
                    if HIDDEN.contains(&name) {
                        continue;
                    }
                    if let Some(explicit) = el.attr("height").and_then(|h| h.trim().trim_end_matches("px").parse::<f64>().ok()) {
                        total += explicit.max(0.0);
                    } else if REPLACED.contains(&name) {
                        total += self.config.image_height_px;
                    } else if name == "br" {
                        total += self.config.line_height_px;
                    } else {
                        let preformatted = preformatted || name == "pre";
                        pending.extend(document.children(id).iter().map(|child| (*child, preformatted)));
                    }
                }
                Some(NodeKind::Root) => {
                    pending.extend(document.children(id).iter().map(|child| (*child, preformatted)));
                }
                Some(NodeKind::Comment(_)) | None => {}
            }
        }
        total
    }

    #[allow(clippy::cast_precision_loss)]
    fn text_height(&self, text: &str, preformatted: bool) -> f64 {
        let lines = if preformatted {
            text.lines().count()
        } else {
            text.lines().filter(|l| !l.trim().is_empty()).count()
        };
        lines as f64 * self.config.line_height_px
    }
}

impl Layout for BlockLayout {
    fn scroll_height(&self, document: &Document, node: NodeId) -> f64 {
        self.height(document, node)
    }
}
