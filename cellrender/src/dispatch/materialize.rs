//! Writing a display strategy into the document.

use super::DisplayStrategy;
use crate::collaborators::{ErrorRenderer, RequestHandle};
use crate::core::CellId;
use crate::dom::{Document, NodeId};
use crate::errors::DomError;

/// Context needed to materialize error outputs.
pub struct RenderTarget<'a> {
    /// The cell being rendered.
    pub cell_id: CellId,
    /// Request channel handed to the error renderer.
    pub requests: &'a RequestHandle,
    /// Renderer for stacktrace outputs.
    pub error_renderer: &'a dyn ErrorRenderer,
}

/// Appends the body for `strategy` to `parent` and returns it.
///
/// The body is always a `<div>`. Markup is parsed into it with every
/// `<script>` left inert; activating them is the caller's job.
pub fn materialize(
    document: &mut Document,
    parent: NodeId,
    strategy: &DisplayStrategy,
    target: &RenderTarget<'_>,
) -> Result<NodeId, DomError> {
    let body = document.create_element("div");
    document.append_child(parent, body)?;

    match strategy {
        DisplayStrategy::Image { src } => {
            let img = document.create_element("img");
            document.set_attr(img, "src", src.as_str())?;
            document.append_child(body, img)?;
        }
        DisplayStrategy::Markup { markup } => {
            document.set_inner_html(body, markup)?;
        }
        DisplayStrategy::Error { payload } => {
            target.error_renderer.render(
                document,
                body,
                payload,
                target.cell_id,
                target.requests,
            )?;
        }
        DisplayStrategy::Preformatted { text } => {
            let pre = document.create_element("pre");
            let code = document.create_element("code");
            let content = document.create_text(text.as_str());
            document.append_child(code, content)?;
            document.append_child(pre, code)?;
            document.append_child(body, pre)?;
        }
        DisplayStrategy::Empty => {}
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{no_requests, StacktraceRenderer};
    use crate::core::ErrorPayload;
    use pretty_assertions::assert_eq;

    fn materialized(strategy: &DisplayStrategy) -> String {
        let mut doc = Document::new();
        let requests = no_requests();
        let target = RenderTarget {
            cell_id: CellId::new(),
            requests: &requests,
            error_renderer: &StacktraceRenderer,
        };
        let parent = doc.create_element("celloutput");
        materialize(&mut doc, parent, strategy, &target).unwrap();
        doc.inner_html(parent)
    }

    #[test]
    fn test_image() {
        let html = materialized(&DisplayStrategy::Image {
            src: "plot.png".to_string(),
        });
        assert_eq!(html, r#"<div><img src="plot.png"></div>"#);
    }

    #[test]
    fn test_preformatted_is_escaped() {
        let html = materialized(&DisplayStrategy::Preformatted {
            text: "<b>not bold</b>".to_string(),
        });
        assert_eq!(html, "<div><pre><code>&lt;b&gt;not bold&lt;/b&gt;</code></pre></div>");
    }

    #[test]
    fn test_markup_is_live() {
        let html = materialized(&DisplayStrategy::Markup {
            markup: "<b>bold</b><script>log x</script>".to_string(),
        });
        assert_eq!(html, "<div><b>bold</b><script>log x</script></div>");
    }

    #[test]
    fn test_error_and_empty() {
        let html = materialized(&DisplayStrategy::Error {
            payload: ErrorPayload {
                msg: "bad".to_string(),
                stacktrace: Vec::new(),
            },
        });
        assert!(html.starts_with("<div><jlerror"));
        assert_eq!(materialized(&DisplayStrategy::Empty), "<div></div>");
    }
}
