//! Rendering of stacktrace outputs.

use super::RequestHandle;
use crate::core::{CellId, ErrorPayload};
use crate::dom::{Document, NodeId};
use crate::errors::DomError;

/// Renders a structured error into the output body.
pub trait ErrorRenderer: Send + Sync {
    /// Appends the rendering of `payload` to `parent`.
    fn render(
        &self,
        document: &mut Document,
        parent: NodeId,
        payload: &ErrorPayload,
        cell_id: CellId,
        requests: &RequestHandle,
    ) -> Result<(), DomError>;
}

/// Plain rendering:
/// `<jlerror><header>msg</header><section><ol><li>…</li></ol></section></jlerror>`.
///
/// Each frame is `<li><mark>call</mark>@<a>file:line</a></li>`; inlined
/// frames get `class="inlined"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StacktraceRenderer;

impl ErrorRenderer for StacktraceRenderer {
    fn render(
        &self,
        document: &mut Document,
        parent: NodeId,
        payload: &ErrorPayload,
        cell_id: CellId,
        _requests: &RequestHandle,
    ) -> Result<(), DomError> {
        let error = document.create_element("jlerror");
        document.set_attr(error, "data-cell-id", cell_id.to_string())?;
        document.append_child(parent, error)?;

        let header = document.create_element("header");
        let message = document.create_text(payload.msg.as_str());
        document.append_child(header, message)?;
        document.append_child(error, header)?;

        if payload.stacktrace.is_empty() {
            return Ok(());
        }

        let section = document.create_element("section");
        let list = document.create_element("ol");
        document.append_child(error, section)?;
        document.append_child(section, list)?;

        for frame in &payload.stacktrace {
            let item = document.create_element("li");
            if frame.inlined {
                document.set_attr(item, "class", "inlined")?;
            }
            let call = document.create_element("mark");
            let call_text = document.create_text(frame.call.as_str());
            document.append_child(call, call_text)?;
            document.append_child(item, call)?;

            if !frame.file.is_empty() {
                let at = document.create_text("@");
                let link = document.create_element("a");
                let location = document.create_text(format!("{}:{}", frame.file, frame.line));
                document.append_child(link, location)?;
                document.append_child(item, at)?;
                document.append_child(item, link)?;
            }
            document.append_child(list, item)?;
        }
        Ok(())
    }
}
