//! Markup serialization of document subtrees.

use super::{Document, NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

enum Step<'a> {
    Open { id: NodeId, raw_text: bool },
    Close(&'a str),
}

/// Serializes the children of a node.
pub fn inner_html(document: &Document, id: NodeId) -> String {
    let raw_text = is_raw_text(document, id);
    let mut pending = Vec::new();
    push_children(document, id, raw_text, &mut pending);
    write_steps(document, pending)
}

/// Serializes a node and its subtree.
pub fn outer_html(document: &Document, id: NodeId) -> String {
    write_steps(document, vec![Step::Open { id, raw_text: false }])
}

fn is_raw_text(document: &Document, id: NodeId) -> bool {
    document
        .tag_name(id)
        .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name))
}

fn push_children(document: &Document, id: NodeId, raw_text: bool, pending: &mut Vec<Step<'_>>) {
    pending.extend(
        document
            .children(id)
            .iter()
            .rev()
            .map(|child| Step::Open { id: *child, raw_text }),
    );
}

fn write_steps<'a>(document: &'a Document, mut pending: Vec<Step<'a>>) -> String {
    let mut out = String::new();
    while let Some(step) = pending.pop() {
        let (id, raw_text) = match step {
            Step::Close(name) => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
                continue;
            }
            Step::Open { id, raw_text } => (id, raw_text),
        };
        match document.kind(id) {
            Some(NodeKind::Element(el)) => {
                out.push('<');
                out.push_str(el.name());
                for (name, value) in el.attributes() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.name()) {
                    continue;
                }
                pending.push(Step::Close(el.name()));
                push_children(document, id, is_raw_text(document, id), &mut pending);
            }
            Some(NodeKind::Text(text)) if raw_text => out.push_str(text),
            Some(NodeKind::Text(text)) => out.push_str(&escape_text(text)),
            Some(NodeKind::Comment(text)) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Some(NodeKind::Root) => push_children(document, id, false, &mut pending),
            None => {}
        }
    }
    out
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
