//! Markup parsing into a [`Document`] using `scraper` (html5ever).

use super::{Document, NodeId};
use crate::errors::DomError;
use scraper::{Html, Node};

/// Parses `markup` as a body fragment and appends the result to `parent`.
///
/// Returns the new top-level nodes in order. Doctypes and processing
/// instructions are dropped. The copy walks an explicit stack, so nesting
/// depth is bounded by memory rather than the thread stack.
pub fn parse_fragment_into(
    document: &mut Document,
    parent: NodeId,
    markup: &str,
) -> Result<Vec<NodeId>, DomError> {
    let fragment = Html::parse_fragment(markup);
    // html5ever wraps fragment content in a synthetic <html> element.
    let wrapper = fragment.root_element();

    let mut created = Vec::new();
    let top: Vec<_> = wrapper.children().collect();
    let mut pending: Vec<_> = top.into_iter().rev().map(|source| (parent, source)).collect();

    while let Some((target, source)) = pending.pop() {
        let node = match source.value() {
            Node::Element(el) => {
                let id = document.create_element(el.name());
                for (name, value) in el.attrs() {
                    document.set_attr(id, name, value)?;
                }
                let children: Vec<_> = source.children().collect();
                pending.extend(children.into_iter().rev().map(|child| (id, child)));
                id
            }
            Node::Text(text) => document.create_text(&**text),
            Node::Comment(comment) => document.create_comment(&**comment),
            _ => continue,
        };
        // Pre-order: a node is attached before any of its children.
        document.append_child(target, node)?;
        if target == parent {
            created.push(node);
        }
    }
    Ok(created)
}
