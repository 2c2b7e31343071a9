//! Arena-backed document tree.

use crate::errors::DomError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Handle to a node in a [`Document`].
///
/// A removed subtree's slots are reused by later nodes. Each slot carries a
/// generation, so a handle to a reclaimed node goes stale instead of
/// aliasing whatever took its place: lookups through it find nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Returns the arena index of this node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    /// Returns the slot generation this handle was issued for.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// An element's name and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
}

impl Element {
    /// Creates an element with no attributes. Names are stored lowercase.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    /// Returns the lowercase tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of an attribute.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, replacing any previous value.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_ascii_lowercase(), value)),
        }
    }

    /// Returns all attributes in insertion order.
    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root.
    Root,
    /// An element.
    Element(Element),
    /// A text node.
    Text(String),
    /// A comment.
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

fn is_live(slots: &[Slot], id: NodeId) -> bool {
    slots
        .get(id.index)
        .is_some_and(|s| s.generation == id.generation && s.node.is_some())
}

/// A live document: `root > html > (head, body)`.
///
/// The head is the script-bearing region used to deduplicate remote
/// scripts. Focus and each root's "current script" are tracked here too,
/// since both are document-level state in a browser.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    focused: Option<NodeId>,
    current_scripts: HashMap<NodeId, NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document with a head and a body.
    #[must_use]
    pub fn new() -> Self {
        let placeholder = NodeId {
            index: 0,
            generation: 0,
        };
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: placeholder,
            head: placeholder,
            body: placeholder,
            focused: None,
            current_scripts: HashMap::new(),
        };
        doc.root = doc.push(NodeKind::Root);
        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.link(doc.root, html);
        doc.link(html, head);
        doc.link(html, body);
        doc.head = head;
        doc.body = body;
        doc
    }

    /// Wraps the document for sharing between a widget and its pipeline runs.
    #[must_use]
    pub fn into_shared(self) -> super::SharedDocument {
        std::sync::Arc::new(parking_lot::Mutex::new(self))
    }

    /// Returns the document root.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the head element.
    #[must_use]
    pub const fn head(&self) -> NodeId {
        self.head
    }

    /// Returns the body element.
    #[must_use]
    pub const fn body(&self) -> NodeId {
        self.body
    }

    /// Returns the number of live nodes, attached or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Returns true if `id` refers to a node that has not been reclaimed.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        is_live(&self.slots, id)
    }

    fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.get(id).ok_or(DomError::UnknownNode(id.index))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index) {
                slot.node = Some(node);
                return NodeId {
                    index,
                    generation: slot.generation,
                };
            }
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    // Callers have already checked both ids and ruled out cycles.
    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(name)))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    /// Creates a detached comment.
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment(text.into()))
    }

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|n| &n.kind)
    }

    /// Returns the element data of a node, if it is an element.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    /// Returns true if the node is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Returns the tag name of an element.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::name)
    }

    /// Returns an attribute of an element.
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    /// Sets an attribute on an element.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Result<(), DomError> {
        match self.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Element(el)) => {
                el.set_attr(name, value);
                Ok(())
            }
            Some(_) => Err(DomError::NotAnElement(id.index)),
            None => Err(DomError::UnknownNode(id.index)),
        }
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Returns the children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Returns the element children of a node.
    #[must_use]
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    /// Returns the sibling right after a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|c| *c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Returns the siblings after a node, in order.
    #[must_use]
    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        let siblings = self.children(parent);
        siblings
            .iter()
            .position(|c| *c == id)
            .map(|pos| siblings[pos + 1..].to_vec())
            .unwrap_or_default()
    }

    /// Returns true if `ancestor` is `node` or one of its ancestors.
    #[must_use]
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Returns true if the node is reachable from the document root.
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, id)
    }

    /// Returns the node itself or its nearest ancestor with the given tag.
    #[must_use]
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.tag_name(current).is_some_and(|name| name.eq_ignore_ascii_case(tag)) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    /// Returns all descendants of a node in document (pre-)order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Returns descendant elements with the given tag, in document order.
    #[must_use]
    pub fn elements_by_tag(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| self.tag_name(*n).is_some_and(|name| name.eq_ignore_ascii_case(tag)))
            .collect()
    }

    /// Returns the concatenated text of a node and its descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(NodeKind::Text(text)) = self.kind(id) {
            return text.clone();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match self.kind(n) {
                Some(NodeKind::Text(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(parent)?;
        // A leaf can only be its own ancestor, so skip the walk up from `parent`.
        let cycle = if self.node(child)?.children.is_empty() {
            child == parent
        } else {
            self.is_inclusive_ancestor(child, parent)
        };
        if cycle {
            return Err(DomError::Cycle { child: child.index });
        }
        Ok(())
    }

    /// Removes a node from its parent. Detached nodes are left alone.
    pub fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            if let Some(node) = self.get_mut(parent) {
                node.children.retain(|c| *c != id);
            }
            if let Some(node) = self.get_mut(id) {
                node.parent = None;
            }
        }
        Ok(())
    }

    /// Appends a node as the last child of `parent`, moving it if needed.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insertable(parent, child)?;
        self.detach(child)?;
        self.link(parent, child);
        Ok(())
    }

    /// Inserts `new_node` right after `reference` under the same parent.
    pub fn insert_after(&mut self, reference: NodeId, new_node: NodeId) -> Result<(), DomError> {
        let parent = self
            .node(reference)?
            .parent
            .ok_or(DomError::Detached(reference.index))?;
        if new_node == reference {
            return Ok(());
        }
        self.check_insertable(parent, new_node)?;
        self.detach(new_node)?;
        let siblings = &mut self
            .get_mut(parent)
            .ok_or(DomError::UnknownNode(parent.index))?
            .children;
        let pos = siblings
            .iter()
            .position(|c| *c == reference)
            .ok_or(DomError::Detached(reference.index))?;
        siblings.insert(pos + 1, new_node);
        if let Some(node) = self.get_mut(new_node) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    /// Removes every child of a node and reclaims their subtrees.
    ///
    /// Handles into the removed subtrees go stale. The document root and the
    /// `<html>` element cannot be emptied this way.
    pub fn remove_children(&mut self, id: NodeId) -> Result<(), DomError> {
        if id == self.root || Some(id) == self.parent(self.body) {
            return Err(DomError::Protected(id.index));
        }
        let children = std::mem::take(&mut self.get_mut(id).ok_or(DomError::UnknownNode(id.index))?.children);
        for child in children {
            self.reclaim(child);
        }
        self.forget_stale_state();
        Ok(())
    }

    fn reclaim(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let Some(slot) = self
                .slots
                .get_mut(next.index)
                .filter(|s| s.generation == next.generation)
            else {
                continue;
            };
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(next.index);
            pending.extend(node.children);
        }
    }

    fn forget_stale_state(&mut self) {
        let slots = &self.slots;
        self.current_scripts
            .retain(|root, script| is_live(slots, *root) && is_live(slots, *script));
        if self.focused.is_some_and(|id| !is_live(slots, id)) {
            self.focused = None;
        }
    }

    /// Replaces the children of a node with parsed markup.
    ///
    /// The old children are reclaimed. Scripts in the markup become inert
    /// elements; nothing is executed.
    /// Returns the new top-level children.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) -> Result<Vec<NodeId>, DomError> {
        self.remove_children(id)?;
        super::parse::parse_fragment_into(self, id, markup)
    }

    /// Serializes the children of a node.
    #[must_use]
    pub fn inner_html(&self, id: NodeId) -> String {
        super::serialize::inner_html(self, id)
    }

    /// Serializes a node and its subtree.
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        super::serialize::outer_html(self, id)
    }

    /// Moves keyboard focus to a node.
    pub fn focus(&mut self, id: NodeId) -> Result<(), DomError> {
        self.node(id)?;
        self.focused = Some(id);
        Ok(())
    }

    /// Clears keyboard focus.
    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// Returns the focused node, if it is still connected.
    #[must_use]
    pub fn focused(&self) -> Option<NodeId> {
        self.focused.filter(|id| self.is_connected(*id))
    }

    /// Returns true if focus is on the node or inside it.
    #[must_use]
    pub fn has_focus_within(&self, id: NodeId) -> bool {
        self.focused()
            .is_some_and(|focused| self.is_inclusive_ancestor(id, focused))
    }

    /// Records the script currently being processed for an output root.
    ///
    /// Ignored if either node has been reclaimed.
    pub fn set_current_script(&mut self, root: NodeId, script: NodeId) {
        if self.contains(root) && self.contains(script) {
            self.current_scripts.insert(root, script);
        }
    }

    /// Returns the script most recently processed for an output root.
    #[must_use]
    pub fn current_script(&self, root: NodeId) -> Option<NodeId> {
        self.current_scripts.get(&root).copied()
    }

    /// Returns true if a script with exactly this `src` is in the head.
    #[must_use]
    pub fn head_has_script(&self, src: &str) -> bool {
        self.elements_by_tag(self.head, "script")
            .into_iter()
            .any(|s| self.attr(s, "src") == Some(src))
    }
}
