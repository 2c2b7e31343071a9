//! Script nodes discovered in injected markup.

use crate::dom::{Document, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a script is a module or a classic script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    /// `type="module"`.
    Module,
    /// Anything else.
    #[default]
    Classic,
}

impl ScriptKind {
    /// Classifies a `type` attribute. Only the exact value `module` makes a
    /// module script.
    #[must_use]
    pub fn from_type_attribute(value: Option<&str>) -> Self {
        match value {
            Some("module") => Self::Module,
            _ => Self::Classic,
        }
    }

    /// Returns the `type` attribute written on a loadable script element.
    #[must_use]
    pub const fn type_attribute(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Classic => "text/javascript",
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module => write!(f, "module"),
            Self::Classic => write!(f, "classic"),
        }
    }
}

/// One script element found in markup, in document order.
///
/// The element itself stays in the tree but is inert; the pipeline consumes
/// the node exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptNode {
    /// The inert `<script>` element.
    pub element: NodeId,
    /// Remote source, if any. An empty `src` attribute counts as inline.
    pub src: Option<String>,
    /// Module or classic.
    pub kind: ScriptKind,
    /// Inline source text.
    pub source_text: String,
}

impl ScriptNode {
    /// Reads a script node from a `<script>` element.
    #[must_use]
    pub fn from_element(document: &Document, element: NodeId) -> Option<Self> {
        let el = document.element(element)?;
        if el.name() != "script" {
            return None;
        }
        let src = el
            .attr("src")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        Some(Self {
            element,
            src,
            kind: ScriptKind::from_type_attribute(el.attr("type")),
            source_text: document.text_content(element),
        })
    }

    /// Returns the load request for a remote script.
    #[must_use]
    pub fn request(&self) -> Option<ScriptRequest> {
        self.src.as_ref().map(|src| ScriptRequest {
            src: src.clone(),
            kind: self.kind,
        })
    }
}

/// A request to load one remote script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptRequest {
    /// The script URL, exactly as written in the markup.
    pub src: String,
    /// Module or classic.
    pub kind: ScriptKind,
}
