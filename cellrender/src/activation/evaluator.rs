//! Inline script evaluation.
//!
//! Inline scripts are author-trusted and run with full access to the
//! document. Nothing here sandboxes them.

use crate::dom::{Document, NodeId};
use crate::errors::ScriptError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What an inline script sees while it runs.
///
/// The context is bound to the output root, and exposes the script element
/// currently running, the way a parser-inserted script can find itself.
pub struct ScriptContext<'a> {
    document: &'a mut Document,
    root: NodeId,
    current_script: NodeId,
    source: &'a str,
}

impl<'a> ScriptContext<'a> {
    /// Creates a context for one evaluation.
    pub fn new(document: &'a mut Document, root: NodeId, current_script: NodeId, source: &'a str) -> Self {
        Self {
            document,
            root,
            current_script,
            source,
        }
    }

    /// The output root the script is bound to.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// The inert script element being evaluated.
    #[must_use]
    pub const fn current_script(&self) -> NodeId {
        self.current_script
    }

    /// The script's source text.
    #[must_use]
    pub const fn source(&self) -> &'a str {
        self.source
    }

    /// Read access to the document.
    #[must_use]
    pub fn document(&self) -> &Document {
        self.document
    }

    /// Write access to the document.
    pub fn document_mut(&mut self) -> &mut Document {
        self.document
    }
}

/// Evaluates inline scripts.
///
/// Returning `Ok(Some(node))` with an element asks the pipeline to insert
/// it right after the script element, so a script can expand into content.
/// Evaluation runs with the document locked: implementations must use the
/// context's document and never lock a shared handle themselves.
pub trait ScriptEvaluator: Send + Sync {
    /// Evaluates one inline script.
    fn evaluate(&self, ctx: &mut ScriptContext<'_>) -> Result<Option<NodeId>, ScriptError>;
}

/// A handler invoked for one inline script. Receives the context and the
/// script text after the handler name.
pub type ScriptHandler =
    Arc<dyn Fn(&mut ScriptContext<'_>, &str) -> Result<Option<NodeId>, ScriptError> + Send + Sync>;

/// Evaluator that runs registered Rust handlers.
///
/// The first whitespace-separated token of an inline script names the
/// handler; the rest of the text is its argument. Empty scripts are no-ops
/// and unknown names fail with [`ScriptError::UnknownHandler`].
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, ScriptHandler>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, replacing any previous one with that name.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&mut ScriptContext<'_>, &str) -> Result<Option<NodeId>, ScriptError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    /// Registers a handler and returns the registry.
    #[must_use]
    pub fn with_handler<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut ScriptContext<'_>, &str) -> Result<Option<NodeId>, ScriptError> + Send + Sync + 'static,
    {
        self.register(name, handler);
        self
    }

    /// Returns true if a handler with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

impl ScriptEvaluator for HandlerRegistry {
    fn evaluate(&self, ctx: &mut ScriptContext<'_>) -> Result<Option<NodeId>, ScriptError> {
        let source = ctx.source().trim();
        if source.is_empty() {
            return Ok(None);
        }
        let (name, argument) = source
            .split_once(char::is_whitespace)
            .map_or((source, ""), |(name, rest)| (name, rest.trim()));
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| ScriptError::UnknownHandler(name.to_string()))?;
        handler(ctx, argument)
    }
}
