//! Math typesetting.

use crate::dom::{Document, NodeId};
use crate::errors::TypesetError;

/// Converts TeX in freshly activated markup. Best effort: failures are
/// logged by the caller and never retried.
pub trait MathTypesetter: Send + Sync {
    /// Typesets math below `root`.
    fn typeset(&self, document: &mut Document, root: NodeId) -> Result<(), TypesetError>;
}

/// A typesetter that leaves the document untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTypesetter;

impl MathTypesetter for NoOpTypesetter {
    fn typeset(&self, _document: &mut Document, _root: NodeId) -> Result<(), TypesetError> {
        Ok(())
    }
}
