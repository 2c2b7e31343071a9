//! External collaborators invoked by an output widget.
//!
//! Reactive bond wiring, math typesetting, error formatting and the request
//! channel live outside this crate. Each is a trait with a no-op (or
//! minimal) default so a widget works without any of them.

mod bonds;
mod error_renderer;
mod math;
mod requests;

pub use bonds::{BondConnector, NoOpBondConnector};
pub use error_renderer::{ErrorRenderer, StacktraceRenderer};
pub use math::{MathTypesetter, NoOpTypesetter};
pub use requests::{no_requests, NoOpRequests, RequestChannel, RequestHandle};

use std::sync::Arc;

/// The set of collaborators a widget calls into.
#[derive(Clone)]
pub struct Collaborators {
    /// Wires reactive inputs after activation completes.
    pub bonds: Arc<dyn BondConnector>,
    /// Typesets math after bonds are connected.
    pub math: Arc<dyn MathTypesetter>,
    /// Renders stacktrace outputs.
    pub errors: Arc<dyn ErrorRenderer>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            bonds: Arc::new(NoOpBondConnector),
            math: Arc::new(NoOpTypesetter),
            errors: Arc::new(StacktraceRenderer),
        }
    }
}

impl Collaborators {
    /// Creates the default collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bond connector.
    #[must_use]
    pub fn with_bonds(mut self, bonds: Arc<dyn BondConnector>) -> Self {
        self.bonds = bonds;
        self
    }

    /// Sets the math typesetter.
    #[must_use]
    pub fn with_math(mut self, math: Arc<dyn MathTypesetter>) -> Self {
        self.math = math;
        self
    }

    /// Sets the error renderer.
    #[must_use]
    pub fn with_errors(mut self, errors: Arc<dyn ErrorRenderer>) -> Self {
        self.errors = errors;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
