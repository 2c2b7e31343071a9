//! Event emission for output updates and script activation.
//!
//! Widgets and pipelines report what they did through an [`EventSink`].
//! The default sink discards everything; [`LoggingEventSink`] forwards to
//! `tracing` and [`CollectingEventSink`] keeps events for assertions.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use std::sync::Arc;

/// Event type names emitted by this crate.
pub mod names {
    /// An update was dropped by the staleness gate.
    pub const UPDATE_REJECTED: &str = "update.rejected";
    /// An update was written into the output container.
    pub const UPDATE_APPLIED: &str = "update.applied";
    /// A newer update replaced the container before this run completed.
    pub const UPDATE_SUPERSEDED: &str = "update.superseded";
    /// The viewport was scrolled to compensate for a height change.
    pub const SCROLL_COMPENSATED: &str = "update.scroll_compensated";
    /// A remote script finished loading.
    pub const SCRIPT_LOADED: &str = "script.loaded";
    /// A remote script was already present in the document head.
    pub const SCRIPT_ALREADY_LOADED: &str = "script.already_loaded";
    /// A remote script failed to load.
    pub const SCRIPT_LOAD_FAILED: &str = "script.load_failed";
    /// An inline script ran.
    pub const SCRIPT_EVALUATED: &str = "script.evaluated";
    /// An inline script failed.
    pub const SCRIPT_EVAL_FAILED: &str = "script.eval_failed";
    /// Every script of a run has been processed.
    pub const ACTIVATION_COMPLETED: &str = "activation.completed";
}

/// Returns a sink that discards all events.
#[must_use]
pub fn noop_sink() -> Arc<dyn EventSink> {
    Arc::new(NoOpEventSink)
}
