//! Script activation.
//!
//! Finds the `<script>` elements of freshly injected markup and runs them
//! in document order:
//!
//! - Remote scripts are inserted into the document head and awaited, unless
//!   a script with the same `src` is already there
//! - Inline scripts are evaluated synchronously, bound to the output root,
//!   and may expand into an element placed right after themselves
//! - Failures of either kind are logged and skipped
//!
//! Scripts run with full document privileges; authors are trusted.

mod evaluator;
#[cfg(feature = "http")]
mod http;
mod loader;
mod pipeline;
#[cfg(test)]
mod pipeline_tests;
mod queue;
mod report;
mod script;

pub use evaluator::{HandlerRegistry, ScriptContext, ScriptEvaluator, ScriptHandler};
#[cfg(feature = "http")]
pub use http::HttpScriptLoader;
pub use loader::{NoOpScriptLoader, ScriptLoader};
pub use pipeline::{ActivationRun, ScriptActivationPipeline};
pub use queue::ActivationQueue;
pub use report::{ActivationReport, ScriptOutcome};
pub use script::{ScriptKind, ScriptNode, ScriptRequest};
