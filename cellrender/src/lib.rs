//! # Cellrender
//!
//! Renders the output of a notebook cell into a live document and keeps it
//! in sync with a stream of timestamped updates.
//!
//! Cellrender provides:
//!
//! - **Output dispatch**: images, live markup, structured errors and plain
//!   text each get their own display strategy
//! - **Script activation**: scripts in injected markup run one at a time in
//!   document order, remote ones deduplicated against the document head
//! - **Staleness gating**: late, older updates never overwrite newer ones
//! - **Scroll compensation**: the reader's position holds while an output
//!   above it changes height
//!
//! ## Trust model
//!
//! Output markup is authored by the notebook user and trusted. Scripts run
//! with full access to the document; nothing is sandboxed or isolated.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cellrender::prelude::*;
//! use std::sync::Arc;
//!
//! let document = Document::new().into_shared();
//! let cell = {
//!     let mut doc = document.lock();
//!     let cell = doc.create_element("cell");
//!     let body = doc.body();
//!     doc.append_child(body, cell)?;
//!     cell
//! };
//! let pipeline = ScriptActivationPipeline::new(Arc::new(HttpScriptLoader::new()), Arc::new(HandlerRegistry::new()));
//! let widget = OutputWidget::mount(document, cell, CellId::new(), pipeline)?;
//!
//! let output = CellOutput::new(widget.cell_id(), "text/html", "<b>hi</b>", 1.0);
//! let outcome = widget.update(UpdateEnvelope::new(output)).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod activation;
pub mod collaborators;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod dom;
pub mod errors;
pub mod events;
pub mod gate;
pub mod observability;
pub mod scroll;
pub mod testing;
pub mod widget;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::activation::{
        ActivationQueue, ActivationReport, HandlerRegistry, NoOpScriptLoader, ScriptActivationPipeline,
        ScriptContext, ScriptEvaluator, ScriptKind, ScriptLoader, ScriptNode, ScriptOutcome,
    };
    #[cfg(feature = "http")]
    pub use crate::activation::HttpScriptLoader;
    pub use crate::collaborators::{
        BondConnector, Collaborators, ErrorRenderer, MathTypesetter, RequestChannel, RequestHandle,
    };
    pub use crate::config::RenderConfig;
    pub use crate::core::{
        completion_pair, CellId, CellOutput, CompletionSignal, ErrorPayload, Mime, OutputBody,
        UpdateEnvelope,
    };
    pub use crate::dispatch::{render, DisplayStrategy, StrategyKind};
    pub use crate::dom::{Document, NodeId, SharedDocument};
    pub use crate::errors::{CellRenderError, DomError, LoadError, ScriptError, TypesetError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::gate::StalenessGate;
    pub use crate::observability::init_tracing;
    pub use crate::scroll::{BlockLayout, Layout, ScrollDecision, Viewport};
    pub use crate::widget::{OutputWidget, UpdateOutcome};
}
