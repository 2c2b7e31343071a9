//! Core data model.
//!
//! - Cell identifiers and mime types
//! - Cell outputs as delivered by the transport
//! - The update envelope and its pass-through completion signal

mod cell;
mod envelope;
mod mime;
mod output;

pub use cell::CellId;
pub use envelope::{completion_pair, CompletionSignal, CompletionTrigger, UpdateEnvelope};
pub use mime::Mime;
pub use output::{CellOutput, ErrorPayload, OutputBody, StackFrame};
