//! Document model.
//!
//! A minimal live document: an arena of elements, text and comments with a
//! head and a body, markup parsing via `scraper`, and serialization back to
//! markup. Output widgets and activation runs share one document through
//! [`SharedDocument`]; locks are taken per step and never held across an
//! await.

mod document;
mod parse;
mod serialize;

pub use document::{Document, Element, NodeId, NodeKind};
pub use parse::parse_fragment_into;

use parking_lot::Mutex;
use std::sync::Arc;

/// A document shared between widgets and in-flight activation runs.
pub type SharedDocument = Arc<Mutex<Document>>;
