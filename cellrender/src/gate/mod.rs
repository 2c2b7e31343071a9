//! Update admission: the staleness gate and per-widget run generations.

mod generation;
mod staleness;

pub use generation::{GenerationCounter, RunTicket};
pub use staleness::StalenessGate;
