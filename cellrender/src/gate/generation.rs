//! Per-widget run generations.
//!
//! Every admitted update starts a new generation. An activation run holds a
//! [`RunTicket`] for the generation it belongs to; once a newer update has
//! replaced the container, the ticket reports itself superseded and the run
//! stops touching the document.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic generation counter owned by one output widget.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    /// Creates a counter at generation `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation and returns its ticket.
    pub fn advance(&self) -> RunTicket {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        RunTicket {
            counter: Some(Arc::clone(&self.current)),
            generation,
        }
    }

    /// Returns the latest generation.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

/// Proof of membership in one generation.
#[derive(Debug, Clone)]
pub struct RunTicket {
    counter: Option<Arc<AtomicU64>>,
    generation: u64,
}

impl RunTicket {
    /// A ticket not tied to any widget; it is never superseded.
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            counter: None,
            generation: 0,
        }
    }

    /// Returns the generation this ticket was issued for.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true while no newer generation has started.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.counter
            .as_ref()
            .map_or(true, |c| c.load(Ordering::SeqCst) == self.generation)
    }

    /// Returns true once a newer generation has started.
    #[must_use]
    pub fn is_superseded(&self) -> bool {
        !self.is_current()
    }
}
