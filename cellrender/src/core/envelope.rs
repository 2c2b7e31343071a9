//! The update envelope handed to an output widget.

use super::CellOutput;
use crate::collaborators::{no_requests, RequestHandle};
use tokio::sync::watch;

/// External "all cells completed" signal.
///
/// This crate never completes it; it only passes it through to the bond
/// connector, which may wait on it.
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    rx: watch::Receiver<bool>,
}

/// The completing side of a [`CompletionSignal`].
#[derive(Debug)]
pub struct CompletionTrigger {
    tx: watch::Sender<bool>,
}

/// Creates a connected trigger and signal.
#[must_use]
pub fn completion_pair() -> (CompletionTrigger, CompletionSignal) {
    let (tx, rx) = watch::channel(false);
    (CompletionTrigger { tx }, CompletionSignal { rx })
}

impl CompletionTrigger {
    /// Completes the signal. Idempotent.
    pub fn complete(&self) {
        self.tx.send_replace(true);
    }
}

impl CompletionSignal {
    /// A signal that is already complete.
    #[must_use]
    pub fn completed() -> Self {
        let (trigger, signal) = completion_pair();
        trigger.complete();
        signal
    }

    /// Returns true once the signal has completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits for completion. Returns false if the trigger was dropped
    /// without completing.
    pub async fn wait(&self) -> bool {
        let mut rx = self.rx.clone();
        let done = rx.wait_for(|done| *done).await.is_ok();
        done
    }
}

/// One inbound update: the output plus opaque pass-through values.
#[derive(Debug, Clone)]
pub struct UpdateEnvelope {
    /// The new output.
    pub output: CellOutput,
    /// Passed to the bond connector unchanged.
    pub all_completed: CompletionSignal,
    /// Passed to the bond connector and error renderer unchanged.
    pub requests: RequestHandle,
}

impl UpdateEnvelope {
    /// Wraps an output with a completed signal and a no-op request channel.
    #[must_use]
    pub fn new(output: CellOutput) -> Self {
        Self {
            output,
            all_completed: CompletionSignal::completed(),
            requests: no_requests(),
        }
    }

    /// Sets the completion signal.
    #[must_use]
    pub fn with_all_completed(mut self, signal: CompletionSignal) -> Self {
        self.all_completed = signal;
        self
    }

    /// Sets the request channel.
    #[must_use]
    pub fn with_requests(mut self, requests: RequestHandle) -> Self {
        self.requests = requests;
        self
    }

    /// Returns the output's timestamp.
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.output.timestamp
    }
}
