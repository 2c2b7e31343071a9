//! The opaque request channel.

use std::fmt::Debug;
use std::sync::Arc;

/// Capability for sending follow-up messages to the notebook backend.
///
/// Widgets never call it themselves; they hand it to the bond connector and
/// the error renderer unchanged.
pub trait RequestChannel: Send + Sync + Debug {
    /// Sends a message.
    fn send(&self, message_type: &str, body: serde_json::Value) -> anyhow::Result<()>;
}

/// Shared handle to a request channel.
pub type RequestHandle = Arc<dyn RequestChannel>;

/// A channel that drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpRequests;

impl RequestChannel for NoOpRequests {
    fn send(&self, _message_type: &str, _body: serde_json::Value) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Returns a handle to a [`NoOpRequests`] channel.
#[must_use]
pub fn no_requests() -> RequestHandle {
    Arc::new(NoOpRequests)
}
