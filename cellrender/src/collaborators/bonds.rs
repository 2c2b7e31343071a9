//! Reactive bond connection.

use crate::core::CompletionSignal;
use crate::dom::{NodeId, SharedDocument};
use super::RequestHandle;
use async_trait::async_trait;

/// Wires reactive input widgets found in freshly activated markup.
///
/// Called exactly once per completed activation run that is still current,
/// after every script of the run has been processed.
#[async_trait]
pub trait BondConnector: Send + Sync {
    /// Connects bonds below `root`.
    ///
    /// Implementations must not hold the document lock across an await.
    async fn connect(
        &self,
        document: &SharedDocument,
        root: NodeId,
        all_completed: &CompletionSignal,
        requests: &RequestHandle,
    ) -> anyhow::Result<()>;
}

/// A connector that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpBondConnector;

#[async_trait]
impl BondConnector for NoOpBondConnector {
    async fn connect(
        &self,
        _document: &SharedDocument,
        _root: NodeId,
        _all_completed: &CompletionSignal,
        _requests: &RequestHandle,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
