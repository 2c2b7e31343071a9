//! Remote script loading.

use super::ScriptRequest;
use crate::errors::LoadError;
use async_trait::async_trait;

/// Loads a remote script and resolves once its load or error signal fires.
///
/// The pipeline treats both outcomes the same way: it moves on. The error
/// only feeds logs, events and the activation report.
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    /// Loads one script.
    async fn load(&self, request: &ScriptRequest) -> Result<(), LoadError>;
}

/// A loader whose every load succeeds immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpScriptLoader;

#[async_trait]
impl ScriptLoader for NoOpScriptLoader {
    async fn load(&self, _request: &ScriptRequest) -> Result<(), LoadError> {
        Ok(())
    }
}
