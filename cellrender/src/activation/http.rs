//! HTTP script loader.

use super::{ScriptLoader, ScriptRequest};
use crate::errors::LoadError;
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Url;
use std::sync::Arc;
use tracing::debug;

/// Fetches remote scripts over HTTP and keeps their sources.
///
/// A load resolves once the response body has been read. Relative sources
/// are resolved against the base URL when one is set.
#[derive(Debug, Clone)]
pub struct HttpScriptLoader {
    client: reqwest::Client,
    base_url: Option<Url>,
    sources: Arc<DashMap<String, String>>,
}

impl Default for HttpScriptLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpScriptLoader {
    /// Creates a loader with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Creates a loader with a preconfigured client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: None,
            sources: Arc::new(DashMap::new()),
        }
    }

    /// Sets the base URL for relative sources.
    pub fn with_base_url(mut self, base: &str) -> Result<Self, LoadError> {
        let url = Url::parse(base).map_err(|e| LoadError::network(base, e.to_string()))?;
        self.base_url = Some(url);
        Ok(self)
    }

    /// Returns the fetched source of a script, keyed by its `src`.
    #[must_use]
    pub fn source(&self, src: &str) -> Option<String> {
        self.sources.get(src).map(|entry| entry.value().clone())
    }

    /// Returns how many distinct scripts have been fetched.
    #[must_use]
    pub fn fetched_count(&self) -> usize {
        self.sources.len()
    }

    fn resolve(&self, src: &str) -> Result<Url, LoadError> {
        let parsed = match &self.base_url {
            Some(base) => base.join(src),
            None => Url::parse(src),
        };
        parsed.map_err(|e| LoadError::network(src, e.to_string()))
    }
}

#[async_trait]
impl ScriptLoader for HttpScriptLoader {
    async fn load(&self, request: &ScriptRequest) -> Result<(), LoadError> {
        let url = self.resolve(&request.src)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::network(&request.src, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                src: request.src.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LoadError::network(&request.src, e.to_string()))?;
        debug!(src = %request.src, bytes = body.len(), "Fetched script");
        self.sources.insert(request.src.clone(), body);
        Ok(())
    }
}
