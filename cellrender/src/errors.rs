//! Error types for cellrender.
//!
//! Nearly every failure in this crate is absorbed where it happens: a broken
//! script or a failed fetch must not break the rest of the document. These
//! types exist so absorbed failures can still be logged, reported and
//! asserted on.

use thiserror::Error;

/// The main error type for cellrender operations.
#[derive(Debug, Error)]
pub enum CellRenderError {
    /// An inline script failed.
    #[error("{0}")]
    Script(#[from] ScriptError),

    /// A remote script failed to load.
    #[error("{0}")]
    Load(#[from] LoadError),

    /// Math typesetting failed.
    #[error("{0}")]
    Typeset(#[from] TypesetError),

    /// A configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A document tree operation was invalid.
    #[error("{0}")]
    Dom(#[from] DomError),

    /// An output body could not be decoded for its mime type.
    #[error("Malformed output payload: {0}")]
    MalformedPayload(String),

    /// The tracing subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Errors raised while evaluating an inline script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The script reported an error.
    #[error("Script raised an error: {0}")]
    Raised(String),

    /// The script panicked; the panic was caught at the node boundary.
    #[error("Script panicked: {0}")]
    Panicked(String),

    /// The script named a handler that is not registered.
    #[error("No script handler registered for '{0}'")]
    UnknownHandler(String),

    /// The script produced a node that could not be placed after it.
    #[error("Script result could not be inserted: {0}")]
    Insertion(String),
}

impl ScriptError {
    /// Creates a raised error from any displayable message.
    #[must_use]
    pub fn raised(message: impl Into<String>) -> Self {
        Self::Raised(message.into())
    }
}

/// Errors raised while loading a remote script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The request could not be sent or the body could not be read.
    #[error("Failed to fetch script '{src}': {reason}")]
    Network {
        /// The script source.
        src: String,
        /// What went wrong.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("Script '{src}' returned HTTP status {status}")]
    Status {
        /// The script source.
        src: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The load did not signal within the configured limit.
    #[error("Timed out loading script '{src}' after {millis}ms")]
    Timeout {
        /// The script source.
        src: String,
        /// The limit in milliseconds.
        millis: u64,
    },
}

impl LoadError {
    /// Creates a network error.
    #[must_use]
    pub fn network(src: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            src: src.into(),
            reason: reason.into(),
        }
    }

    /// Returns the source of the script that failed.
    #[must_use]
    pub fn src(&self) -> &str {
        match self {
            Self::Network { src, .. } | Self::Status { src, .. } | Self::Timeout { src, .. } => src,
        }
    }
}

/// Error raised by a math typesetter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to typeset math: {message}")]
pub struct TypesetError {
    /// The error message.
    pub message: String,
}

impl TypesetError {
    /// Creates a new typeset error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised by document tree operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomError {
    /// The node id does not belong to this document.
    #[error("Node #{0} does not exist")]
    UnknownNode(usize),

    /// The operation needs a parent but the node is detached.
    #[error("Node #{0} has no parent")]
    Detached(usize),

    /// The operation needs an element but got another node kind.
    #[error("Node #{0} is not an element")]
    NotAnElement(usize),

    /// Inserting the node would make it its own ancestor.
    #[error("Node #{child} cannot be inserted below itself")]
    Cycle {
        /// The node being inserted.
        child: usize,
    },

    /// The node holds the document head or body and cannot be emptied.
    #[error("Node #{0} holds the document head or body")]
    Protected(usize),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// The file path.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The config could not be parsed.
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value outside its valid range.
    #[error("Invalid config value for '{field}': {message}")]
    Invalid {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },
}

impl ConfigError {
    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_src() {
        let err = LoadError::network("https://cdn.example/lib.js", "connection refused");
        assert_eq!(err.src(), "https://cdn.example/lib.js");

        let err = LoadError::Timeout {
            src: "a.js".to_string(),
            millis: 250,
        };
        assert_eq!(err.src(), "a.js");
        assert_eq!(err.to_string(), "Timed out loading script 'a.js' after 250ms");
    }

    #[test]
    fn test_script_error_converts() {
        let err: CellRenderError = ScriptError::raised("boom").into();
        assert_eq!(err.to_string(), "Script raised an error: boom");
    }

    #[test]
    fn test_dom_error_display() {
        assert_eq!(DomError::Detached(4).to_string(), "Node #4 has no parent");
        assert_eq!(
            DomError::Cycle { child: 2 }.to_string(),
            "Node #2 cannot be inserted below itself"
        );
    }

    #[test]
    fn test_config_error_invalid() {
        let err = ConfigError::invalid("layout.line_height_px", "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid config value for 'layout.line_height_px': must be positive"
        );
    }
}
