//! Cell outputs as delivered by the transport.

use super::{CellId, Mime};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Body of a cell output: raw text (markup, image URL, plain text) or a
/// structured JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputBody {
    /// A text body.
    Text(String),
    /// A structured body.
    Structured(serde_json::Value),
}

impl Default for OutputBody {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl OutputBody {
    /// Returns true for an empty string or JSON `null`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Structured(value) => value.is_null(),
        }
    }

    /// Returns the body as text. Structured bodies are pretty-printed.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Structured(serde_json::Value::String(text)) => Cow::Borrowed(text),
            Self::Structured(value) => Cow::Owned(
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
            ),
        }
    }

    /// Decodes a JSON payload. Text bodies are parsed, structured bodies
    /// are converted directly.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match self {
            Self::Text(text) => serde_json::from_str(text),
            Self::Structured(value) => serde_json::from_value(value.clone()),
        }
    }
}

impl From<&str> for OutputBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for OutputBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<serde_json::Value> for OutputBody {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

/// The latest computed result of one cell.
///
/// Replaced wholesale on every update, never mutated field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellOutput {
    /// Mime type of the body.
    pub mime: Mime,
    /// The body.
    #[serde(default)]
    pub body: OutputBody,
    /// The cell this output belongs to.
    pub cell_id: CellId,
    /// Transport timestamp used by the staleness gate.
    pub timestamp: f64,
    /// Name of the variable the cell assigns, shown above the body.
    #[serde(default)]
    pub root_assignee: Option<String>,
}

impl CellOutput {
    /// Creates a new output.
    #[must_use]
    pub fn new(cell_id: CellId, mime: impl Into<Mime>, body: impl Into<OutputBody>, timestamp: f64) -> Self {
        Self {
            mime: mime.into(),
            body: body.into(),
            cell_id,
            timestamp,
            root_assignee: None,
        }
    }

    /// Sets the root assignee.
    #[must_use]
    pub fn with_root_assignee(mut self, name: impl Into<String>) -> Self {
        self.root_assignee = Some(name.into());
        self
    }
}

/// Payload of a `application/vnd.pluto.stacktrace+json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// The error message.
    pub msg: String,
    /// Stack frames, innermost first.
    #[serde(default)]
    pub stacktrace: Vec<StackFrame>,
}

/// One frame of an error stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// The call expression.
    pub call: String,
    /// Whether the frame was inlined.
    #[serde(default)]
    pub inlined: bool,
    /// Source file.
    #[serde(default)]
    pub file: String,
    /// Source line.
    #[serde(default)]
    pub line: i64,
}
