//! Mime type to display strategy mapping.

use crate::core::{CellOutput, ErrorPayload, Mime, OutputBody};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// How an output body is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayStrategy {
    /// `<img>` pointing at the body.
    Image {
        /// Image URL or data URI.
        src: String,
    },
    /// Live markup whose scripts are activated.
    Markup {
        /// The raw markup.
        markup: String,
    },
    /// A structured error handed to the error renderer.
    Error {
        /// The decoded payload.
        payload: ErrorPayload,
    },
    /// The body shown literally.
    Preformatted {
        /// The text.
        text: String,
    },
    /// Nothing to show.
    Empty,
}

/// Discriminant of a [`DisplayStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// See [`DisplayStrategy::Image`].
    Image,
    /// See [`DisplayStrategy::Markup`].
    Markup,
    /// See [`DisplayStrategy::Error`].
    Error,
    /// See [`DisplayStrategy::Preformatted`].
    Preformatted,
    /// See [`DisplayStrategy::Empty`].
    Empty,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Markup => write!(f, "markup"),
            Self::Error => write!(f, "error"),
            Self::Preformatted => write!(f, "preformatted"),
            Self::Empty => write!(f, "empty"),
        }
    }
}

impl DisplayStrategy {
    /// Returns the strategy's kind.
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::Image { .. } => StrategyKind::Image,
            Self::Markup { .. } => StrategyKind::Markup,
            Self::Error { .. } => StrategyKind::Error,
            Self::Preformatted { .. } => StrategyKind::Preformatted,
            Self::Empty => StrategyKind::Empty,
        }
    }
}

/// Chooses how to display an output.
///
/// Total over the mime space and free of side effects besides logging: a
/// stacktrace body that does not decode is shown as text instead.
#[must_use]
pub fn render(output: &CellOutput) -> DisplayStrategy {
    let body = &output.body;
    match &output.mime {
        mime if mime.is_image() => DisplayStrategy::Image {
            src: body.as_text().into_owned(),
        },
        mime if mime.is_markup() => DisplayStrategy::Markup {
            markup: body.as_text().into_owned(),
        },
        Mime::Stacktrace => match body.decode::<ErrorPayload>() {
            Ok(payload) => DisplayStrategy::Error { payload },
            Err(e) => {
                warn!(cell_id = %output.cell_id, error = %e, "Undecodable stacktrace output, showing it as text");
                preformatted(body)
            }
        },
        _ => preformatted(body),
    }
}

fn preformatted(body: &OutputBody) -> DisplayStrategy {
    if body.is_empty() {
        DisplayStrategy::Empty
    } else {
        DisplayStrategy::Preformatted {
            text: body.as_text().into_owned(),
        }
    }
}
