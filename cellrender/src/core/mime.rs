//! Output mime types.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Mime type of a cell output.
///
/// Parsing ignores case and any `;`-separated parameters, and is total:
/// unrecognized types are kept as [`Mime::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mime {
    /// `image/png`
    Png,
    /// `image/jpg`
    Jpg,
    /// `image/jpeg`
    Jpeg,
    /// `image/gif`
    Gif,
    /// `image/bmp`
    Bmp,
    /// `text/html`
    Html,
    /// `image/svg+xml`
    Svg,
    /// `application/vnd.pluto.tree+xml`
    Tree,
    /// `application/vnd.pluto.stacktrace+json`
    Stacktrace,
    /// `text/plain`
    PlainText,
    /// Anything else, normalized to lowercase.
    Other(String),
}

impl Mime {
    /// Parses a mime string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let essence = raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/png" => Self::Png,
            "image/jpg" => Self::Jpg,
            "image/jpeg" => Self::Jpeg,
            "image/gif" => Self::Gif,
            "image/bmp" => Self::Bmp,
            "text/html" => Self::Html,
            "image/svg+xml" => Self::Svg,
            "application/vnd.pluto.tree+xml" => Self::Tree,
            "application/vnd.pluto.stacktrace+json" => Self::Stacktrace,
            "text/plain" => Self::PlainText,
            _ => Self::Other(essence),
        }
    }

    /// Returns the canonical mime string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpg",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Html => "text/html",
            Self::Svg => "image/svg+xml",
            Self::Tree => "application/vnd.pluto.tree+xml",
            Self::Stacktrace => "application/vnd.pluto.stacktrace+json",
            Self::PlainText => "text/plain",
            Self::Other(raw) => raw,
        }
    }

    /// Returns true for raster image types rendered as `<img>`.
    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self, Self::Png | Self::Jpg | Self::Jpeg | Self::Gif | Self::Bmp)
    }

    /// Returns true for types inserted as live markup.
    ///
    /// SVG is included: it is injected like HTML and its scripts run too.
    #[must_use]
    pub const fn is_markup(&self) -> bool {
        matches!(self, Self::Html | Self::Svg | Self::Tree)
    }
}

impl Default for Mime {
    fn default() -> Self {
        Self::PlainText
    }
}

impl fmt::Display for Mime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mime {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Mime {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&str> for Mime {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<Mime> for String {
    fn from(mime: Mime) -> Self {
        mime.as_str().to_string()
    }
}
