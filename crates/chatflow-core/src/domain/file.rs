//! File attachment value.

use serde::{Deserialize, Serialize};

/// The kind of file being sent or received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    #[default]
    File,
}

impl FileKind {
    /// Wire string for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
            Self::Audio => "AUDIO",
            Self::File => "FILE",
        }
    }

    /// Parse a wire string. Unknown strings map to `File`.
    ///
    /// Kind strings are case-sensitive: `"image"` is unknown.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "IMAGE" => Self::Image,
            "VIDEO" => Self::Video,
            "AUDIO" => Self::Audio,
            _ => Self::File,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file attachment in a message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct File {
    /// Unique identifier assigned by the file service.
    pub id: String,
    /// File kind.
    pub kind: FileKind,
    /// Location where the file can be fetched.
    pub url: String,
    /// Filename including extension (e.g. "report.pdf").
    pub name: String,
}

impl File {
    /// True when the file carries no identifier.
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Lowercase extension including the dot, or an empty string.
    ///
    /// `"report.PDF"` yields `".pdf"`.
    pub fn extension(&self) -> String {
        match self.name.rfind('.') {
            Some(pos) if pos > 0 => self.name[pos..].to_lowercase(),
            _ => String::new(),
        }
    }
}
