//! Payload classification

use std::fmt;

use serde::Deserialize;

/// Kind of media a stream carries
///
/// Carried by stream metadata and used for operator diagnostics; the
/// engine itself never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// Uncompressed video frames
    Video,
    /// PCM audio sample groups
    Audio,
    /// Ancillary data (timecode, captions, and the like)
    Ancillary,
}

impl PayloadKind {
    /// Get the lowercase name of this kind
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Ancillary => "ancillary",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
