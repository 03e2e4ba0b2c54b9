//! Frames delivered on the event channel.

use serde::{Deserialize, Serialize};

/// A server notification about an upload's progress.
///
/// Frames are JSON objects tagged by `type`; extra fields the server adds
/// (`status`, `bytes_received`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Progress {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// Fractional completion, nominally in `[0, 1]`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress: Option<f64>,
    },
    Status {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Complete {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl ProgressEvent {
    /// Parses a text frame. Frames without a known `type` are errors.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Kind name as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::Status { .. } => "status",
            Self::Error { .. } => "error",
            Self::Complete { .. } => "complete",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Progress { message, .. }
            | Self::Status { message }
            | Self::Error { message }
            | Self::Complete { message } => message.as_deref(),
        }
    }

    /// Completion fraction clamped to `[0, 1]`; `None` for non-progress
    /// frames. A missing or non-finite value counts as 0.
    pub fn fraction(&self) -> Option<f64> {
        match self {
            Self::Progress { progress, .. } => Some(
                progress
                    .filter(|p| p.is_finite())
                    .map_or(0.0, |p| p.clamp(0.0, 1.0)),
            ),
            _ => None,
        }
    }

    /// Completion as a whole percentage.
    pub fn percent(&self) -> Option<u8> {
        self.fraction().map(|f| (f * 100.0).round() as u8)
    }

    /// Returns true for `error` and `complete`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Complete { .. })
    }
}
