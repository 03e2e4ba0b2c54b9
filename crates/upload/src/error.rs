//! Upload error types.

use std::fmt;

use tokio_tungstenite::tungstenite;

/// Which of the two WebSocket connections an error concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Carries the metadata frame and file chunks.
    Upload,
    /// Delivers progress, status, error and completion frames.
    Events,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("upload"),
            Self::Events => f.write_str("event"),
        }
    }
}

/// Errors that end an upload session.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to open {channel} channel: {source}")]
    Connect {
        channel: Channel,
        #[source]
        source: tungstenite::Error,
    },

    #[error("timed out opening {0} channel")]
    ConnectTimeout(Channel),

    #[error("{channel} channel error: {source}")]
    Transport {
        channel: Channel,
        #[source]
        source: tungstenite::Error,
    },

    #[error("{channel} channel closed by server{}", describe_close(.code, .reason))]
    ClosedByServer {
        channel: Channel,
        code: Option<u16>,
        reason: String,
    },

    #[error("event channel ended before completion")]
    EventChannelEnded,

    /// The server sent an `error` event.
    #[error("server reported an error: {0}")]
    Server(String),

    #[error("invalid channel URL: {0}")]
    InvalidUrl(String),

    #[error("status query failed: {0}")]
    Status(String),

    #[error("transfer error: {0}")]
    Transfer(#[from] dubhub_transfer::TransferError),

    #[error("framing error: {0}")]
    Framing(#[from] dubhub_protocol::FramingError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("task join error: {0}")]
    Join(String),

    #[error("cancelled")]
    Cancelled,
}

fn describe_close(code: &Option<u16>, reason: &str) -> String {
    let code = *code;
    let known = code.and_then(dubhub_protocol::constants::describe_close_code);
    match (code, known, reason.is_empty()) {
        (None, _, true) => String::new(),
        (None, _, false) => format!(": {reason}"),
        (Some(c), Some(text), true) => format!(" ({c}: {text})"),
        (Some(c), _, false) => format!(" ({c}: {reason})"),
        (Some(c), None, true) => format!(" ({c})"),
    }
}

impl UploadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_messages() {
        let err = UploadError::ClosedByServer {
            channel: Channel::Upload,
            code: Some(4001),
            reason: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "upload channel closed by server (4001: invalid or expired upload token)"
        );

        let err = UploadError::ClosedByServer {
            channel: Channel::Events,
            code: Some(1011),
            reason: "internal".into(),
        };
        assert_eq!(err.to_string(), "event channel closed by server (1011: internal)");

        let err = UploadError::ClosedByServer {
            channel: Channel::Upload,
            code: None,
            reason: String::new(),
        };
        assert_eq!(err.to_string(), "upload channel closed by server");
    }

    #[test]
    fn server_error_message() {
        let err = UploadError::Server("bad codec".into());
        assert_eq!(err.to_string(), "server reported an error: bad codec");
        assert!(!err.is_cancelled());
        assert!(UploadError::Cancelled.is_cancelled());
    }
}
