use std::time::Duration;

use dubhub_protocol::JobStatus;
use dubhub_protocol::constants::{
    CHUNK_SEND_DELAY, DASHBOARD_REDIRECT_DELAY, STATUS_POLL_INTERVAL, WS_CONNECT_TIMEOUT,
};
use dubhub_transfer::TransferProgress;

/// How chunks are laid out in binary frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChunkFraming {
    /// Bare chunk bytes, written by the server straight to the target file.
    #[default]
    Raw,
    /// `[4-byte BE header length][JSON ChunkHeader][data]` per frame.
    Tagged,
}

/// Timing and framing knobs for an upload session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause between two chunk sends.
    pub chunk_delay: Duration,
    /// Delay between `complete` and the dashboard navigation event.
    pub redirect_delay: Duration,
    /// Interval between status queries after completion.
    pub poll_interval: Duration,
    pub connect_timeout: Duration,
    pub framing: ChunkFraming,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_delay: CHUNK_SEND_DELAY,
            redirect_delay: DASHBOARD_REDIRECT_DELAY,
            poll_interval: STATUS_POLL_INTERVAL,
            connect_timeout: WS_CONNECT_TIMEOUT,
            framing: ChunkFraming::default(),
        }
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Where the front end should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateTarget {
    Dashboard,
    /// Reload the current view.
    Reload,
}

/// Events emitted by an upload session for the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A chunk was handed to the upload channel.
    LocalProgress(TransferProgress),
    /// The server reported processing progress.
    ServerProgress {
        percent: Option<u8>,
        message: Option<String>,
    },
    /// New status text.
    Status(String),
    Notice {
        level: NoticeLevel,
        message: String,
    },
    Navigate(NavigateTarget),
    /// The server confirmed upload and processing.
    Completed { message: Option<String> },
    /// The session ended with an error.
    Failed { error: String },
    /// Result of one status poll.
    JobStatus(JobStatus),
}

/// Result of the upload phase.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSummary {
    pub session_id: String,
    pub project_id: u64,
    pub bytes_sent: u64,
    pub chunks_sent: u64,
    pub total_chunks: u64,
    /// Message carried by the `complete` event.
    pub message: Option<String>,
}

/// How post-completion polling ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed,
    Cancelled,
}

/// Upload summary plus the final job state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub transfer: TransferSummary,
    pub job: JobOutcome,
}
