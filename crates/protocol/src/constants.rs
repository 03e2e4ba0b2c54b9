use std::time::Duration;

/// Backend base URL used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000/v1";

/// Timeout for REST requests.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for opening either WebSocket channel.
pub const WS_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum WebSocket message size in bytes (50 MB).
pub const WS_MAX_MESSAGE_SIZE: usize = 50 * 1024 * 1024;

/// Chunk size the backend hands out by default (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Pause between two chunk sends.
pub const CHUNK_SEND_DELAY: Duration = Duration::from_millis(10);

/// Interval between job status queries once processing has started.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Delay between the `complete` event and returning to the dashboard.
pub const DASHBOARD_REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Query parameter carrying the upload token on both channels.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Minimum password length accepted by the backend.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Close code: upload token invalid or expired.
pub const WS_CLOSE_INVALID_TOKEN: u16 = 4001;

/// Close code: no upload session exists for this id.
pub const WS_CLOSE_SESSION_NOT_FOUND: u16 = 4002;

/// Close code: session already completed, or the event channel is not
/// connected yet.
pub const WS_CLOSE_REFUSED: u16 = 4003;

/// Returns a human-readable reason for a backend close code.
pub fn describe_close_code(code: u16) -> Option<&'static str> {
    match code {
        WS_CLOSE_INVALID_TOKEN => Some("invalid or expired upload token"),
        WS_CLOSE_SESSION_NOT_FOUND => Some("upload session not found"),
        WS_CLOSE_REFUSED => Some("upload refused by server"),
        _ => None,
    }
}
