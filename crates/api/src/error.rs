use dubhub_protocol::api::InvalidStartResponse;

/// Errors from the backend client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server error {status}: {message}")]
    Server {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("not authenticated: {0}")]
    Unauthorized(String),

    /// The server answered `success: false`.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input refused before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error("invalid auth token")]
    InvalidToken,
}

impl From<InvalidStartResponse> for ApiError {
    fn from(err: InvalidStartResponse) -> Self {
        match err {
            InvalidStartResponse::Rejected(msg) => Self::Rejected(msg),
            other => Self::Malformed(other.to_string()),
        }
    }
}

impl ApiError {
    /// Returns true if retrying later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
