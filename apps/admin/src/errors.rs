use reqwest::StatusCode;
use thiserror::Error;

/// Error raised by every call into the ResumeIt REST API.
///
/// The variants follow how the console reacts: transport failures and 5xx
/// responses are shown generically, 4xx responses carry the server's message
/// for inline display, and 401 has already cleared the session by the time
/// the caller sees it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Validation { status: u16, message: String },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request URL: {0}")]
    Url(String),

    #[error("Credential storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Classifies a non-success status with its already-extracted message.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            s if s.is_client_error() => ApiError::Validation {
                status: s.as_u16(),
                message,
            },
            s => ApiError::Server {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// HTTP status behind this error, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::NotFound(_) => Some(404),
            ApiError::Validation { status, .. } | ApiError::Server { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Client errors are deterministic; retrying them only repeats the failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Server { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}
