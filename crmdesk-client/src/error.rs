use thiserror::Error;

/// Coarse classification used by the retry policy and by callers deciding
/// how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AuthenticationRequired,
    PermissionDenied,
    NotFound,
    BadRequest,
    Server,
    Network,
    Timeout,
    Decode,
    Api,
    Repository,
}

/// Errors surfaced by the API client, the query cache and domain hooks.
///
/// Cloneable so one in-flight request can hand the same failure to every
/// waiter on its cache key.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Unauthorized(_) => ErrorKind::AuthenticationRequired,
            ClientError::Forbidden(_) => ErrorKind::PermissionDenied,
            ClientError::NotFound(_) => ErrorKind::NotFound,
            ClientError::BadRequest(_) => ErrorKind::BadRequest,
            ClientError::Server { .. } => ErrorKind::Server,
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Timeout(_) => ErrorKind::Timeout,
            ClientError::Decode(_) => ErrorKind::Decode,
            ClientError::Api(_) => ErrorKind::Api,
            ClientError::Repository(_) => ErrorKind::Repository,
        }
    }

    /// Maps a non-2xx status and its already extracted message
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ClientError::Unauthorized(message),
            403 => ClientError::Forbidden(message),
            404 => ClientError::NotFound(message),
            400 | 409 | 422 => ClientError::BadRequest(message),
            408 => ClientError::Timeout(message),
            _ => ClientError::Server { status, message },
        }
    }

    /// Server, network and timeout failures may succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Server | ErrorKind::Network | ErrorKind::Timeout
        )
    }

    /// Whether the failure should be shown to the user through a notification
    pub fn is_user_facing(&self) -> bool {
        !matches!(self.kind(), ErrorKind::AuthenticationRequired)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(e.to_string())
        } else if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ClientError::from_status(status.as_u16(), e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
