//! Error types for the TrustPoll API client

use thiserror::Error;

/// How a failed operation should be reported to the operator.
///
/// `Unauthorized` and `Validation` never leave the process; `Server` and
/// `Transport` come back from the API client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Identity did not match the configured admin
    Unauthorized,
    /// Input rejected locally before dispatch
    Validation,
    /// Server answered with a non-2xx status
    Server,
    /// Request never completed (connect, timeout, unreadable body)
    Transport,
}

/// A response body that could not be normalized into its typed record.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Body was not valid JSON, or did not match the record shape
    #[error("{endpoint}: malformed response: {source}")]
    Json {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A required field was absent
    #[error("{endpoint}: missing field `{field}`")]
    MissingField {
        endpoint: &'static str,
        field: &'static str,
    },

    /// A field was present but outside its allowed range or shape
    #[error("{endpoint}: {detail}")]
    Invalid {
        endpoint: &'static str,
        detail: String,
    },
}

/// API client error
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request failed before a response arrived
    #[error("Network error: {0}")]
    Transport(String),

    /// Server returned a non-success status
    #[error("Server error {status}: {}", message.as_deref().unwrap_or("<no error message>"))]
    Server { status: u16, message: Option<String> },

    /// Response arrived but could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl ApiError {
    /// Classify the error for operator-facing messages.
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Server { .. } => FailureKind::Server,
            ApiError::Transport(_) | ApiError::Decode(_) => FailureKind::Transport,
        }
    }

    /// The server-provided `error` text, if this is a server failure that
    /// carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Transport(format!("request timed out: {}", err))
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let server = ApiError::Server {
            status: 400,
            message: Some("Candidate name is required".into()),
        };
        assert_eq!(server.kind(), FailureKind::Server);
        assert_eq!(server.server_message(), Some("Candidate name is required"));

        let transport = ApiError::Transport("connection refused".into());
        assert_eq!(transport.kind(), FailureKind::Transport);
        assert_eq!(transport.server_message(), None);

        let decode = ApiError::Decode(DecodeError::MissingField {
            endpoint: "GET /admin/stats",
            field: "users",
        });
        assert_eq!(decode.kind(), FailureKind::Transport);
    }

    #[test]
    fn test_server_error_display_without_message() {
        let err = ApiError::Server {
            status: 502,
            message: None,
        };
        assert_eq!(err.to_string(), "Server error 502: <no error message>");
    }
}
