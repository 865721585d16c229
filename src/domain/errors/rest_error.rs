//! REST collaborator error types.

use thiserror::Error;

/// Errors returned by the chat REST API.
#[derive(Debug, Error)]
pub enum RestError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("request rejected with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unauthorized: the token was rejected")]
    Unauthorized,

    #[error("missing permissions for this channel")]
    Forbidden,

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("unexpected response: {message}")]
    Decode { message: String },
}

impl RestError {
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Maps a non-success HTTP status to an error variant.
    #[must_use]
    pub fn from_status(status: u16, body: &str, retry_after_ms: Option<u64>) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            429 => Self::RateLimited {
                retry_after_ms: retry_after_ms.unwrap_or(0),
            },
            _ => Self::Status {
                status,
                message: body.to_string(),
            },
        }
    }
}
