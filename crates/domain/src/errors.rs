//! Error types surfaced by the API client
//!
//! Callers never see raw transport errors; every failure is classified
//! into this closed set before it leaves the client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed error taxonomy for API operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum ApiError {
    /// Network unreachable; no request was attempted
    #[error("Network is unreachable")]
    Disconnected,

    /// Request URL could not be constructed
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// Response violated the envelope contract
    #[error("Invalid response from server")]
    InvalidResponse,

    /// Application-level error reported in the response envelope
    #[error("Server error: {message} ({code})")]
    Server {
        /// Human-readable message from the server
        message: String,
        /// Machine-readable code for programmatic handling
        code: String,
    },

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Non-success HTTP status without a structured error body
    #[error("HTTP error: status {status}")]
    Http {
        /// Raw HTTP status code
        status: u16,
    },

    /// Authentication failed and could not be recovered by refresh
    #[error("Unauthorized")]
    Unauthorized,

    /// Transport-level failure not otherwise classified
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl ApiError {
    /// Machine-readable code for [`ApiError::Server`] errors
    ///
    /// Lets features distinguish server conditions (for example an invite
    /// code that was already used from one that does not exist) without
    /// string-matching the message.
    #[must_use]
    pub fn server_code(&self) -> Option<&str> {
        match self {
            Self::Server { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether this error means the session is over
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Whether a caller may reasonably retry the operation later
    ///
    /// Transient transport conditions and server-side failures qualify;
    /// contract violations and auth failures do not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Disconnected | Self::Unknown(_) => true,
            Self::Http { status } => *status >= 500,
            Self::InvalidUrl(_)
            | Self::InvalidResponse
            | Self::Server { .. }
            | Self::Decode(_)
            | Self::Unauthorized => false,
        }
    }
}

/// Result type alias for API client operations
pub type Result<T> = std::result::Result<T, ApiError>;
