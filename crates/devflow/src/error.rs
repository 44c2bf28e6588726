//! Error types for device authorization operations.

use crate::flow::CancelReason;
use crate::transport::TransportError;

/// Result type alias for device authorization operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Device authorization error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP exchange itself failed (connection, TLS, body read).
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a body that is not the expected JSON shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authorization server error with no attached handler.
    #[error("OAuth2 error: {error} - {description}")]
    OAuth {
        /// Error code (e.g., `expired_token`).
        error: String,
        /// Human-readable description, empty if the server sent none.
        description: String,
    },

    /// `poll` was called before a successful `ping`.
    #[error("No device authorization in progress; call ping first")]
    NoAuthInfo,

    /// The device code outlived its `expires_in` (only with expiry enforcement).
    #[error("Device code expired after {expires_in} seconds")]
    DeviceCodeExpired {
        /// Lifetime the server granted the device code, in seconds.
        expires_in: u64,
    },

    /// Polling ended without a token.
    #[error("Authorization cancelled: {0}")]
    Cancelled(CancelReason),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl Error {
    /// Creates an OAuth error from error code and description.
    #[must_use]
    pub fn oauth_error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuth {
            error: error.into(),
            description: description.into(),
        }
    }

    /// Returns the authorization server error code, if this is one.
    #[must_use]
    pub fn oauth_code(&self) -> Option<&str> {
        match self {
            Self::OAuth { error, .. } => Some(error),
            _ => None,
        }
    }
}
