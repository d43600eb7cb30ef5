//! Transport error types.
//!
//! Transport errors stop at `EventPublisher`, which logs them and reports
//! `false`. They are categorized so the log line says what went wrong
//! without parsing strings.

use thiserror::Error;

/// Failure sending a single message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection-level failure.
    #[error("network connection failed: {message}")]
    Network {
        /// Error message describing the failure
        message: String,
    },

    /// No response within the configured timeout.
    #[error("request timeout after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// The queue service answered with a non-success status.
    #[error("queue service rejected message: HTTP {status_code}")]
    Rejected {
        /// HTTP status code
        status_code: u16,
        /// Response body content
        body: String,
    },

    /// A success status with a body that is not a send-message result.
    #[error("invalid queue service response: {message}")]
    InvalidResponse {
        /// What could not be understood
        message: String,
    },

    /// The destination or transport settings are unusable.
    #[error("invalid transport configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },
}

impl TransportError {
    /// Creates a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates a rejection error from an HTTP response.
    pub fn rejected(status_code: u16, body: impl Into<String>) -> Self {
        Self::Rejected { status_code, body: body.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse { message: message.into() }
    }

    /// Stable category label used in log fields.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::Rejected { .. } => "rejected",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Configuration { .. } => "configuration",
        }
    }
}
