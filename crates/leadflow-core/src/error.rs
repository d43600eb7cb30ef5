//! Error types and result handling for lead ingestion.
//!
//! Defines the storage-level error raised by repositories and the service
//! taxonomy with stable codes used to build client responses. Internal
//! detail stays in `Display`; clients only ever see `public_message`.

use thiserror::Error;

use crate::models::{CorrelationId, ValidationError};

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for storage operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation, e.g. a reused correlation id.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other constraint violation.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl CoreError {
    /// Returns true when the error comes from a uniqueness constraint.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("requested entity not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Conflict(format!("unique constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                Self::ConstraintViolation(format!("foreign key constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                Self::ConstraintViolation(format!("check constraint violation: {db_err}"))
            },
            _ => Self::Database(err.to_string()),
        }
    }
}

/// Leadflow error types with stable codes.
#[derive(Debug, Error)]
pub enum LeadflowError {
    // Client errors (E1001-E1003)
    /// Document failed schema validation (E1001).
    #[error("[E1001] Validation failed: {} field error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// Correlation id already used by another lead (E1002).
    #[error("[E1002] Conflict: correlation id {correlation_id} already exists")]
    Conflict {
        /// The correlation id that collided
        correlation_id: CorrelationId,
    },

    /// Missing or unknown API key (E1003).
    #[error("[E1003] Unauthorized: missing or invalid API key")]
    Unauthorized,

    // Server errors (E2001, E3001-E3002)
    /// Queue transport did not acknowledge the event (E2001).
    #[error("[E2001] Publish failed: {0}")]
    PublishFailed(String),

    /// Storage write or transaction failure (E3001).
    #[error("[E3001] Storage failure: {0}")]
    Storage(String),

    /// Unresolvable schema, destination or other setting (E3002).
    #[error("[E3002] Configuration failure: {0}")]
    Configuration(String),

    /// Generic error for wrapping other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LeadflowError {
    /// Returns the error code (E1001-E3002).
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E1001",
            Self::Conflict { .. } => "E1002",
            Self::Unauthorized => "E1003",
            Self::PublishFailed(_) => "E2001",
            Self::Storage(_) => "E3001",
            Self::Configuration(_) => "E3002",
            Self::Other(_) => "E9999",
        }
    }

    /// Returns whether the caller can fix the request and try again.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Conflict { .. } | Self::Unauthorized)
    }

    /// Message safe to return to clients.
    ///
    /// Server-side failures collapse to a generic sentence so transport and
    /// database detail never leaves the process.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(_) => "Validation failed".to_string(),
            Self::Conflict { correlation_id } => {
                format!("A lead with correlation id {correlation_id} already exists")
            },
            Self::Unauthorized => "Unauthenticated.".to_string(),
            Self::PublishFailed(_) | Self::Storage(_) | Self::Configuration(_) | Self::Other(_) => {
                "Failed to create lead".to_string()
            },
        }
    }
}

impl From<CoreError> for LeadflowError {
    fn from(err: CoreError) -> Self {
        Self::Storage(err.to_string())
    }
}
