//! Ingestion results.

use std::fmt;

use leadflow_core::{CorrelationId, LeadId, LeadflowError, TenantId, ValidationError};

/// Stages of one ingestion.
///
/// `Received → Validated → Persisted → Published → Completed`, aborting to
/// `Rejected` before any write or to `Failed` after the transaction opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    /// Document accepted for processing.
    Received,
    /// Document conforms to the schema.
    Validated,
    /// Record written inside the open transaction.
    Persisted,
    /// Lead-created event acknowledged by the transport.
    Published,
    /// Transaction committed.
    Completed,
    /// Document failed validation; nothing was written.
    Rejected,
    /// Transaction rolled back or could not be committed.
    Failed,
}

/// What a completed ingestion created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReceipt {
    /// Storage-assigned id.
    pub lead_id: LeadId,
    /// Correlation id, generated if the document had none.
    pub correlation_id: CorrelationId,
    /// Owning tenant.
    pub tenant_id: TenantId,
}

/// Why an ingestion failed after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestFailureKind {
    /// The correlation id is already stored.
    Conflict,
    /// The lead-created event was not acknowledged.
    Publish,
    /// The storage engine failed.
    Storage,
}

impl IngestFailureKind {
    /// Label used in log context.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conflict => "conflict",
            Self::Publish => "publish",
            Self::Storage => "storage",
        }
    }
}

/// An ingestion failure with its internal detail.
///
/// `detail` is for logs only; clients get `LeadflowError::public_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestFailure {
    /// Failure category.
    pub kind: IngestFailureKind,
    /// Correlation id of the record being ingested.
    pub correlation_id: CorrelationId,
    /// Internal description.
    pub detail: String,
}

impl IngestFailure {
    pub(crate) fn new(
        kind: IngestFailureKind,
        correlation_id: CorrelationId,
        detail: impl Into<String>,
    ) -> Self {
        Self { kind, correlation_id, detail: detail.into() }
    }
}

impl fmt::Display for IngestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure for {}: {}", self.kind.as_str(), self.correlation_id, self.detail)
    }
}

impl From<IngestFailure> for LeadflowError {
    fn from(failure: IngestFailure) -> Self {
        match failure.kind {
            IngestFailureKind::Conflict => {
                Self::Conflict { correlation_id: failure.correlation_id }
            },
            IngestFailureKind::Publish => Self::PublishFailed(failure.detail),
            IngestFailureKind::Storage => Self::Storage(failure.detail),
        }
    }
}

/// Terminal result of `IngestionService::ingest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Stored and announced.
    Completed(IngestReceipt),
    /// Schema violations; nothing was written.
    Rejected(Vec<ValidationError>),
    /// Written then rolled back, or never written.
    Failed(IngestFailure),
}

impl IngestOutcome {
    /// Terminal state reached.
    pub fn state(&self) -> IngestState {
        match self {
            Self::Completed(_) => IngestState::Completed,
            Self::Rejected(_) => IngestState::Rejected,
            Self::Failed(_) => IngestState::Failed,
        }
    }

    /// The receipt of a completed ingestion.
    pub fn receipt(&self) -> Option<&IngestReceipt> {
        match self {
            Self::Completed(receipt) => Some(receipt),
            _ => None,
        }
    }

    /// Converts a non-completed outcome into the service error taxonomy.
    ///
    /// # Errors
    ///
    /// Returns `LeadflowError::Validation` for rejections and the mapped
    /// failure otherwise.
    pub fn into_result(self) -> Result<IngestReceipt, LeadflowError> {
        match self {
            Self::Completed(receipt) => Ok(receipt),
            Self::Rejected(errors) => Err(LeadflowError::Validation(errors)),
            Self::Failed(failure) => Err(failure.into()),
        }
    }
}
