//! Core domain models and event types.
//!
//! Provides strongly-typed identifiers, the lead record, publish envelopes,
//! log entries and the error taxonomy shared by every crate of the lead
//! ingestion pipeline, plus the PostgreSQL repositories backing them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod models;
pub mod storage;
pub mod time;

pub use error::{CoreError, LeadflowError, Result};
pub use events::{EventType, LogContext, LogEntry, LogLevel, PublishEnvelope};
pub use models::{
    CorrelationId, LeadId, LeadRecord, LeadSource, LeadSubmission, StoredLead, TenantId,
    ValidationError,
};
pub use time::{Clock, RealClock, TestClock};
