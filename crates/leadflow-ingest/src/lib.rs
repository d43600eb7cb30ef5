//! Lead ingestion pipeline.
//!
//! `IngestionService` validates a submitted document, writes it inside a
//! storage transaction, publishes the `LeadCreated` event and commits only
//! if the publish was acknowledged. Storage sits behind `LeadStorage` so the
//! pipeline runs against PostgreSQL in production and an in-memory double in
//! tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod outcome;
pub mod service;
pub mod storage;

pub use outcome::{IngestFailure, IngestFailureKind, IngestOutcome, IngestReceipt, IngestState};
pub use service::IngestionService;
pub use storage::{LeadStorage, LeadTransaction, PostgresLeadStorage};
