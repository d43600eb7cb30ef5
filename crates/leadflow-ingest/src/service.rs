//! Validate → persist → publish → log.
//!
//! The lead row and its `LeadCreated` event stand or fall together: the row
//! is written inside a transaction that is only committed once the transport
//! has acknowledged the event. The outcome is logged through the
//! `LogRouter` after the transaction is closed, exactly once per request.

use std::sync::Arc;

use leadflow_core::{
    Clock, CoreError, LeadId, LeadRecord, LeadSubmission, LogContext, PublishEnvelope, TenantId,
    ValidationError,
};
use leadflow_logging::{LogRouter, LogSink};
use leadflow_publish::{EventPublisher, MessageAttributes};
use leadflow_schema::SchemaValidator;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::{
    outcome::{IngestFailure, IngestFailureKind, IngestOutcome, IngestReceipt, IngestState},
    storage::{LeadStorage, LeadTransaction},
};

/// Orchestrates one lead ingestion per call.
#[derive(Clone)]
pub struct IngestionService {
    validator: SchemaValidator,
    storage: Arc<dyn LeadStorage>,
    publisher: Arc<EventPublisher>,
    logger: LogRouter,
    clock: Arc<dyn Clock>,
    schema_ref: String,
}

impl IngestionService {
    /// Creates a service validating against `schema_ref`.
    pub fn new(
        validator: SchemaValidator,
        storage: Arc<dyn LeadStorage>,
        publisher: Arc<EventPublisher>,
        logger: LogRouter,
        clock: Arc<dyn Clock>,
        schema_ref: impl Into<String>,
    ) -> Self {
        Self { validator, storage, publisher, logger, clock, schema_ref: schema_ref.into() }
    }

    /// Schema documents are validated against.
    pub fn schema_ref(&self) -> &str {
        &self.schema_ref
    }

    /// Lead storage backing the service.
    pub fn storage(&self) -> &Arc<dyn LeadStorage> {
        &self.storage
    }

    /// Ingests `document` on behalf of `tenant_id`.
    ///
    /// Any `tenant_id` key inside the document is ignored.
    #[instrument(name = "ingest_lead", skip_all, fields(tenant_id = %tenant_id))]
    pub async fn ingest(&self, tenant_id: TenantId, document: &Value) -> IngestOutcome {
        debug!(state = ?IngestState::Received, "ingestion state");

        let errors = self.validator.validate(document, &self.schema_ref);
        if !errors.is_empty() {
            return self.reject(tenant_id, errors).await;
        }

        let submission: LeadSubmission = match serde_json::from_value(document.clone()) {
            Ok(submission) => submission,
            Err(e) => {
                let error = ValidationError::new("", format!("Malformed lead: {e}"), "type");
                return self.reject(tenant_id, vec![error]).await;
            },
        };
        debug!(state = ?IngestState::Validated, "ingestion state");

        let record = LeadRecord::from_submission(tenant_id, submission);

        match self.persist_and_publish(&record).await {
            Ok(lead_id) => self.complete(&record, lead_id).await,
            Err(failure) => self.fail(&record, failure).await,
        }
    }

    async fn persist_and_publish(&self, record: &LeadRecord) -> Result<LeadId, IngestFailure> {
        let correlation_id = record.correlation_id;

        let mut tx = self.storage.begin().await.map_err(|e| {
            IngestFailure::new(IngestFailureKind::Storage, correlation_id, e.to_string())
        })?;

        let lead_id = match tx.insert(record).await {
            Ok(lead_id) => lead_id,
            Err(e) => {
                rollback(tx).await;
                return Err(write_failure(record, &e));
            },
        };
        debug!(state = ?IngestState::Persisted, %lead_id, "ingestion state");

        let envelope = PublishEnvelope::lead_created(record, lead_id, self.clock.now_utc());
        if !self.publisher.publish_lead_created(&envelope, MessageAttributes::new()).await {
            rollback(tx).await;
            return Err(IngestFailure::new(
                IngestFailureKind::Publish,
                correlation_id,
                "lead-created event was not acknowledged by the queue",
            ));
        }
        debug!(state = ?IngestState::Published, %lead_id, "ingestion state");

        tx.commit().await.map_err(|e| {
            IngestFailure::new(
                IngestFailureKind::Storage,
                correlation_id,
                format!("commit failed after publish: {e}"),
            )
        })?;

        Ok(lead_id)
    }

    async fn reject(&self, tenant_id: TenantId, errors: Vec<ValidationError>) -> IngestOutcome {
        debug!(state = ?IngestState::Rejected, error_count = errors.len(), "ingestion state");

        let mut context = LogContext::new();
        context.insert("tenant_id".into(), json!(tenant_id.to_string()));
        context.insert("errors".into(), json!(errors));
        self.logger.warning("Lead validation failed", context).await;

        IngestOutcome::Rejected(errors)
    }

    async fn complete(&self, record: &LeadRecord, lead_id: LeadId) -> IngestOutcome {
        debug!(state = ?IngestState::Completed, %lead_id, "ingestion state");

        let mut context = LogContext::new();
        context.insert("lead_id".into(), json!(lead_id.0));
        context.insert("correlation_id".into(), json!(record.correlation_id.to_string()));
        context.insert("tenant_id".into(), json!(record.tenant_id.to_string()));
        context.insert("email".into(), json!(record.email));
        self.logger.info("Lead created successfully", context).await;

        IngestOutcome::Completed(IngestReceipt {
            lead_id,
            correlation_id: record.correlation_id,
            tenant_id: record.tenant_id,
        })
    }

    async fn fail(&self, record: &LeadRecord, failure: IngestFailure) -> IngestOutcome {
        debug!(state = ?IngestState::Failed, kind = failure.kind.as_str(), "ingestion state");

        let mut context = LogContext::new();
        context.insert("error".into(), json!(failure.detail));
        context.insert("kind".into(), json!(failure.kind.as_str()));
        context.insert("correlation_id".into(), json!(record.correlation_id.to_string()));
        context.insert("tenant_id".into(), json!(record.tenant_id.to_string()));
        self.logger.error("Failed to create lead", context).await;

        IngestOutcome::Failed(failure)
    }
}

fn write_failure(record: &LeadRecord, error: &CoreError) -> IngestFailure {
    let kind =
        if error.is_conflict() { IngestFailureKind::Conflict } else { IngestFailureKind::Storage };

    IngestFailure::new(kind, record.correlation_id, error.to_string())
}

async fn rollback(tx: Box<dyn LeadTransaction>) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "rollback failed; transaction discarded");
    }
}
