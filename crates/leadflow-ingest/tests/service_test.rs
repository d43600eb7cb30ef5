//! End-to-end ingestion behavior against in-memory storage and transport.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use leadflow_core::{CorrelationId, LogLevel, TenantId, TestClock};
use leadflow_ingest::{
    storage::mock::MockLeadStorage, IngestFailureKind, IngestOutcome, IngestState,
    IngestionService, LeadStorage,
};
use leadflow_logging::{LogMode, LogRouter, RecordingDiagnostics};
use leadflow_publish::{
    transport::mock::MockTransport, Destination, EventPublisher, PublisherConfig,
};
use leadflow_schema::{InMemorySchemaLoader, SchemaValidator, LEAD_SCHEMA_REF};
use proptest::prelude::*;
use serde_json::{json, Value};

const LEADS_QUEUE: &str = "http://localhost:4566/000000000000/leads";
const LOGS_QUEUE: &str = "http://localhost:4566/000000000000/logs";

struct Harness {
    service: IngestionService,
    storage: MockLeadStorage,
    transport: MockTransport,
    diagnostics: RecordingDiagnostics,
}

fn harness(mode: LogMode) -> Harness {
    let storage = MockLeadStorage::new();
    let transport = MockTransport::new();
    let diagnostics = RecordingDiagnostics::new();
    let clock = Arc::new(TestClock::new());

    let publisher = Arc::new(EventPublisher::new(
        Arc::new(transport.clone()),
        PublisherConfig {
            leads_destination: Destination::new(LEADS_QUEUE),
            log_destination: Destination::new(LOGS_QUEUE),
        },
        clock.clone(),
    ));
    let logger =
        LogRouter::new(mode, Arc::new(diagnostics.clone()), publisher.clone(), clock.clone());
    let validator = SchemaValidator::new(Arc::new(InMemorySchemaLoader::with_lead_schema()));

    let service = IngestionService::new(
        validator,
        Arc::new(storage.clone()),
        publisher,
        logger,
        clock,
        LEAD_SCHEMA_REF,
    );

    Harness { service, storage, transport, diagnostics }
}

#[tokio::test]
async fn minimal_lead_is_stored_published_and_logged_once() {
    let h = harness(LogMode::Local);
    let tenant = TenantId::new();

    let outcome = h.service.ingest(tenant, &json!({"email": "a@b.com"})).await;

    let receipt = *outcome.receipt().unwrap();
    assert_eq!(receipt.tenant_id, tenant);

    let stored = h.storage.committed();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, receipt.lead_id);
    assert_eq!(stored[0].record.correlation_id, receipt.correlation_id);
    assert_eq!(stored[0].record.correlation_id.0.get_version_num(), 4);

    let published = h.transport.delivered_to(&Destination::new(LEADS_QUEUE)).await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].json()["lead_id"], receipt.lead_id.0);
    assert_eq!(
        published[0].attribute("CorrelationId"),
        Some(receipt.correlation_id.to_string().as_str())
    );

    let entries = h.diagnostics.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Info);
    assert_eq!(entries[0].message, "Lead created successfully");
    assert_eq!(entries[0].context["email"], "a@b.com");

    assert!(h.transport.delivered_to(&Destination::new(LOGS_QUEUE)).await.is_empty());
}

#[tokio::test]
async fn supplied_correlation_id_is_kept() {
    let h = harness(LogMode::Local);
    let correlation_id = CorrelationId::new();

    let outcome = h
        .service
        .ingest(
            TenantId::new(),
            &json!({"email": "a@b.com", "correlation_id": correlation_id.to_string()}),
        )
        .await;

    assert_eq!(outcome.receipt().unwrap().correlation_id, correlation_id);
}

#[tokio::test]
async fn invalid_email_is_rejected_without_opening_a_transaction() {
    let h = harness(LogMode::Local);

    let outcome = h.service.ingest(TenantId::new(), &json!({"email": "bad"})).await;

    let IngestOutcome::Rejected(errors) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert!(errors.iter().any(|e| e.property == "email"));
    assert_eq!(h.storage.begin_count(), 0);
    assert_eq!(h.transport.attempt_count().await, 0);

    let warnings = h.diagnostics.entries_at(LogLevel::Warning);
    assert_eq!(warnings.len(), 1);
    assert_eq!(h.diagnostics.entries().len(), 1);
}

#[tokio::test]
async fn publish_failure_rolls_back_and_logs_one_error() {
    let h = harness(LogMode::Local);
    h.transport.set_failing(true).await;

    let outcome = h.service.ingest(TenantId::new(), &json!({"email": "a@b.com"})).await;

    let IngestOutcome::Failed(failure) = &outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(failure.kind, IngestFailureKind::Publish);
    assert_eq!(outcome.state(), IngestState::Failed);

    assert!(h.storage.committed().is_empty());
    assert_eq!(h.storage.insert_count(), 1);
    assert_eq!(h.storage.rollback_count(), 1);
    assert_eq!(h.storage.commit_count(), 0);
    assert_eq!(h.storage.reserved_count(), 0);
    assert_eq!(h.transport.attempt_count().await, 1);

    let entries = h.diagnostics.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Error);
    assert_eq!(entries[0].message, "Failed to create lead");
    assert_eq!(entries[0].context["kind"], "publish");
}

#[tokio::test]
async fn reused_correlation_id_is_conflict_and_not_published() {
    let h = harness(LogMode::Local);
    let document = json!({"email": "a@b.com", "correlation_id": CorrelationId::new().to_string()});

    let first = h.service.ingest(TenantId::new(), &document).await;
    let second = h.service.ingest(TenantId::new(), &document).await;

    assert_eq!(first.state(), IngestState::Completed);
    let IngestOutcome::Failed(failure) = second else {
        panic!("expected conflict, got {second:?}");
    };
    assert_eq!(failure.kind, IngestFailureKind::Conflict);

    assert_eq!(h.storage.committed().len(), 1);
    assert_eq!(h.storage.rollback_count(), 1);
    assert_eq!(h.transport.attempt_count().await, 1);
}

#[tokio::test]
async fn concurrent_duplicates_store_exactly_one() {
    let h = harness(LogMode::Local);
    let document = json!({"email": "a@b.com", "correlation_id": CorrelationId::new().to_string()});

    let (a, b) = tokio::join!(
        h.service.ingest(TenantId::new(), &document),
        h.service.ingest(TenantId::new(), &document),
    );

    let completed = [&a, &b].iter().filter(|o| o.state() == IngestState::Completed).count();
    assert_eq!(completed, 1);
    assert_eq!(h.storage.committed().len(), 1);
}

#[tokio::test]
async fn storage_failure_before_write_is_reported() {
    let h = harness(LogMode::Local);
    h.storage.fail_begin("connection pool exhausted");

    let outcome = h.service.ingest(TenantId::new(), &json!({"email": "a@b.com"})).await;

    let IngestOutcome::Failed(failure) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(failure.kind, IngestFailureKind::Storage);
    assert!(failure.detail.contains("pool exhausted"));
    assert_eq!(h.transport.attempt_count().await, 0);
    assert_eq!(h.diagnostics.entries_at(LogLevel::Error).len(), 1);
}

#[tokio::test]
async fn insert_failure_rolls_back_without_publishing() {
    let h = harness(LogMode::Local);
    h.storage.fail_insert("disk full");

    let outcome = h.service.ingest(TenantId::new(), &json!({"email": "a@b.com"})).await;

    assert_eq!(outcome.state(), IngestState::Failed);
    assert_eq!(h.storage.rollback_count(), 1);
    assert_eq!(h.transport.attempt_count().await, 0);
}

#[tokio::test]
async fn commit_failure_after_publish_is_storage_failure() {
    let h = harness(LogMode::Local);
    h.storage.fail_commit("serialization failure");

    let outcome = h.service.ingest(TenantId::new(), &json!({"email": "a@b.com"})).await;

    let IngestOutcome::Failed(failure) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(failure.kind, IngestFailureKind::Storage);
    assert!(h.storage.committed().is_empty());
    assert_eq!(h.transport.attempt_count().await, 1);
    assert_eq!(h.diagnostics.entries_at(LogLevel::Error).len(), 1);
}

#[tokio::test]
async fn client_tenant_field_is_ignored() {
    let h = harness(LogMode::Local);
    let tenant = TenantId::new();

    let outcome = h
        .service
        .ingest(tenant, &json!({"email": "a@b.com", "tenant_id": TenantId::new().to_string()}))
        .await;

    assert_eq!(outcome.receipt().unwrap().tenant_id, tenant);
    assert_eq!(h.storage.committed()[0].record.tenant_id, tenant);
    assert_eq!(h.storage.count_for_tenant(tenant).await.unwrap(), 1);
}

#[tokio::test]
async fn remote_mode_forwards_outcome_log() {
    let h = harness(LogMode::Remote);

    let outcome = h.service.ingest(TenantId::new(), &json!({"email": "a@b.com"})).await;
    let correlation_id = outcome.receipt().unwrap().correlation_id;

    assert!(h.diagnostics.entries().is_empty());
    let logs = h.transport.delivered_to(&Destination::new(LOGS_QUEUE)).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].attribute("LogLevel"), Some("info"));
    assert_eq!(logs[0].attribute("CorrelationId"), Some(correlation_id.to_string().as_str()));
}

#[tokio::test]
async fn both_mode_with_dead_log_queue_still_completes() {
    let h = harness(LogMode::Both);
    h.transport.fail_destination(LOGS_QUEUE).await;

    let outcome = h.service.ingest(TenantId::new(), &json!({"email": "a@b.com"})).await;

    assert_eq!(outcome.state(), IngestState::Completed);
    assert_eq!(h.storage.committed().len(), 1);
    assert_eq!(h.diagnostics.entries().len(), 1);
}

#[tokio::test]
async fn stored_lead_is_found_by_correlation_id() {
    let h = harness(LogMode::Local);

    let outcome = h
        .service
        .ingest(
            TenantId::new(),
            &json!({"email": "a@b.com", "source": "event", "metadata": {"booth": 12}}),
        )
        .await;
    let receipt = *outcome.receipt().unwrap();

    let stored = h.service.storage().find_by_correlation_id(receipt.correlation_id).await.unwrap();
    let stored = stored.unwrap();
    assert_eq!(stored.record.email, "a@b.com");
    assert_eq!(stored.record.metadata.unwrap()["booth"], 12);
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().build().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn documents_without_valid_email_never_open_a_transaction(
        email in proptest::option::of("[a-z0-9.]{0,16}"),
        company in "[A-Za-z ]{0,20}",
    ) {
        let h = harness(LogMode::Local);
        let mut document = json!({"company": company});
        if let Some(email) = &email {
            document["email"] = Value::from(email.clone());
        }

        let outcome = runtime().block_on(h.service.ingest(TenantId::new(), &document));

        let IngestOutcome::Rejected(errors) = outcome else {
            return Err(TestCaseError::fail("expected rejection"));
        };
        prop_assert!(errors.iter().any(|e| e.property == "email"));
        prop_assert_eq!(h.storage.begin_count(), 0);
    }
}
