//! Publisher behavior against the recording transport.

#![allow(clippy::unwrap_used)]

use std::{
    sync::Arc,
    time::{Duration, UNIX_EPOCH},
};

use leadflow_core::{
    CorrelationId, LeadId, LeadRecord, LeadSource, LogContext, LogEntry, LogLevel,
    PublishEnvelope, TenantId, TestClock,
};
use leadflow_publish::{
    transport::mock::MockTransport, AttributeValue, Destination, EventPublisher,
    MessageAttributes, PublisherConfig,
};
use proptest::prelude::*;
use serde_json::json;

const LEADS_QUEUE: &str = "http://localhost:4566/000000000000/leads";
const LOGS_QUEUE: &str = "http://localhost:4566/000000000000/logs";

fn clock() -> TestClock {
    TestClock::with_start_time(UNIX_EPOCH + Duration::from_secs(1_760_765_745))
}

fn publisher(transport: &MockTransport) -> EventPublisher {
    EventPublisher::new(
        Arc::new(transport.clone()),
        PublisherConfig {
            leads_destination: Destination::new(LEADS_QUEUE),
            log_destination: Destination::new(LOGS_QUEUE),
        },
        Arc::new(clock()),
    )
}

fn record() -> LeadRecord {
    LeadRecord {
        tenant_id: TenantId::new(),
        correlation_id: CorrelationId::new(),
        email: "john@example.com".to_string(),
        first_name: Some("John".to_string()),
        last_name: Some("Doe".to_string()),
        phone: None,
        company: None,
        source: Some(LeadSource::Website),
        metadata: None,
    }
}

#[tokio::test]
async fn lead_created_goes_to_leads_queue_with_routing_attributes() {
    let transport = MockTransport::new();
    let record = record();
    let envelope = PublishEnvelope::lead_created(&record, LeadId(7), clock_now());

    assert!(publisher(&transport).publish_lead_created(&envelope, MessageAttributes::new()).await);

    let sent = transport.delivered_to(&Destination::new(LEADS_QUEUE)).await;
    assert_eq!(sent.len(), 1);
    let message = &sent[0];
    assert_eq!(message.attribute("EventType"), Some("LeadCreated"));
    assert_eq!(
        message.attribute("CorrelationId"),
        Some(record.correlation_id.to_string().as_str())
    );
    assert_eq!(message.attribute("TenantId"), Some(record.tenant_id.to_string().as_str()));
    assert_eq!(message.attribute("Timestamp"), Some("2025-10-18T05:35:45.000Z"));
    assert_eq!(message.json()["lead_id"], 7);
    assert_eq!(message.json()["lead_data"]["email"], "john@example.com");
}

#[tokio::test]
async fn extra_attributes_override_lead_defaults() {
    let transport = MockTransport::new();
    let envelope = PublishEnvelope::lead_created(&record(), LeadId(1), clock_now());
    let extra = MessageAttributes::from([
        ("EventType".to_string(), AttributeValue::string("LeadImported")),
        ("Priority".to_string(), AttributeValue::number(5)),
    ]);

    assert!(publisher(&transport).publish_lead_created(&envelope, extra).await);

    let message = &transport.attempts().await[0];
    assert_eq!(message.attribute("EventType"), Some("LeadImported"));
    assert_eq!(message.attributes["Priority"].data_type, "Number");
    assert_eq!(message.attributes.len(), 5);
}

#[tokio::test]
async fn log_event_goes_to_log_queue() {
    let transport = MockTransport::new();
    let mut context = LogContext::new();
    context.insert("correlation_id".into(), json!("c-42"));
    let entry = LogEntry::new(LogLevel::Error, "Failed to create lead", context);
    let envelope = PublishEnvelope::log_event(&entry, clock_now());

    assert!(publisher(&transport).publish_log_event(&envelope).await);

    let sent = transport.delivered_to(&Destination::new(LOGS_QUEUE)).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].attribute("LogLevel"), Some("error"));
    assert_eq!(sent[0].attribute("CorrelationId"), Some("c-42"));
    assert_eq!(sent[0].attribute("TenantId"), None);
    assert_eq!(sent[0].json()["event_type"], "LogEvent");
}

#[tokio::test]
async fn transport_failure_reports_false_after_one_attempt() {
    let transport = MockTransport::failing();
    let envelope = PublishEnvelope::lead_created(&record(), LeadId(1), clock_now());

    assert!(!publisher(&transport).publish_lead_created(&envelope, MessageAttributes::new()).await);
    assert_eq!(transport.attempt_count().await, 1);
}

#[tokio::test]
async fn unconfigured_destination_fails_without_sending() {
    let transport = MockTransport::new();
    let publisher = EventPublisher::new(
        Arc::new(transport.clone()),
        PublisherConfig {
            leads_destination: Destination::new(""),
            log_destination: Destination::new("logs"),
        },
        Arc::new(clock()),
    );
    let envelope = PublishEnvelope::lead_created(&record(), LeadId(1), clock_now());
    let log = PublishEnvelope::log_event(
        &LogEntry::new(LogLevel::Info, "hello", LogContext::new()),
        clock_now(),
    );

    assert!(!publisher.publish_lead_created(&envelope, MessageAttributes::new()).await);
    assert!(!publisher.publish_log_event(&log).await);
    assert_eq!(transport.attempt_count().await, 0);
}

#[tokio::test]
async fn generic_publish_derives_ids_from_payload() {
    let transport = MockTransport::new();
    let destination = Destination::new("http://localhost:4566/000000000000/audit");
    let payload = json!({"correlation_id": "c-1", "tenant_id": "t-1", "action": "export"});

    assert!(
        publisher(&transport)
            .publish_message(&destination, &payload, MessageAttributes::new())
            .await
    );

    let message = &transport.delivered_to(&destination).await[0];
    assert_eq!(message.attribute("CorrelationId"), Some("c-1"));
    assert_eq!(message.attribute("TenantId"), Some("t-1"));
    assert_eq!(message.attribute("Timestamp"), Some("2025-10-18T05:35:45.000Z"));
    assert_eq!(message.json(), payload);
}

#[tokio::test]
async fn failing_destination_only_affects_that_queue() {
    let transport = MockTransport::new();
    transport.fail_destination(LOGS_QUEUE).await;
    let publisher = publisher(&transport);

    let lead = PublishEnvelope::lead_created(&record(), LeadId(1), clock_now());
    let log = PublishEnvelope::log_event(
        &LogEntry::new(LogLevel::Info, "hello", LogContext::new()),
        clock_now(),
    );

    assert!(publisher.publish_lead_created(&lead, MessageAttributes::new()).await);
    assert!(!publisher.publish_log_event(&log).await);
}

fn clock_now() -> chrono::DateTime<chrono::Utc> {
    use leadflow_core::Clock;
    clock().now_utc()
}

proptest! {
    #[test]
    fn merged_attributes_are_defaults_plus_caller_keys(
        extra in proptest::collection::btree_map("[A-Z][a-zA-Z]{0,10}", "[a-z0-9]{1,8}", 0..6),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let transport = MockTransport::new();
        let destination = Destination::new(LEADS_QUEUE);
        let attributes: MessageAttributes = extra
            .iter()
            .map(|(k, v)| (k.clone(), AttributeValue::string(v.clone())))
            .collect();

        let published = runtime.block_on(
            publisher(&transport).publish_message(&destination, &json!({"x": 1}), attributes),
        );
        prop_assert!(published);

        let sent = runtime.block_on(transport.attempts());
        let sent = &sent[0];
        for (key, value) in &extra {
            prop_assert_eq!(sent.attribute(key), Some(value.as_str()));
        }
        if !extra.contains_key("Timestamp") {
            prop_assert_eq!(sent.attribute("Timestamp"), Some("2025-10-18T05:35:45.000Z"));
        }
        let expected_len = extra.len() + usize::from(!extra.contains_key("Timestamp"));
        prop_assert_eq!(sent.attributes.len(), expected_len);
    }
}
