//! Event publisher.
//!
//! Three entry points share one send path:
//!
//! | call                   | destination        | default attributes                          |
//! |------------------------|--------------------|---------------------------------------------|
//! | `publish_lead_created` | leads queue        | EventType, CorrelationId, TenantId, Timestamp |
//! | `publish_log_event`    | log queue          | LogLevel, CorrelationId, TenantId, Timestamp  |
//! | `publish_message`      | caller-chosen      | Timestamp, plus ids found in the payload      |
//!
//! Caller attributes are merged over the defaults. Identifier attributes are
//! omitted when the value is unknown, since queue services reject empty
//! attribute values.

use std::sync::Arc;

use chrono::SecondsFormat;
use leadflow_core::{Clock, PublishEnvelope};
use serde_json::Value;
use tracing::{debug, error};

use crate::{
    attributes::{merge, AttributeValue, MessageAttributes},
    destination::Destination,
    transport::QueueTransport,
};

/// Destinations the publisher sends to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublisherConfig {
    /// Queue receiving `LeadCreated` events.
    pub leads_destination: Destination,
    /// Queue receiving forwarded log entries.
    pub log_destination: Destination,
}

/// Publishes envelopes and raw payloads to queues.
///
/// Never returns an error: each call reports whether the transport
/// acknowledged the message, and logs the reason when it did not.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    transport: Arc<dyn QueueTransport>,
    config: PublisherConfig,
    clock: Arc<dyn Clock>,
}

impl EventPublisher {
    /// Creates a publisher.
    pub fn new(
        transport: Arc<dyn QueueTransport>,
        config: PublisherConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { transport, config, clock }
    }

    /// Configured destinations.
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Publishes a `LeadCreated` envelope to the leads queue.
    pub async fn publish_lead_created(
        &self,
        envelope: &PublishEnvelope,
        extra_attributes: MessageAttributes,
    ) -> bool {
        let mut defaults = MessageAttributes::new();
        defaults.insert("EventType".into(), AttributeValue::string(envelope.event_type.as_str()));
        insert_ids(
            &mut defaults,
            envelope.correlation_id.as_deref(),
            envelope.tenant_id.as_deref(),
        );
        defaults.insert("Timestamp".into(), AttributeValue::string(envelope.timestamp()));

        self.send(
            &self.config.leads_destination,
            &envelope.to_body(),
            merge(defaults, extra_attributes),
        )
        .await
    }

    /// Publishes a log-event envelope to the log queue.
    pub async fn publish_log_event(&self, envelope: &PublishEnvelope) -> bool {
        let mut attributes = MessageAttributes::new();
        attributes.insert(
            "LogLevel".into(),
            AttributeValue::string(envelope.log_level().unwrap_or("info")),
        );
        insert_ids(
            &mut attributes,
            envelope.correlation_id.as_deref(),
            envelope.tenant_id.as_deref(),
        );
        attributes.insert("Timestamp".into(), AttributeValue::string(envelope.timestamp()));

        self.send(&self.config.log_destination, &envelope.to_body(), attributes).await
    }

    /// Publishes an arbitrary payload to `destination`.
    ///
    /// Defaults are a `Timestamp` taken from the clock plus `CorrelationId`
    /// and `TenantId` when the payload carries `correlation_id` or
    /// `tenant_id` strings.
    pub async fn publish_message(
        &self,
        destination: &Destination,
        payload: &Value,
        attributes: MessageAttributes,
    ) -> bool {
        let mut defaults = MessageAttributes::new();
        insert_ids(
            &mut defaults,
            payload.get("correlation_id").and_then(Value::as_str),
            payload.get("tenant_id").and_then(Value::as_str),
        );
        let timestamp = self.clock.now_utc().to_rfc3339_opts(SecondsFormat::Millis, true);
        defaults.insert("Timestamp".into(), AttributeValue::string(timestamp));

        self.send(destination, payload, merge(defaults, attributes)).await
    }

    async fn send(
        &self,
        destination: &Destination,
        payload: &Value,
        attributes: MessageAttributes,
    ) -> bool {
        if let Err(e) = destination.check() {
            error!(destination = %destination, error = %e, "cannot publish message");
            return false;
        }

        let body = payload.to_string();

        match self.transport.send(destination, &body, &attributes).await {
            Ok(message_id) => {
                debug!(
                    destination = %destination,
                    message_id = %message_id,
                    attribute_count = attributes.len(),
                    "message published"
                );
                true
            },
            Err(e) => {
                error!(
                    destination = %destination,
                    error = %e,
                    error_kind = e.kind(),
                    "failed to publish message"
                );
                false
            },
        }
    }
}

fn insert_ids(
    attributes: &mut MessageAttributes,
    correlation_id: Option<&str>,
    tenant_id: Option<&str>,
) {
    for (name, value) in [("CorrelationId", correlation_id), ("TenantId", tenant_id)] {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            attributes.insert(name.to_string(), AttributeValue::string(value));
        }
    }
}
