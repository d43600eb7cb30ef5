//! Publishable events and application log entries.
//!
//! A `PublishEnvelope` is the transient, serializable form of anything the
//! pipeline emits to a queue: a created lead or a forwarded log entry. It is
//! built right before a publish call and dropped right after.
//!
//! ```text
//!  LeadRecord ──lead_created──▶ ┌────────────────┐
//!                               │ PublishEnvelope│ ──to_body──▶ JSON message
//!  LogEntry ────log_event─────▶ └────────────────┘
//! ```

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{LeadId, LeadRecord};

/// Free-form structured context attached to a log entry.
pub type LogContext = Map<String, Value>;

/// Kind of event carried by an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// A lead was persisted and is being announced downstream.
    LeadCreated,
    /// An application log entry forwarded to the log queue.
    LogEvent,
}

impl EventType {
    /// Wire representation used in bodies and attributes.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeadCreated => "LeadCreated",
            Self::LogEvent => "LogEvent",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose diagnostics.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected that did not fail the operation.
    Warning,
    /// An operation failed.
    Error,
}

impl LogLevel {
    /// Wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single application log call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Structured context; may carry `correlation_id` and `tenant_id`.
    pub context: LogContext,
}

impl LogEntry {
    /// Creates a log entry.
    pub fn new(level: LogLevel, message: impl Into<String>, context: LogContext) -> Self {
        Self { level, message: message.into(), context }
    }

    /// Correlation id carried in the context, if any.
    pub fn correlation_id(&self) -> Option<String> {
        context_string(&self.context, "correlation_id")
    }

    /// Tenant id carried in the context, if any.
    pub fn tenant_id(&self) -> Option<String> {
        context_string(&self.context, "tenant_id")
    }
}

fn context_string(context: &LogContext, key: &str) -> Option<String> {
    match context.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Serializable message handed to the publisher.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishEnvelope {
    /// Event kind.
    pub event_type: EventType,
    /// Owning tenant, when known.
    pub tenant_id: Option<String>,
    /// Correlation id, when known.
    pub correlation_id: Option<String>,
    /// Event-specific fields merged into the body.
    pub payload: Map<String, Value>,
    /// When the envelope was created.
    pub emitted_at: DateTime<Utc>,
}

impl PublishEnvelope {
    /// Envelope announcing a persisted lead.
    pub fn lead_created(record: &LeadRecord, lead_id: LeadId, emitted_at: DateTime<Utc>) -> Self {
        let mut payload = Map::new();
        payload.insert("lead_id".to_string(), Value::from(lead_id.0));
        payload.insert("lead_data".to_string(), record.lead_data());

        Self {
            event_type: EventType::LeadCreated,
            tenant_id: Some(record.tenant_id.to_string()),
            correlation_id: Some(record.correlation_id.to_string()),
            payload,
            emitted_at,
        }
    }

    /// Envelope forwarding a log entry.
    pub fn log_event(entry: &LogEntry, emitted_at: DateTime<Utc>) -> Self {
        let mut payload = Map::new();
        payload.insert("level".to_string(), Value::from(entry.level.as_str()));
        payload.insert("message".to_string(), Value::from(entry.message.clone()));
        payload.insert("context".to_string(), Value::Object(entry.context.clone()));

        Self {
            event_type: EventType::LogEvent,
            tenant_id: entry.tenant_id(),
            correlation_id: entry.correlation_id(),
            payload,
            emitted_at,
        }
    }

    /// RFC 3339 emission timestamp with millisecond precision.
    pub fn timestamp(&self) -> String {
        self.emitted_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Log level of a log-event envelope.
    pub fn log_level(&self) -> Option<&str> {
        self.payload.get("level").and_then(Value::as_str)
    }

    /// Flat JSON body: header fields plus payload keys.
    ///
    /// Header fields take precedence over payload keys with the same name.
    pub fn to_body(&self) -> Value {
        let mut body = self.payload.clone();
        body.insert("event_type".to_string(), Value::from(self.event_type.as_str()));
        body.insert(
            "tenant_id".to_string(),
            self.tenant_id.clone().map_or(Value::Null, Value::from),
        );
        body.insert(
            "correlation_id".to_string(),
            self.correlation_id.clone().map_or(Value::Null, Value::from),
        );
        body.insert("timestamp".to_string(), Value::from(self.timestamp()));
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::models::{CorrelationId, LeadSource, TenantId};

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 18, 5, 35, 45).unwrap()
    }

    fn record() -> LeadRecord {
        LeadRecord {
            tenant_id: TenantId::new(),
            correlation_id: CorrelationId::new(),
            email: "john@example.com".to_string(),
            first_name: Some("John".to_string()),
            last_name: None,
            phone: None,
            company: Some("Acme Corp".to_string()),
            source: Some(LeadSource::Website),
            metadata: None,
        }
    }

    #[test]
    fn lead_created_body_carries_header_and_lead_data() {
        let record = record();
        let envelope = PublishEnvelope::lead_created(&record, LeadId(42), fixed_time());
        let body = envelope.to_body();

        assert_eq!(body["event_type"], "LeadCreated");
        assert_eq!(body["tenant_id"], record.tenant_id.to_string());
        assert_eq!(body["correlation_id"], record.correlation_id.to_string());
        assert_eq!(body["lead_id"], 42);
        assert_eq!(body["lead_data"]["email"], "john@example.com");
        assert_eq!(body["lead_data"]["source"], "website");
        assert_eq!(body["timestamp"], "2025-10-18T05:35:45.000Z");
    }

    #[test]
    fn log_event_extracts_ids_from_context() {
        let mut context = LogContext::new();
        context.insert("correlation_id".into(), json!("c-1"));
        context.insert("tenant_id".into(), json!(7));
        let entry = LogEntry::new(LogLevel::Warning, "slow publish", context);

        let envelope = PublishEnvelope::log_event(&entry, fixed_time());

        assert_eq!(envelope.event_type, EventType::LogEvent);
        assert_eq!(envelope.correlation_id.as_deref(), Some("c-1"));
        assert_eq!(envelope.tenant_id.as_deref(), Some("7"));
        assert_eq!(envelope.log_level(), Some("warning"));
        assert_eq!(envelope.to_body()["message"], "slow publish");
    }

    #[test]
    fn log_event_without_ids_serializes_nulls() {
        let entry = LogEntry::new(LogLevel::Debug, "tick", LogContext::new());
        let body = PublishEnvelope::log_event(&entry, fixed_time()).to_body();

        assert!(body["correlation_id"].is_null());
        assert!(body["tenant_id"].is_null());
        assert_eq!(body["context"], json!({}));
    }
}
