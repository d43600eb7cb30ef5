//! Log sinks.

use std::sync::Arc;

use async_trait::async_trait;
use leadflow_core::{Clock, LogContext, LogEntry, LogLevel, PublishEnvelope};
use leadflow_publish::EventPublisher;

use crate::diagnostics::DiagnosticStream;

/// Destination for application log entries.
///
/// Fire-and-forget: nothing is returned and nothing escapes a sink.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Writes one entry.
    async fn log(&self, entry: LogEntry);

    /// Writes an info entry.
    async fn info(&self, message: &str, context: LogContext) {
        self.log(LogEntry::new(LogLevel::Info, message, context)).await;
    }

    /// Writes an error entry.
    async fn error(&self, message: &str, context: LogContext) {
        self.log(LogEntry::new(LogLevel::Error, message, context)).await;
    }

    /// Writes a warning entry.
    async fn warning(&self, message: &str, context: LogContext) {
        self.log(LogEntry::new(LogLevel::Warning, message, context)).await;
    }

    /// Writes a debug entry.
    async fn debug(&self, message: &str, context: LogContext) {
        self.log(LogEntry::new(LogLevel::Debug, message, context)).await;
    }
}

/// Writes to the process diagnostic stream.
#[derive(Debug, Clone)]
pub struct LocalSink {
    stream: Arc<dyn DiagnosticStream>,
}

impl LocalSink {
    /// Creates a sink writing to `stream`.
    pub fn new(stream: Arc<dyn DiagnosticStream>) -> Self {
        Self { stream }
    }

    fn write(&self, entry: &LogEntry) {
        match entry.level {
            LogLevel::Debug => self.stream.debug(&entry.message, &entry.context),
            LogLevel::Info => self.stream.info(&entry.message, &entry.context),
            LogLevel::Warning => self.stream.warning(&entry.message, &entry.context),
            LogLevel::Error => self.stream.error(&entry.message, &entry.context),
        }
    }
}

#[async_trait]
impl LogSink for LocalSink {
    async fn log(&self, entry: LogEntry) {
        self.write(&entry);
    }
}

/// Forwards entries to the log queue as `LogEvent` envelopes.
#[derive(Debug, Clone)]
pub struct RemoteSink {
    publisher: Arc<EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl RemoteSink {
    /// Creates a sink publishing through `publisher`.
    pub fn new(publisher: Arc<EventPublisher>, clock: Arc<dyn Clock>) -> Self {
        Self { publisher, clock }
    }
}

#[async_trait]
impl LogSink for RemoteSink {
    async fn log(&self, entry: LogEntry) {
        let envelope = PublishEnvelope::log_event(&entry, self.clock.now_utc());
        // Failures are already recorded by the publisher.
        let _ = self.publisher.publish_log_event(&envelope).await;
    }
}

/// Writes locally, then forwards remotely.
#[derive(Debug, Clone)]
pub struct CompositeSink {
    local: LocalSink,
    remote: RemoteSink,
}

impl CompositeSink {
    /// Creates a sink fanning out to `local` then `remote`.
    pub fn new(local: LocalSink, remote: RemoteSink) -> Self {
        Self { local, remote }
    }
}

#[async_trait]
impl LogSink for CompositeSink {
    async fn log(&self, entry: LogEntry) {
        self.local.log(entry.clone()).await;
        self.remote.log(entry).await;
    }
}

/// The sink chosen for one logging call.
#[derive(Debug, Clone, Copy)]
pub enum Sink<'a> {
    /// Diagnostic stream only.
    Local(&'a LocalSink),
    /// Log queue only.
    Remote(&'a RemoteSink),
    /// Both, local first.
    Composite(&'a CompositeSink),
}

#[async_trait]
impl<'a> LogSink for Sink<'a> {
    async fn log(&self, entry: LogEntry) {
        match self {
            Sink::Local(sink) => sink.log(entry).await,
            Sink::Remote(sink) => sink.log(entry).await,
            Sink::Composite(sink) => sink.log(entry).await,
        }
    }
}
