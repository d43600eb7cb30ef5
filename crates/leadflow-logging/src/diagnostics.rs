//! Process diagnostic stream.

use std::sync::{Arc, Mutex, PoisonError};

use leadflow_core::{LogContext, LogEntry, LogLevel};
use serde_json::Value;

/// Target of application log events emitted through `tracing`.
pub const APP_LOG_TARGET: &str = "leadflow::app";

/// Four leveled writes of (message, context).
pub trait DiagnosticStream: Send + Sync + std::fmt::Debug {
    /// Writes a debug line.
    fn debug(&self, message: &str, context: &LogContext);
    /// Writes an info line.
    fn info(&self, message: &str, context: &LogContext);
    /// Writes a warning line.
    fn warning(&self, message: &str, context: &LogContext);
    /// Writes an error line.
    fn error(&self, message: &str, context: &LogContext);
}

/// Writes application log lines as `tracing` events.
///
/// The context is rendered as a JSON `context` field so it survives any
/// subscriber format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl TracingDiagnostics {
    /// Creates a stream writing to the global `tracing` dispatcher.
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticStream for TracingDiagnostics {
    fn debug(&self, message: &str, context: &LogContext) {
        tracing::debug!(target: APP_LOG_TARGET, context = %render(context), "{message}");
    }

    fn info(&self, message: &str, context: &LogContext) {
        tracing::info!(target: APP_LOG_TARGET, context = %render(context), "{message}");
    }

    fn warning(&self, message: &str, context: &LogContext) {
        tracing::warn!(target: APP_LOG_TARGET, context = %render(context), "{message}");
    }

    fn error(&self, message: &str, context: &LogContext) {
        tracing::error!(target: APP_LOG_TARGET, context = %render(context), "{message}");
    }
}

fn render(context: &LogContext) -> String {
    serde_json::to_string(context).unwrap_or_else(|_| Value::Null.to_string())
}

/// Keeps every line in memory, in write order.
#[derive(Debug, Clone, Default)]
pub struct RecordingDiagnostics {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl RecordingDiagnostics {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Lines written so far at `level`.
    pub fn entries_at(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries().into_iter().filter(|e| e.level == level).collect()
    }

    fn record(&self, level: LogLevel, message: &str, context: &LogContext) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry::new(level, message, context.clone()));
    }
}

impl DiagnosticStream for RecordingDiagnostics {
    fn debug(&self, message: &str, context: &LogContext) {
        self.record(LogLevel::Debug, message, context);
    }

    fn info(&self, message: &str, context: &LogContext) {
        self.record(LogLevel::Info, message, context);
    }

    fn warning(&self, message: &str, context: &LogContext) {
        self.record(LogLevel::Warning, message, context);
    }

    fn error(&self, message: &str, context: &LogContext) {
        self.record(LogLevel::Error, message, context);
    }
}
