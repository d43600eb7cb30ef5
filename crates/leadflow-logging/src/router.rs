//! Mode-driven sink selection.

use std::sync::Arc;

use async_trait::async_trait;
use leadflow_core::{Clock, LogEntry};
use leadflow_publish::EventPublisher;

use crate::{
    diagnostics::DiagnosticStream,
    mode::LogMode,
    sink::{CompositeSink, LocalSink, LogSink, RemoteSink, Sink},
};

/// Routes every log call to the sink matching the configured mode.
#[derive(Debug, Clone)]
pub struct LogRouter {
    mode: LogMode,
    local: LocalSink,
    remote: RemoteSink,
    composite: CompositeSink,
}

impl LogRouter {
    /// Builds the three sinks over `stream` and `publisher`.
    pub fn new(
        mode: LogMode,
        stream: Arc<dyn DiagnosticStream>,
        publisher: Arc<EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let local = LocalSink::new(stream);
        let remote = RemoteSink::new(publisher, clock);
        let composite = CompositeSink::new(local.clone(), remote.clone());

        Self { mode, local, remote, composite }
    }

    /// Configured mode.
    pub fn mode(&self) -> LogMode {
        self.mode
    }

    /// Sink for the next call.
    pub fn sink(&self) -> Sink<'_> {
        match self.mode {
            LogMode::Local => Sink::Local(&self.local),
            LogMode::Remote => Sink::Remote(&self.remote),
            LogMode::Both => Sink::Composite(&self.composite),
        }
    }
}

#[async_trait]
impl LogSink for LogRouter {
    async fn log(&self, entry: LogEntry) {
        self.sink().log(entry).await;
    }
}
