//! Application log routing.
//!
//! Business log entries ("lead created", "failed to create lead") go through
//! a `LogRouter`, which picks one of three sinks on every call from the
//! configured `LogMode`:
//!
//! ```text
//!             ┌─ local  ──▶ LocalSink ──▶ DiagnosticStream (tracing)
//! LogRouter ──┼─ remote ──▶ RemoteSink ──▶ EventPublisher::publish_log_event
//!             └─ both   ──▶ CompositeSink ──▶ LocalSink, then RemoteSink
//! ```
//!
//! Sinks never fail: a remote publish that does not go through is recorded
//! by the publisher and otherwise ignored.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod diagnostics;
pub mod mode;
pub mod router;
pub mod sink;

pub use diagnostics::{DiagnosticStream, RecordingDiagnostics, TracingDiagnostics};
pub use mode::LogMode;
pub use router::LogRouter;
pub use sink::{CompositeSink, LocalSink, LogSink, RemoteSink, Sink};
