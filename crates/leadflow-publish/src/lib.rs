//! Queue publishing for lead and log events.
//!
//! `EventPublisher` turns envelopes into queue messages and hands them to a
//! `QueueTransport`. Publishing never errors across this boundary: every
//! call answers `true` (the transport acknowledged the message) or `false`
//! (it did not, and the reason went to the diagnostic log). Callers make
//! transactional decisions on that boolean alone.
//!
//! # Architecture
//!
//! ```text
//! PublishEnvelope ─▶ EventPublisher ─▶ default attributes ∪ caller attributes
//!                         │
//!                         └─▶ QueueTransport::send(destination, body, attributes)
//!                                  ├─ SqsTransport (SQS JSON protocol over reqwest)
//!                                  └─ MockTransport (tests)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attributes;
pub mod destination;
pub mod error;
pub mod publisher;
pub mod transport;

pub use attributes::{merge, AttributeValue, MessageAttributes};
pub use destination::Destination;
pub use error::TransportError;
pub use publisher::{EventPublisher, PublisherConfig};
pub use transport::{
    sqs::{SqsTransport, TransportConfig},
    MessageId, QueueTransport,
};
