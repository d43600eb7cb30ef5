//! Queue transport abstraction.
//!
//! The publisher needs exactly one primitive from a queue service: send one
//! message with attributes to one destination. Production uses
//! `sqs::SqsTransport`; tests use `mock::MockTransport`.

use std::fmt;

use async_trait::async_trait;

use crate::{attributes::MessageAttributes, destination::Destination, error::TransportError};

pub mod sqs;

/// Identifier the queue service assigned to an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Send-message primitive of a queue service.
#[async_trait]
pub trait QueueTransport: Send + Sync + fmt::Debug {
    /// Sends `body` with `attributes` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the queue service did not acknowledge the
    /// message.
    async fn send(
        &self,
        destination: &Destination,
        body: &str,
        attributes: &MessageAttributes,
    ) -> Result<MessageId, TransportError>;
}

pub mod mock {
    //! Recording transport for tests.
    //!
    //! Records every send attempt, accepted or not, and fails on demand
    //! either for every destination or for selected ones.

    use std::{
        collections::HashSet,
        sync::{
            atomic::{AtomicU64, Ordering},
            Arc,
        },
    };

    use async_trait::async_trait;
    use tokio::sync::RwLock;

    use super::{MessageId, QueueTransport};
    use crate::{attributes::MessageAttributes, destination::Destination, error::TransportError};

    /// One recorded send attempt.
    #[derive(Debug, Clone, PartialEq)]
    pub struct SentMessage {
        /// Target queue.
        pub destination: Destination,
        /// Message body as sent.
        pub body: String,
        /// Attributes as sent.
        pub attributes: MessageAttributes,
        /// Whether the mock acknowledged it.
        pub accepted: bool,
    }

    impl SentMessage {
        /// Body parsed as JSON.
        pub fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
        }

        /// String value of an attribute.
        pub fn attribute(&self, name: &str) -> Option<&str> {
            self.attributes.get(name).map(|a| a.string_value.as_str())
        }
    }

    /// In-memory queue transport.
    #[derive(Debug, Clone, Default)]
    pub struct MockTransport {
        attempts: Arc<RwLock<Vec<SentMessage>>>,
        fail_all: Arc<RwLock<bool>>,
        failing_destinations: Arc<RwLock<HashSet<Destination>>>,
        next_id: Arc<AtomicU64>,
    }

    impl MockTransport {
        /// Creates a transport that accepts every message.
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a transport that rejects every message.
        pub fn failing() -> Self {
            Self { fail_all: Arc::new(RwLock::new(true)), ..Self::default() }
        }

        /// Switches failure of all sends on or off.
        pub async fn set_failing(&self, failing: bool) {
            *self.fail_all.write().await = failing;
        }

        /// Makes sends to `destination` fail.
        pub async fn fail_destination(&self, destination: impl Into<Destination>) {
            self.failing_destinations.write().await.insert(destination.into());
        }

        /// Every attempt so far, in order.
        pub async fn attempts(&self) -> Vec<SentMessage> {
            self.attempts.read().await.clone()
        }

        /// Accepted messages sent to `destination`, in order.
        pub async fn delivered_to(&self, destination: &Destination) -> Vec<SentMessage> {
            self.attempts
                .read()
                .await
                .iter()
                .filter(|m| m.accepted && &m.destination == destination)
                .cloned()
                .collect()
        }

        /// Number of attempts so far.
        pub async fn attempt_count(&self) -> usize {
            self.attempts.read().await.len()
        }
    }

    #[async_trait]
    impl QueueTransport for MockTransport {
        async fn send(
            &self,
            destination: &Destination,
            body: &str,
            attributes: &MessageAttributes,
        ) -> Result<MessageId, TransportError> {
            let rejected = *self.fail_all.read().await
                || self.failing_destinations.read().await.contains(destination);

            self.attempts.write().await.push(SentMessage {
                destination: destination.clone(),
                body: body.to_string(),
                attributes: attributes.clone(),
                accepted: !rejected,
            });

            if rejected {
                return Err(TransportError::network("mock transport unavailable"));
            }

            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(MessageId(format!("mock-{id}")))
        }
    }
}
