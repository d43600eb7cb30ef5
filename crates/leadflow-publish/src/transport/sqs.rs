//! SQS JSON-protocol transport.
//!
//! Speaks `AmazonSQS.SendMessage` over the JSON protocol. The request goes
//! to the configured endpoint, or to the origin of the queue URL when no
//! endpoint is set (which is what LocalStack and ElasticMQ expect). Requests
//! are not SigV4-signed; the transport targets local emulators and signing
//! sidecars.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{MessageId, QueueTransport};
use crate::{attributes::MessageAttributes, destination::Destination, error::TransportError};

const SEND_MESSAGE_TARGET: &str = "AmazonSQS.SendMessage";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const MAX_ERROR_BODY: usize = 1024;

/// Settings for `SqsTransport`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Service endpoint, e.g. `http://localhost:4566`. Derived from the
    /// queue URL when unset.
    pub endpoint: Option<String>,
    /// Region reported in the user agent.
    pub region: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { endpoint: None, region: "us-east-1".to_string(), timeout: Duration::from_secs(5) }
    }
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(rename = "MessageId")]
    message_id: String,
}

/// Queue transport for SQS-compatible services.
#[derive(Debug, Clone)]
pub struct SqsTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl SqsTransport {
    /// Creates a transport.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("leadflow/{} ({})", env!("CARGO_PKG_VERSION"), config.region))
            .build()
            .map_err(|e| {
                TransportError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    fn endpoint_for(&self, destination: &Destination) -> Result<reqwest::Url, TransportError> {
        let queue_url = destination.check()?;

        match self.config.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => reqwest::Url::parse(endpoint).map_err(|e| {
                TransportError::configuration(format!("invalid endpoint '{endpoint}': {e}"))
            }),
            _ => queue_url.join("/").map_err(|e| {
                TransportError::configuration(format!("cannot derive endpoint from queue URL: {e}"))
            }),
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

#[async_trait]
impl QueueTransport for SqsTransport {
    async fn send(
        &self,
        destination: &Destination,
        body: &str,
        attributes: &MessageAttributes,
    ) -> Result<MessageId, TransportError> {
        let endpoint = self.endpoint_for(destination)?;

        let payload = json!({
            "QueueUrl": destination.as_str(),
            "MessageBody": body,
            "MessageAttributes": attributes,
        });

        let response = self
            .client
            .post(endpoint)
            .header("X-Amz-Target", SEND_MESSAGE_TARGET)
            .header("Content-Type", CONTENT_TYPE)
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout { timeout_ms: self.timeout_ms() }
                } else if e.is_connect() {
                    TransportError::network(format!("connection failed: {e}"))
                } else {
                    TransportError::network(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            warn!(error = %e, "failed to read queue service response");
            TransportError::invalid_response(e.to_string())
        })?;

        if !status.is_success() {
            let body = if text.len() > MAX_ERROR_BODY {
                let cut =
                    (0..=MAX_ERROR_BODY).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
                format!("{}... (truncated)", &text[..cut])
            } else {
                text
            };
            return Err(TransportError::rejected(status.as_u16(), body));
        }

        let parsed: SendMessageResponse = serde_json::from_str(&text)
            .map_err(|e| TransportError::invalid_response(format!("missing MessageId: {e}")))?;

        debug!(destination = %destination, message_id = %parsed.message_id, "message accepted");

        Ok(MessageId(parsed.message_id))
    }
}
