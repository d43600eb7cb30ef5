//! Queue destinations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Absolute URL of a queue.
///
/// Construction never fails so configuration can carry an unset value;
/// `check` is where an unusable destination is caught, before any network
/// call is made.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Destination(String);

impl Destination {
    /// Wraps a queue URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into().trim().to_string())
    }

    /// The queue URL as configured.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no URL was configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses the destination as an absolute http(s) URL.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Configuration` if the destination is empty,
    /// relative, or uses another scheme.
    pub fn check(&self) -> Result<reqwest::Url, TransportError> {
        if self.is_empty() {
            return Err(TransportError::configuration("queue destination is not configured"));
        }

        let url = reqwest::Url::parse(&self.0).map_err(|e| {
            TransportError::configuration(format!("invalid queue destination '{}': {e}", self.0))
        })?;

        match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Ok(url),
            _ => Err(TransportError::configuration(format!(
                "queue destination '{}' is not an http(s) URL",
                self.0
            ))),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Destination {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for Destination {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}
