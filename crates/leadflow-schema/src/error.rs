//! Errors raised while resolving or compiling a schema.
//!
//! These never cross the validator boundary; `SchemaValidator` converts them
//! into a single document-level `ValidationError`.

use thiserror::Error;

/// Schema resolution and compilation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No schema is registered or stored under the reference.
    #[error("schema not found: {schema_ref}")]
    NotFound {
        /// The reference that could not be resolved
        schema_ref: String,
    },

    /// The schema file exists but could not be read.
    #[error("failed to read schema {schema_ref}: {message}")]
    Io {
        /// The reference being read
        schema_ref: String,
        /// Underlying I/O error
        message: String,
    },

    /// The schema content is not JSON.
    #[error("invalid JSON in schema {schema_ref}: {message}")]
    InvalidJson {
        /// The reference being parsed
        schema_ref: String,
        /// Parser message
        message: String,
    },

    /// The schema is JSON but a keyword has an unusable value.
    #[error("malformed schema at '{path}': {message}")]
    Malformed {
        /// Location of the offending keyword within the schema
        path: String,
        /// What is wrong with it
        message: String,
    },
}

impl SchemaError {
    /// Creates a malformed-schema error.
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed { path: path.into(), message: message.into() }
    }
}
