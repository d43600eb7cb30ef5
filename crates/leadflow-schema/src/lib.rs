//! Schema validation for inbound documents.
//!
//! `SchemaValidator` checks an arbitrary JSON document against a schema
//! resolved through a `SchemaLoader` and always answers with a list of
//! field-level errors. Resolution and compilation failures are folded into
//! that same list, so callers never have to handle a second error channel:
//!
//! ```text
//! document ──┐
//!            ├──▶ SchemaValidator ──▶ Vec<ValidationError>  (empty = valid)
//! schema ref ┘        │
//!                     └── SchemaLoader::load(ref) ──▶ compile ──▶ walk
//! ```
//!
//! The supported keyword set is the subset of JSON Schema needed for lead
//! submissions: `type`, `required`, `properties`, `additionalProperties`,
//! `items`, `enum`, `pattern`, `format`, `minLength`, `maxLength`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod compile;
pub mod error;
pub mod loader;
pub mod validator;

pub use error::SchemaError;
pub use leadflow_core::ValidationError;
pub use loader::{FileSchemaLoader, InMemorySchemaLoader, SchemaLoader};
pub use validator::SchemaValidator;

/// Reference of the lead submission schema.
pub const LEAD_SCHEMA_REF: &str = "schemas/lead.json";

/// Lead submission schema shipped with the service.
pub const LEAD_SCHEMA_JSON: &str = include_str!("../../../schemas/lead.json");
