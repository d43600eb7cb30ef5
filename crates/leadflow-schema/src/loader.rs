//! Schema loading collaborators.
//!
//! The validator only needs `load(ref) -> parsed schema`. Two loaders ship:
//! one reading files under a root directory, one serving schemas registered
//! in memory (used for the embedded lead schema and in tests).

use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
};

use serde_json::Value;

use crate::{error::SchemaError, LEAD_SCHEMA_JSON, LEAD_SCHEMA_REF};

/// Resolves a schema reference to its parsed JSON document.
pub trait SchemaLoader: Send + Sync + std::fmt::Debug {
    /// Loads and parses the schema identified by `schema_ref`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the reference cannot be resolved or the
    /// content is not valid JSON.
    fn load(&self, schema_ref: &str) -> Result<Value, SchemaError>;
}

/// Loads schemas from files relative to a root directory.
///
/// References that try to escape the root (absolute paths, `..`) resolve to
/// `NotFound`.
#[derive(Debug, Clone)]
pub struct FileSchemaLoader {
    root: PathBuf,
}

impl FileSchemaLoader {
    /// Creates a loader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory schemas are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, schema_ref: &str) -> Option<PathBuf> {
        let relative = Path::new(schema_ref);
        let stays_inside =
            relative.components().all(|component| matches!(component, Component::Normal(_)));

        (stays_inside && !schema_ref.is_empty()).then(|| self.root.join(relative))
    }
}

impl SchemaLoader for FileSchemaLoader {
    fn load(&self, schema_ref: &str) -> Result<Value, SchemaError> {
        let not_found = || SchemaError::NotFound { schema_ref: schema_ref.to_string() };

        let path = self.resolve(schema_ref).ok_or_else(not_found)?;
        if !path.is_file() {
            return Err(not_found());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| SchemaError::Io {
            schema_ref: schema_ref.to_string(),
            message: e.to_string(),
        })?;

        parse(schema_ref, &content)
    }
}

/// Serves schemas registered in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchemaLoader {
    schemas: HashMap<String, String>,
}

impl InMemorySchemaLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader serving the embedded lead schema under
    /// `LEAD_SCHEMA_REF`.
    pub fn with_lead_schema() -> Self {
        Self::new().with_schema(LEAD_SCHEMA_REF, LEAD_SCHEMA_JSON)
    }

    /// Registers raw schema text under `schema_ref`.
    ///
    /// The text is parsed on every load, so malformed content surfaces the
    /// same way a malformed file would.
    #[must_use]
    pub fn with_schema(
        mut self,
        schema_ref: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.schemas.insert(schema_ref.into(), content.into());
        self
    }
}

impl SchemaLoader for InMemorySchemaLoader {
    fn load(&self, schema_ref: &str) -> Result<Value, SchemaError> {
        let content = self
            .schemas
            .get(schema_ref)
            .ok_or_else(|| SchemaError::NotFound { schema_ref: schema_ref.to_string() })?;

        parse(schema_ref, content)
    }
}

fn parse(schema_ref: &str, content: &str) -> Result<Value, SchemaError> {
    serde_json::from_str(content).map_err(|e| SchemaError::InvalidJson {
        schema_ref: schema_ref.to_string(),
        message: e.to_string(),
    })
}
