//! Document validation against a loaded schema.

use std::sync::{Arc, LazyLock};

use leadflow_core::ValidationError;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    compile::{compile, Additional, Format, JsonType, Node},
    error::SchemaError,
    loader::SchemaLoader,
};

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Validates JSON documents against schemas resolved by a `SchemaLoader`.
///
/// Never fails: a schema that cannot be loaded or compiled yields exactly
/// one error with an empty property path and constraint `schema`, and the
/// failure is logged.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    loader: Arc<dyn SchemaLoader>,
}

impl SchemaValidator {
    /// Creates a validator backed by `loader`.
    pub fn new(loader: Arc<dyn SchemaLoader>) -> Self {
        Self { loader }
    }

    /// Validates `document` against the schema at `schema_ref`.
    ///
    /// Returns an empty list when the document conforms.
    pub fn validate(&self, document: &Value, schema_ref: &str) -> Vec<ValidationError> {
        match self.load(schema_ref) {
            Ok(node) => {
                let mut errors = Vec::new();
                walk(&node, document, "", &mut errors);
                debug!(schema_ref, error_count = errors.len(), "document validated");
                errors
            },
            Err(e) => {
                error!(schema_ref, error = %e, "schema validation failed");
                vec![ValidationError::new("", format!("Schema validation failed: {e}"), "schema")]
            },
        }
    }

    /// Whether `document` conforms to the schema at `schema_ref`.
    pub fn is_valid(&self, document: &Value, schema_ref: &str) -> bool {
        self.validate(document, schema_ref).is_empty()
    }

    fn load(&self, schema_ref: &str) -> Result<Node, SchemaError> {
        let schema = self.loader.load(schema_ref)?;
        compile(&schema)
    }
}

fn walk(node: &Node, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    if let Some(types) = &node.types {
        if !types.iter().any(|t| t.matches(value)) {
            errors.push(ValidationError::new(path, type_mismatch(types, value), "type"));
            return;
        }
    }

    if let Some(allowed) = &node.enumeration {
        if !allowed.contains(value) {
            let listed = serde_json::to_string(allowed).unwrap_or_default();
            errors.push(ValidationError::new(
                path,
                format!("Does not have a value in the enumeration {listed}"),
                "enum",
            ));
        }
    }

    match value {
        Value::String(s) => check_string(node, s, path, errors),
        Value::Object(map) => check_object(node, map, path, errors),
        Value::Array(items) => {
            if let Some(item_node) = &node.items {
                for (index, item) in items.iter().enumerate() {
                    walk(item_node, item, &format!("{path}[{index}]"), errors);
                }
            }
        },
        _ => {},
    }
}

fn check_string(node: &Node, s: &str, path: &str, errors: &mut Vec<ValidationError>) {
    let length = s.chars().count();

    if let Some(min) = node.min_length {
        if length < min {
            errors.push(ValidationError::new(
                path,
                format!("Must be at least {min} characters long"),
                "minLength",
            ));
        }
    }

    if let Some(max) = node.max_length {
        if length > max {
            errors.push(ValidationError::new(
                path,
                format!("Must be at most {max} characters long"),
                "maxLength",
            ));
        }
    }

    if let Some(pattern) = &node.pattern {
        if !pattern.is_match(s) {
            errors.push(ValidationError::new(
                path,
                format!("Does not match the regex pattern {}", pattern.as_str()),
                "pattern",
            ));
        }
    }

    if let Some(format) = node.format {
        if !format_holds(format, s) {
            errors.push(ValidationError::new(path, format!("Invalid {}", format.name()), "format"));
        }
    }
}

fn check_object(
    node: &Node,
    map: &Map<String, Value>,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    for name in &node.required {
        if !map.contains_key(name) {
            errors.push(ValidationError::new(
                join(path, name),
                format!("The property {name} is required"),
                "required",
            ));
        }
    }

    for (name, value) in map {
        let child = join(path, name);
        match (node.properties.get(name), &node.additional) {
            (Some(property), _) => walk(property, value, &child, errors),
            (None, Additional::Allow) => {},
            (None, Additional::Deny) => errors.push(ValidationError::new(
                child,
                format!(
                    "The property {name} is not defined and the definition does not allow \
                     additional properties"
                ),
                "additionalProp",
            )),
            (None, Additional::Schema(extra)) => walk(extra, value, &child, errors),
        }
    }
}

fn format_holds(format: Format, s: &str) -> bool {
    match format {
        Format::Email => EMAIL.as_ref().is_some_and(|re| re.is_match(s)),
        Format::Uuid => Uuid::parse_str(s).is_ok(),
        Format::DateTime => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
    }
}

fn type_mismatch(types: &[JsonType], value: &Value) -> String {
    let expected = types
        .iter()
        .map(|t| match t {
            JsonType::Array | JsonType::Integer | JsonType::Object => format!("an {}", t.name()),
            _ => format!("a {}", t.name()),
        })
        .collect::<Vec<_>>()
        .join(" or ");

    format!("{} value found, but {expected} is required", JsonType::describe(value))
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{loader::InMemorySchemaLoader, LEAD_SCHEMA_REF};

    fn lead_validator() -> SchemaValidator {
        SchemaValidator::new(Arc::new(InMemorySchemaLoader::with_lead_schema()))
    }

    #[test]
    fn type_mismatch_names_expected_kinds() {
        assert_eq!(
            type_mismatch(&[JsonType::String, JsonType::Null], &json!(5)),
            "Integer value found, but a string or a null is required"
        );
        assert_eq!(
            type_mismatch(&[JsonType::Object], &json!("x")),
            "String value found, but an object is required"
        );
    }

    #[test]
    fn nested_paths_are_dotted() {
        assert_eq!(join("", "email"), "email");
        assert_eq!(join("metadata", "campaign"), "metadata.campaign");
    }

    #[test]
    fn minimal_lead_is_valid() {
        assert!(lead_validator().is_valid(&json!({"email": "a@b.co"}), LEAD_SCHEMA_REF));
    }

    #[test]
    fn missing_schema_yields_single_schema_error() {
        let errors = lead_validator().validate(&json!({}), "schemas/missing.json");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].property, "");
        assert_eq!(errors[0].constraint, "schema");
        assert!(errors[0].message.starts_with("Schema validation failed: "));
    }
}
