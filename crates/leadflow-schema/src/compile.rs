//! Compiles a parsed schema document into a validation tree.
//!
//! Compilation checks keyword shapes up front so the walk itself cannot
//! fail: a bad regex or a non-array `required` is reported once as
//! `SchemaError::Malformed` instead of surfacing mid-document. Keywords
//! outside the supported subset are ignored, as are unknown `format` names.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::SchemaError;

/// JSON value kinds a `type` keyword can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    /// `null`
    Null,
    /// `boolean`
    Boolean,
    /// `integer`, a number with no fractional part
    Integer,
    /// `number`
    Number,
    /// `string`
    String,
    /// `array`
    Array,
    /// `object`
    Object,
}

impl JsonType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    /// Keyword spelling.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Whether `value` is an instance of this type.
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Null, Value::Null)
            | (Self::Boolean, Value::Bool(_))
            | (Self::Number, Value::Number(_))
            | (Self::String, Value::String(_))
            | (Self::Array, Value::Array(_))
            | (Self::Object, Value::Object(_)) => true,
            (Self::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            },
            _ => false,
        }
    }

    /// Kind name of an instance, as used in type mismatch messages.
    pub fn describe(value: &Value) -> &'static str {
        match value {
            Value::Null => "Null",
            Value::Bool(_) => "Boolean",
            Value::Number(n) if n.is_i64() || n.is_u64() => "Integer",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
        }
    }
}

/// String formats the validator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Mailbox address, `local@domain.tld`.
    Email,
    /// Hyphenated or simple UUID.
    Uuid,
    /// RFC 3339 timestamp.
    DateTime,
}

impl Format {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "email" => Some(Self::Email),
            "uuid" => Some(Self::Uuid),
            "date-time" => Some(Self::DateTime),
            _ => None,
        }
    }

    /// Keyword spelling.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Uuid => "uuid",
            Self::DateTime => "date-time",
        }
    }
}

/// How properties not listed under `properties` are treated.
#[derive(Debug, Clone)]
pub enum Additional {
    /// Accepted without checks.
    Allow,
    /// Rejected.
    Deny,
    /// Validated against a sub-schema.
    Schema(Box<Node>),
}

/// One compiled schema level.
#[derive(Debug, Clone)]
pub struct Node {
    /// Accepted kinds; `None` accepts anything.
    pub types: Option<Vec<JsonType>>,
    /// Property names that must be present.
    pub required: Vec<String>,
    /// Sub-schemas for named properties.
    pub properties: BTreeMap<String, Node>,
    /// Policy for unlisted properties.
    pub additional: Additional,
    /// Sub-schema for every array element.
    pub items: Option<Box<Node>>,
    /// Allowed values.
    pub enumeration: Option<Vec<Value>>,
    /// Pattern strings must match.
    pub pattern: Option<Regex>,
    /// Format strings must satisfy.
    pub format: Option<Format>,
    /// Minimum length of strings, in characters.
    pub min_length: Option<usize>,
    /// Maximum length of strings, in characters.
    pub max_length: Option<usize>,
}

impl Node {
    fn any() -> Self {
        Self {
            types: None,
            required: Vec::new(),
            properties: BTreeMap::new(),
            additional: Additional::Allow,
            items: None,
            enumeration: None,
            pattern: None,
            format: None,
            min_length: None,
            max_length: None,
        }
    }
}

/// Compiles a parsed schema.
///
/// # Errors
///
/// Returns `SchemaError::Malformed` naming the first keyword whose value has
/// the wrong shape.
pub fn compile(schema: &Value) -> Result<Node, SchemaError> {
    compile_at(schema, "#")
}

fn compile_at(schema: &Value, path: &str) -> Result<Node, SchemaError> {
    let keywords = match schema {
        Value::Object(map) => map,
        Value::Bool(true) => return Ok(Node::any()),
        Value::Bool(false) => {
            return Ok(Node { types: Some(Vec::new()), ..Node::any() });
        },
        _ => return Err(SchemaError::malformed(path, "schema must be an object or boolean")),
    };

    Ok(Node {
        types: compile_types(keywords, path)?,
        required: compile_required(keywords, path)?,
        properties: compile_properties(keywords, path)?,
        additional: compile_additional(keywords, path)?,
        items: keywords
            .get("items")
            .map(|items| compile_at(items, &format!("{path}/items")).map(Box::new))
            .transpose()?,
        enumeration: compile_enum(keywords, path)?,
        pattern: compile_pattern(keywords, path)?,
        format: keywords.get("format").and_then(Value::as_str).and_then(Format::parse),
        min_length: compile_length(keywords, "minLength", path)?,
        max_length: compile_length(keywords, "maxLength", path)?,
    })
}

fn compile_types(
    keywords: &Map<String, Value>,
    path: &str,
) -> Result<Option<Vec<JsonType>>, SchemaError> {
    let Some(value) = keywords.get("type") else {
        return Ok(None);
    };

    let names: Vec<&Value> = match value {
        Value::Array(names) => names.iter().collect(),
        single => vec![single],
    };

    names
        .into_iter()
        .map(|name| {
            name.as_str().and_then(JsonType::parse).ok_or_else(|| {
                SchemaError::malformed(format!("{path}/type"), format!("unknown type {name}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn compile_required(keywords: &Map<String, Value>, path: &str) -> Result<Vec<String>, SchemaError> {
    let Some(value) = keywords.get("required") else {
        return Ok(Vec::new());
    };

    let malformed =
        || SchemaError::malformed(format!("{path}/required"), "must be an array of strings");

    value
        .as_array()
        .ok_or_else(malformed)?
        .iter()
        .map(|name| name.as_str().map(str::to_string).ok_or_else(malformed))
        .collect()
}

fn compile_properties(
    keywords: &Map<String, Value>,
    path: &str,
) -> Result<BTreeMap<String, Node>, SchemaError> {
    let Some(value) = keywords.get("properties") else {
        return Ok(BTreeMap::new());
    };

    let properties = value
        .as_object()
        .ok_or_else(|| SchemaError::malformed(format!("{path}/properties"), "must be an object"))?;

    properties
        .iter()
        .map(|(name, sub)| {
            compile_at(sub, &format!("{path}/properties/{name}")).map(|node| (name.clone(), node))
        })
        .collect()
}

fn compile_additional(
    keywords: &Map<String, Value>,
    path: &str,
) -> Result<Additional, SchemaError> {
    match keywords.get("additionalProperties") {
        None | Some(Value::Bool(true)) => Ok(Additional::Allow),
        Some(Value::Bool(false)) => Ok(Additional::Deny),
        Some(sub @ Value::Object(_)) => {
            compile_at(sub, &format!("{path}/additionalProperties"))
                .map(|node| Additional::Schema(Box::new(node)))
        },
        Some(_) => Err(SchemaError::malformed(
            format!("{path}/additionalProperties"),
            "must be a boolean or an object",
        )),
    }
}

fn compile_enum(
    keywords: &Map<String, Value>,
    path: &str,
) -> Result<Option<Vec<Value>>, SchemaError> {
    match keywords.get("enum") {
        None => Ok(None),
        Some(Value::Array(values)) => Ok(Some(values.clone())),
        Some(_) => Err(SchemaError::malformed(format!("{path}/enum"), "must be an array")),
    }
}

fn compile_pattern(
    keywords: &Map<String, Value>,
    path: &str,
) -> Result<Option<Regex>, SchemaError> {
    let Some(value) = keywords.get("pattern") else {
        return Ok(None);
    };

    let source = value
        .as_str()
        .ok_or_else(|| SchemaError::malformed(format!("{path}/pattern"), "must be a string"))?;

    Regex::new(source)
        .map(Some)
        .map_err(|e| SchemaError::malformed(format!("{path}/pattern"), e.to_string()))
}

fn compile_length(
    keywords: &Map<String, Value>,
    keyword: &str,
    path: &str,
) -> Result<Option<usize>, SchemaError> {
    let Some(value) = keywords.get(keyword) else {
        return Ok(None);
    };

    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| {
            SchemaError::malformed(format!("{path}/{keyword}"), "must be a non-negative integer")
        })
}
