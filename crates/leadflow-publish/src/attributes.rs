//! Message attributes in the SQS attribute model.
//!
//! Every attribute is a typed string: `{"DataType": "String", "StringValue":
//! "..."}`. Numbers travel as `DataType: "Number"` with their decimal text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attribute map keyed by attribute name.
pub type MessageAttributes = BTreeMap<String, AttributeValue>;

/// One typed message attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    /// `String` or `Number`.
    #[serde(rename = "DataType")]
    pub data_type: String,
    /// Value text.
    #[serde(rename = "StringValue")]
    pub string_value: String,
}

impl AttributeValue {
    /// A `String` attribute.
    pub fn string(value: impl Into<String>) -> Self {
        Self { data_type: "String".to_string(), string_value: value.into() }
    }

    /// A `Number` attribute.
    pub fn number(value: impl std::fmt::Display) -> Self {
        Self { data_type: "Number".to_string(), string_value: value.to_string() }
    }
}

/// Merges caller attributes over defaults; on a key collision the caller
/// value wins.
pub fn merge(defaults: MessageAttributes, overrides: MessageAttributes) -> MessageAttributes {
    let mut merged = defaults;
    merged.extend(overrides);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_sqs_shape() {
        let json = serde_json::to_value(AttributeValue::string("LeadCreated")).unwrap();

        assert_eq!(json, serde_json::json!({"DataType": "String", "StringValue": "LeadCreated"}));
    }

    #[test]
    fn caller_wins_on_collision() {
        let defaults = MessageAttributes::from([
            ("EventType".to_string(), AttributeValue::string("LeadCreated")),
            ("Timestamp".to_string(), AttributeValue::string("t0")),
        ]);
        let overrides =
            MessageAttributes::from([("EventType".to_string(), AttributeValue::string("Custom"))]);

        let merged = merge(defaults, overrides);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged["EventType"].string_value, "Custom");
        assert_eq!(merged["Timestamp"].string_value, "t0");
    }
}
