//! Scalar argument validation.
//!
//! Algorithms declare an interface for each argument (type, allowed values,
//! nullability). Values are checked here before they are written into an
//! argument space. Resource-backed arguments are edited through
//! [`crate::Resource`], never assigned scalars.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

use crate::error::ArgumentError;
use crate::lookup::{find_by_name_mut, Named};

/// Declared value type of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ArgumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgumentType::String => "string",
            ArgumentType::Number => "number",
            ArgumentType::Integer => "integer",
            ArgumentType::Boolean => "boolean",
            ArgumentType::Array => "array",
            ArgumentType::Object => "object",
        }
    }

    /// `null` is handled by the nullability check, not here.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ArgumentType::String => value.is_string(),
            ArgumentType::Number => value.is_number(),
            ArgumentType::Integer => value.is_i64() || value.is_u64(),
            ArgumentType::Boolean => value.is_boolean(),
            ArgumentType::Array => value.is_array(),
            ArgumentType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One allowed value of an enumerated argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumOption {
    pub value: Value,

    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// An algorithm's declaration for one argument.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArgumentInterface {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ArgumentType>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<EnumOption>>,

    /// Whether an empty value is accepted. Defaults to true.
    #[serde(rename = "null", default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    /// Set when the argument is backed by a resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl ArgumentInterface {
    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(true)
    }
}

impl Named for ArgumentInterface {
    fn name(&self) -> &str {
        &self.name
    }
}

/// `null`, `""`, `[]` and `{}`.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate `value` against `interface`.
///
/// Checks, in order: the argument is not resource-backed, the value's type,
/// enum membership (non-empty values only), then nullability.
pub fn validate(value: &Value, interface: &ArgumentInterface) -> Result<(), ArgumentError> {
    let argument = interface.name.clone();

    if let Some(profile) = &interface.profile {
        return Err(ArgumentError::InvalidProfile {
            argument,
            profile: profile.clone(),
        });
    }

    if let Some(expected) = interface.value_type {
        if !value.is_null() && !expected.matches(value) {
            return Err(ArgumentError::InvalidType {
                argument,
                expected: expected.to_string(),
                found: json_type_name(value).to_string(),
            });
        }
    }

    let empty = is_empty_value(value);

    if let Some(options) = &interface.allowed {
        if !empty && !options.iter().any(|option| &option.value == value) {
            return Err(ArgumentError::InvalidEnumValue {
                argument,
                value: value.clone(),
                allowed: options.iter().map(|option| option.value.clone()).collect(),
            });
        }
    }

    if empty && !interface.is_nullable() {
        return Err(ArgumentError::InvalidValue {
            argument,
            reason: "value cannot be empty".to_string(),
        });
    }

    Ok(())
}

/// One entry of an argument space. Properties other than `name` (value,
/// resource, template, ...) are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,

    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Argument {
    pub fn value(&self) -> Option<&Value> {
        self.properties.get("value")
    }

    /// Name of the backing resource, for resource arguments.
    pub fn resource(&self) -> Option<&str> {
        self.properties.get("resource").and_then(Value::as_str)
    }

    /// Name of the template the backing resource uses.
    pub fn template(&self) -> Option<&str> {
        self.properties.get("template").and_then(Value::as_str)
    }
}

impl Named for Argument {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A named set of argument values for one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpace {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub data: Vec<Argument>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArgumentSpace {
    pub fn argument(&self, name: &str) -> Result<&Argument, ArgumentError> {
        crate::lookup::find_by_name(&self.data, name).ok_or_else(|| ArgumentError::ArgumentNotFound {
            argument: name.to_string(),
            space: self.name.clone(),
        })
    }

    /// Validate and assign a scalar value.
    pub fn set_value(
        &mut self,
        name: &str,
        value: Value,
        interface: &ArgumentInterface,
    ) -> Result<(), ArgumentError> {
        let space = self.name.clone();
        let argument = find_by_name_mut(&mut self.data, name).ok_or_else(|| {
            ArgumentError::ArgumentNotFound {
                argument: name.to_string(),
                space,
            }
        })?;

        if argument.resource().is_some() {
            return Err(ArgumentError::InvalidProfile {
                argument: name.to_string(),
                profile: interface
                    .profile
                    .clone()
                    .unwrap_or_else(|| "resource".to_string()),
            });
        }

        validate(&value, interface)?;
        debug!(argument = name, value = %value, "set argument value");
        argument.properties.insert("value".to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn interface(value: Value) -> ArgumentInterface {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = validate(&json!(5), &interface(json!({"type": "string"}))).unwrap_err();
        assert!(matches!(err, ArgumentError::InvalidType { ref found, .. } if found == "integer"));
    }

    #[test]
    fn enum_member_is_accepted() {
        let decl = interface(json!({
            "type": "string",
            "enum": [{"value": "red"}, {"value": "blue", "label": "Blue"}]
        }));
        assert!(validate(&json!("red"), &decl).is_ok());

        let err = validate(&json!("green"), &decl).unwrap_err();
        assert!(matches!(err, ArgumentError::InvalidEnumValue { ref allowed, .. } if allowed.len() == 2));
    }

    #[test]
    fn null_rejected_when_not_nullable() {
        let err = validate(&Value::Null, &interface(json!({"type": "string", "null": false}))).unwrap_err();
        assert!(matches!(err, ArgumentError::InvalidValue { .. }));

        assert!(validate(&Value::Null, &interface(json!({"type": "string"}))).is_ok());
    }

    #[test]
    fn resource_backed_argument_is_rejected() {
        let decl = interface(json!({"name": "data", "profile": "tabular-data-resource"}));
        let err = validate(&json!(1), &decl).unwrap_err();
        assert!(matches!(err, ArgumentError::InvalidProfile { ref argument, .. } if argument == "data"));
    }

    #[test]
    fn integer_type_rejects_fractions() {
        let decl = interface(json!({"type": "integer"}));
        assert!(validate(&json!(3), &decl).is_ok());
        assert!(validate(&json!(3.5), &decl).is_err());
    }

    #[test]
    fn set_value_validates_then_persists() {
        let mut space: ArgumentSpace = serde_json::from_value(json!({
            "name": "default",
            "data": [
                {"name": "method", "value": "nm"},
                {"name": "data", "resource": "data", "template": "xy"}
            ]
        }))
        .unwrap();
        let decl = interface(json!({"name": "method", "type": "string"}));

        space.set_value("method", json!("bfgs"), &decl).unwrap();
        assert_eq!(space.argument("method").unwrap().value(), Some(&json!("bfgs")));

        assert!(space.set_value("method", json!(1), &decl).is_err());
        assert_eq!(space.argument("method").unwrap().value(), Some(&json!("bfgs")));

        assert!(matches!(
            space.set_value("data", json!(1), &decl),
            Err(ArgumentError::InvalidProfile { .. })
        ));
        assert!(matches!(
            space.set_value("missing", json!(1), &decl),
            Err(ArgumentError::ArgumentNotFound { .. })
        ));
    }
}
