//! Structural contracts for flow inputs and model replies.
//!
//! A flow's input comes from the block layer and its output comes back from a
//! model provider, so neither is trusted until it has passed through
//! [`ObjectSchema::validate`]. Validation returns a *normalized* copy of the
//! value: defaults are filled in for omitted optional fields and unknown keys
//! are dropped.

use serde_json::{json, Map, Value};
use std::fmt;

// ============================================================================
// Violations
// ============================================================================

/// What went wrong with a single field
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViolationKind {
    #[error("required field is missing")]
    Missing,

    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{value:?} is not one of {allowed:?}")]
    NotAllowed { value: String, allowed: Vec<String> },

    #[error("expected {expected} items, found {found}")]
    Length { expected: String, found: usize },

    #[error("{value} is outside {range}")]
    OutOfRange { value: f64, range: String },

    #[error("custom value is empty")]
    EmptyCustomValue,
}

/// The first field that failed a contract check
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}: {kind}")]
pub struct ContractViolation {
    /// Dotted path to the field, with array indices (`books[2].title`)
    pub field: String,
    pub kind: ViolationKind,
}

impl ContractViolation {
    pub fn new(field: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

// ============================================================================
// Schema Types
// ============================================================================

/// Shape of a single value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Number { min: Option<f64>, max: Option<f64> },
    Enum(Vec<String>),
    Array {
        items: Box<FieldType>,
        min: Option<usize>,
        max: Option<usize>,
    },
    Object(ObjectSchema),
}

impl FieldType {
    pub fn number() -> Self {
        FieldType::Number {
            min: None,
            max: None,
        }
    }

    pub fn number_between(min: f64, max: f64) -> Self {
        FieldType::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn one_of(values: &[&str]) -> Self {
        FieldType::Enum(values.iter().map(|v| v.to_string()).collect())
    }

    /// Array with no length constraint
    pub fn list(items: FieldType) -> Self {
        FieldType::Array {
            items: Box::new(items),
            min: None,
            max: None,
        }
    }

    /// Array with exactly `len` items
    pub fn list_of_exactly(items: FieldType, len: usize) -> Self {
        FieldType::Array {
            items: Box::new(items),
            min: Some(len),
            max: Some(len),
        }
    }

    pub fn list_between(items: FieldType, min: usize, max: usize) -> Self {
        FieldType::Array {
            items: Box::new(items),
            min: Some(min),
            max: Some(max),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number { .. } => "number",
            FieldType::Enum(_) => "string",
            FieldType::Array { .. } => "array",
            FieldType::Object(_) => "object",
        }
    }
}

/// A named field inside an object schema
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub description: String,
    pub field_type: FieldType,
    pub required: bool,
    pub default: Option<Value>,
}

impl FieldSchema {
    pub fn required(name: &str, field_type: FieldType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            field_type,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, field_type: FieldType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, field_type, description)
        }
    }

    /// Value used when the field is omitted
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Ordered set of fields describing a JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<FieldSchema>,
}

impl ObjectSchema {
    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check `value` against this schema, returning the normalized object.
    ///
    /// Fields are checked in declaration order and the first failure wins.
    pub fn validate(&self, value: &Value) -> Result<Value, ContractViolation> {
        self.validate_at("", value)
    }

    fn validate_at(&self, path: &str, value: &Value) -> Result<Value, ContractViolation> {
        let object = value.as_object().ok_or_else(|| {
            ContractViolation::new(
                if path.is_empty() { "$" } else { path },
                ViolationKind::WrongType {
                    expected: "object",
                    found: json_type(value),
                },
            )
        })?;

        let mut normalized = Map::new();
        for field in &self.fields {
            let field_path = if path.is_empty() {
                field.name.clone()
            } else {
                format!("{}.{}", path, field.name)
            };

            match object.get(&field.name) {
                Some(v) if !v.is_null() => {
                    let checked = check_value(&field_path, &field.field_type, v)?;
                    normalized.insert(field.name.clone(), checked);
                }
                _ => {
                    if let Some(default) = &field.default {
                        normalized.insert(field.name.clone(), default.clone());
                    } else if field.required {
                        return Err(ContractViolation::new(field_path, ViolationKind::Missing));
                    }
                }
            }
        }

        Ok(Value::Object(normalized))
    }

    /// JSON skeleton of this schema, used to tell the model what to produce
    pub fn skeleton(&self) -> Value {
        let mut map = Map::new();
        for field in &self.fields {
            map.insert(
                field.name.clone(),
                skeleton_for(&field.field_type, &field.description),
            );
        }
        Value::Object(map)
    }
}

fn check_value(path: &str, ty: &FieldType, value: &Value) -> Result<Value, ContractViolation> {
    let wrong_type = || {
        ContractViolation::new(
            path,
            ViolationKind::WrongType {
                expected: ty.name(),
                found: json_type(value),
            },
        )
    };

    match ty {
        FieldType::String => value.as_str().map(|_| value.clone()).ok_or_else(wrong_type),
        FieldType::Number { min, max } => {
            let n = value.as_f64().ok_or_else(wrong_type)?;
            let below = min.map_or(false, |m| n < m);
            let above = max.map_or(false, |m| n > m);
            if below || above {
                return Err(ContractViolation::new(
                    path,
                    ViolationKind::OutOfRange {
                        value: n,
                        range: describe_range(*min, *max),
                    },
                ));
            }
            Ok(value.clone())
        }
        FieldType::Enum(allowed) => {
            let s = value.as_str().ok_or_else(wrong_type)?;
            if allowed.iter().any(|a| a == s) {
                Ok(value.clone())
            } else {
                Err(ContractViolation::new(
                    path,
                    ViolationKind::NotAllowed {
                        value: s.to_string(),
                        allowed: allowed.clone(),
                    },
                ))
            }
        }
        FieldType::Array { items, min, max } => {
            let array = value.as_array().ok_or_else(wrong_type)?;
            let too_few = min.map_or(false, |m| array.len() < m);
            let too_many = max.map_or(false, |m| array.len() > m);
            if too_few || too_many {
                return Err(ContractViolation::new(
                    path,
                    ViolationKind::Length {
                        expected: describe_length(*min, *max),
                        found: array.len(),
                    },
                ));
            }
            let checked = array
                .iter()
                .enumerate()
                .map(|(i, item)| check_value(&format!("{}[{}]", path, i), items, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(checked))
        }
        FieldType::Object(schema) => schema.validate_at(path, value),
    }
}

fn skeleton_for(ty: &FieldType, description: &str) -> Value {
    match ty {
        FieldType::String => Value::String(description.to_string()),
        FieldType::Number { min, max } => {
            let range = describe_range(*min, *max);
            if range.is_empty() {
                Value::String(format!("<number> {}", description))
            } else {
                Value::String(format!("<number {}> {}", range, description))
            }
        }
        FieldType::Enum(values) => {
            Value::String(format!("One of: {}. {}", values.join(" | "), description))
        }
        FieldType::Array { items, min, max } => {
            let mut note = description.to_string();
            let length = describe_length(*min, *max);
            if !length.is_empty() {
                note = format!("{} ({} items)", note, length);
            }
            json!([skeleton_for(items, &note)])
        }
        FieldType::Object(schema) => schema.skeleton(),
    }
}

fn describe_length(min: Option<usize>, max: Option<usize>) -> String {
    match (min, max) {
        (Some(a), Some(b)) if a == b => format!("exactly {}", a),
        (Some(a), Some(b)) => format!("{} to {}", a, b),
        (Some(a), None) => format!("at least {}", a),
        (None, Some(b)) => format!("at most {}", b),
        (None, None) => String::new(),
    }
}

fn describe_range(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(a), Some(b)) => format!("{}..={}", a, b),
        (Some(a), None) => format!(">= {}", a),
        (None, Some(b)) => format!("<= {}", b),
        (None, None) => String::new(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Display for ObjectSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string_pretty(&self.skeleton()).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}
