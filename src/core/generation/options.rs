//! Block options
//!
//! Options are the knobs a block exposes next to its free-text refinement
//! box. A choice option may allow a custom override; the override is a tagged
//! [`OptionValue::Custom`] rather than a magic "Custom" string, so there is no
//! sentinel that could leak through to a prompt.

use super::contracts::{ContractViolation, ViolationKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BlockError {
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Option {option} does not allow {value:?}")]
    NotAllowed { option: String, value: String },

    #[error("Option {0} does not accept a custom value")]
    CustomNotAllowed(String),
}

/// Kind of control an option represents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptionKind {
    Choice { values: Vec<String> },
    Text,
}

/// Current value of an option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OptionValue {
    Fixed(String),
    Custom(String),
}

impl OptionValue {
    pub fn fixed(value: impl Into<String>) -> Self {
        OptionValue::Fixed(value.into())
    }

    pub fn custom(text: impl Into<String>) -> Self {
        OptionValue::Custom(text.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockOption {
    pub id: String,
    pub label: String,
    pub kind: OptionKind,
    pub default: String,
    pub allow_custom: bool,
}

impl BlockOption {
    pub fn choice(id: &str, label: &str, values: &[&str], default: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind: OptionKind::Choice {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
            default: default.to_string(),
            allow_custom: false,
        }
    }

    pub fn text(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind: OptionKind::Text,
            default: String::new(),
            allow_custom: false,
        }
    }

    pub fn allowing_custom(mut self) -> Self {
        self.allow_custom = true;
        self
    }

    pub fn default_value(&self) -> OptionValue {
        OptionValue::Fixed(self.default.clone())
    }

    /// Check a value a user is about to set
    pub fn accepts(&self, value: &OptionValue) -> Result<(), BlockError> {
        match (value, &self.kind) {
            (OptionValue::Custom(_), _) if !self.allow_custom => {
                Err(BlockError::CustomNotAllowed(self.id.clone()))
            }
            (OptionValue::Custom(_), _) => Ok(()),
            (OptionValue::Fixed(_), OptionKind::Text) => Ok(()),
            (OptionValue::Fixed(v), OptionKind::Choice { values }) => {
                if values.iter().any(|allowed| allowed == v) {
                    Ok(())
                } else {
                    Err(BlockError::NotAllowed {
                        option: self.id.clone(),
                        value: v.clone(),
                    })
                }
            }
        }
    }

    /// The concrete value sent downstream
    pub fn resolve(&self, value: &OptionValue) -> Result<String, ContractViolation> {
        match value {
            OptionValue::Fixed(v) => Ok(v.clone()),
            OptionValue::Custom(text) => {
                let text = text.trim();
                if text.is_empty() {
                    Err(ContractViolation::new(
                        self.id.clone(),
                        ViolationKind::EmptyCustomValue,
                    ))
                } else {
                    Ok(text.to_string())
                }
            }
        }
    }
}

/// Resolve every option, falling back to defaults for options never set
pub fn resolve_options(
    options: &[BlockOption],
    values: &IndexMap<String, OptionValue>,
) -> Result<IndexMap<String, String>, ContractViolation> {
    let mut resolved = IndexMap::with_capacity(options.len());
    for option in options {
        let value = values
            .get(&option.id)
            .cloned()
            .unwrap_or_else(|| option.default_value());
        resolved.insert(option.id.clone(), option.resolve(&value)?);
    }
    Ok(resolved)
}
