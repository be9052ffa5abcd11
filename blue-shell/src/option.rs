//! Option specifications for commands.
//!
//! An [`OptionSpec`] describes one named option a command accepts: its long
//! names, whether it must be supplied, and the type its raw string value is
//! converted to when bound.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

/// Type a raw option value is converted to when it is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
}

impl OptionType {
    /// Convert a raw string value to a JSON value of this type.
    ///
    /// On failure the returned message describes what was expected.
    pub fn convert(&self, raw: &str) -> std::result::Result<Value, String> {
        match self {
            OptionType::String => Ok(json!(raw)),

            OptionType::Integer => i64::from_str(raw)
                .map(|n| json!(n))
                .map_err(|_| format!("Expected integer, got: {}", raw)),

            OptionType::Number => f64::from_str(raw)
                .map(|n| json!(n))
                .map_err(|_| format!("Expected number, got: {}", raw)),

            OptionType::Boolean => match raw.to_lowercase().as_str() {
                // A bare flag arrives with no value
                "" | "true" | "yes" | "1" | "on" => Ok(json!(true)),
                "false" | "no" | "0" | "off" => Ok(json!(false)),
                _ => Err(format!("Expected boolean, got: {}", raw)),
            },
        }
    }
}

/// Definition of a single named option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    long_names: Vec<String>,
    description: String,
    required: bool,
    value_type: OptionType,
    default_value: Option<Value>,
}

impl OptionSpec {
    pub(crate) fn new(
        long_names: Vec<String>,
        description: String,
        required: bool,
        value_type: OptionType,
        default_value: Option<Value>,
    ) -> Self {
        Self {
            long_names,
            description,
            required,
            value_type,
            default_value,
        }
    }

    /// The canonical name, which is the first long name.
    pub fn name(&self) -> &str {
        self.long_names.first().map(String::as_str).unwrap_or_default()
    }

    pub fn long_names(&self) -> &[String] {
        &self.long_names
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn value_type(&self) -> OptionType {
        self.value_type
    }

    /// Default bound when the option is not supplied, already converted.
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.long_names.iter().any(|n| n == name)
    }
}

/// Check that a long name can be typed on a command line.
pub(crate) fn is_valid_long_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('-') && !name.chars().any(char::is_whitespace)
}
