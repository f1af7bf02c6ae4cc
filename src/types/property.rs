//! Normalized property descriptors as they appear in a manifest's `props` array.

use crate::types::RawFieldValue;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Fixed type vocabulary for a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropType {
    String,
    Number,
    Boolean,
    Object,
    Null,
    Unknown,
}

impl PropType {
    /// Map a declared type tag (`argTypes.x.type.name`) onto the vocabulary.
    ///
    /// `array` is reported as `object`. Names outside the vocabulary return None
    /// so that the type falls back to inference.
    pub fn from_declared(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" => Some(PropType::String),
            "number" => Some(PropType::Number),
            "boolean" => Some(PropType::Boolean),
            "object" | "array" => Some(PropType::Object),
            "null" => Some(PropType::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropType::String => "string",
            PropType::Number => "number",
            PropType::Boolean => "boolean",
            PropType::Object => "object",
            PropType::Null => "null",
            PropType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configurable property of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// Property name, unique within a component
    pub name: String,
    #[serde(rename = "type")]
    pub prop_type: PropType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// A present `null` default stays `Some(Null)`, so it survives a round trip
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub default_value: Option<RawFieldValue>,
    pub is_list: bool,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, prop_type: PropType) -> Self {
        Self {
            name: name.into(),
            prop_type,
            description: None,
            default_value: None,
            is_list: false,
        }
    }
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<RawFieldValue>, D::Error>
where
    D: Deserializer<'de>,
{
    RawFieldValue::deserialize(deserializer).map(Some)
}
