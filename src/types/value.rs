//! @dose
//! purpose: Statically evaluated literal values. A RawFieldValue is what the evaluator
//!     produces for one literal/array/object node of a story file, and what ends up in the
//!     manifest as a property's defaultValue.
//!
//! invariants:
//!     - Map keeps object-literal key order (IndexMap)
//!     - Unsupported is never serialized; callers check is_static() before emitting a value
//!
//! gotchas:
//!     - IndexMap equality ignores order; compare serialized output when order matters

use crate::types::PropType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// tree-sitter node kind of an expression the evaluator cannot handle
pub type NodeKind = &'static str;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFieldValue {
    Null,
    Boolean(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<RawFieldValue>),
    Map(IndexMap<String, RawFieldValue>),
    /// A node that cannot be evaluated without executing code. Holds the node kind.
    #[serde(skip)]
    Unsupported(NodeKind),
}

impl RawFieldValue {
    /// True when the value and everything nested inside it was evaluated.
    pub fn is_static(&self) -> bool {
        self.unsupported_kind().is_none()
    }

    /// Node kind of the first unsupported node, searching depth-first.
    pub fn unsupported_kind(&self) -> Option<NodeKind> {
        match self {
            RawFieldValue::Unsupported(kind) => Some(*kind),
            RawFieldValue::List(items) => items.iter().find_map(|v| v.unsupported_kind()),
            RawFieldValue::Map(map) => map.values().find_map(|v| v.unsupported_kind()),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, RawFieldValue::List(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawFieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&RawFieldValue> {
        match self {
            RawFieldValue::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Property type implied by the runtime shape of this value.
    pub fn inferred_type(&self) -> Option<PropType> {
        match self {
            RawFieldValue::Null => Some(PropType::Null),
            RawFieldValue::Boolean(_) => Some(PropType::Boolean),
            RawFieldValue::Number(_) => Some(PropType::Number),
            RawFieldValue::String(_) => Some(PropType::String),
            RawFieldValue::List(_) | RawFieldValue::Map(_) => Some(PropType::Object),
            RawFieldValue::Unsupported(_) => None,
        }
    }
}

impl From<&str> for RawFieldValue {
    fn from(value: &str) -> Self {
        RawFieldValue::String(value.to_string())
    }
}

impl From<bool> for RawFieldValue {
    fn from(value: bool) -> Self {
        RawFieldValue::Boolean(value)
    }
}

impl From<i64> for RawFieldValue {
    fn from(value: i64) -> Self {
        RawFieldValue::Number(value.into())
    }
}
