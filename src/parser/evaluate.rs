//! @dose
//! purpose: Static evaluation of literal, array and object nodes into RawFieldValue.
//!     Anything that would need code execution to resolve (calls, identifiers, templates,
//!     spreads, functions) becomes RawFieldValue::Unsupported carrying the node kind.
//!
//! invariants:
//!     - evaluate() is pure: same node, same value; no scope, environment or I/O is consulted
//!     - Duplicate object keys keep the first key position and the last value
//!     - An object with a spread or computed key is Unsupported as a whole
//!
//! gotchas:
//!     - `-1` is a unary_expression in tree-sitter, not a number node
//!     - `\uD83D\uDE00` arrives as two escape_sequence nodes; strings are decoded through
//!       UTF-16 units so surrogate pairs combine

use crate::parser::node_text;
use crate::types::RawFieldValue;
use indexmap::IndexMap;
use serde_json::Number;
use tree_sitter::Node;

/// Largest integer an f64 represents exactly (2^53)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Key of one object-literal entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKey {
    Named(String),
    Computed,
    Spread,
}

/// One member of an object literal, in source order
#[derive(Debug, Clone)]
pub struct ObjectEntry<'tree> {
    pub key: EntryKey,
    /// Value node; for shorthand properties and methods this is the member node itself
    pub value: Node<'tree>,
}

impl ObjectEntry<'_> {
    pub fn name(&self) -> Option<&str> {
        match &self.key {
            EntryKey::Named(name) => Some(name),
            _ => None,
        }
    }
}

/// Strip TypeScript-only wrappers and parentheses around an expression.
pub fn unwrap_expression(node: Node) -> Node {
    let mut current = node;
    loop {
        let inner = match current.kind() {
            "parenthesized_expression"
            | "as_expression"
            | "satisfies_expression"
            | "non_null_expression" => first_named_child(current),
            // <Meta>{ ... }
            "type_assertion" => last_named_child(current),
            _ => None,
        };
        match inner {
            Some(next) => current = next,
            None => return current,
        }
    }
}

/// List the members of an object literal in source order.
pub fn object_entries<'tree>(object: Node<'tree>, source: &str) -> Vec<ObjectEntry<'tree>> {
    let mut entries = Vec::new();
    let mut cursor = object.walk();

    for child in object.named_children(&mut cursor) {
        match child.kind() {
            "pair" => {
                let (Some(key), Some(value)) = (
                    child.child_by_field_name("key"),
                    child.child_by_field_name("value"),
                ) else {
                    continue;
                };
                entries.push(ObjectEntry {
                    key: property_key(key, source),
                    value,
                });
            }
            "shorthand_property_identifier" => entries.push(ObjectEntry {
                key: EntryKey::Named(node_text(child, source).to_string()),
                value: child,
            }),
            "method_definition" => {
                let key = child
                    .child_by_field_name("name")
                    .map(|name| property_key(name, source))
                    .unwrap_or(EntryKey::Computed);
                entries.push(ObjectEntry { key, value: child });
            }
            "spread_element" => entries.push(ObjectEntry {
                key: EntryKey::Spread,
                value: child,
            }),
            _ => {}
        }
    }

    entries
}

/// `[1, , 2]`: a comma where an element is expected. A trailing comma is not a hole.
fn has_array_hole(array: Node) -> bool {
    let mut cursor = array.walk();
    let mut expecting_element = false;
    for child in array.children(&mut cursor) {
        match child.kind() {
            "[" => expecting_element = true,
            "," if expecting_element => return true,
            "," => expecting_element = true,
            "]" | "comment" => {}
            _ => expecting_element = false,
        }
    }
    false
}

/// Evaluate one expression node without executing anything.
pub fn evaluate(node: Node, source: &str) -> RawFieldValue {
    let node = unwrap_expression(node);

    match node.kind() {
        "string" => RawFieldValue::String(decode_string(node, source)),
        "number" => parse_number(node_text(node, source))
            .map(RawFieldValue::Number)
            .unwrap_or(RawFieldValue::Unsupported("number")),
        "true" => RawFieldValue::Boolean(true),
        "false" => RawFieldValue::Boolean(false),
        "null" => RawFieldValue::Null,
        "unary_expression" => evaluate_signed_number(node, source),
        "array" => {
            if has_array_hole(node) {
                return RawFieldValue::Unsupported("array_hole");
            }
            let mut cursor = node.walk();
            let items = node
                .named_children(&mut cursor)
                .filter(|child| child.kind() != "comment")
                .map(|child| evaluate(child, source))
                .collect();
            RawFieldValue::List(items)
        }
        "object" => {
            let mut map = IndexMap::new();
            for entry in object_entries(node, source) {
                match entry.key {
                    EntryKey::Named(key) => {
                        map.insert(key, evaluate(entry.value, source));
                    }
                    EntryKey::Computed => return RawFieldValue::Unsupported("computed_property_name"),
                    EntryKey::Spread => return RawFieldValue::Unsupported("spread_element"),
                }
            }
            RawFieldValue::Map(map)
        }
        other => RawFieldValue::Unsupported(other),
    }
}

fn property_key(key: Node, source: &str) -> EntryKey {
    match key.kind() {
        "property_identifier" | "private_property_identifier" | "identifier" => {
            EntryKey::Named(node_text(key, source).to_string())
        }
        "string" => EntryKey::Named(decode_string(key, source)),
        "number" => match parse_number(node_text(key, source)) {
            Some(n) => EntryKey::Named(n.to_string()),
            None => EntryKey::Computed,
        },
        _ => EntryKey::Computed,
    }
}

/// `-1`, `+2.5`: sign applied directly to a numeric literal
fn evaluate_signed_number(node: Node, source: &str) -> RawFieldValue {
    let operator = node
        .child_by_field_name("operator")
        .map(|op| node_text(op, source))
        .unwrap_or("");
    let Some(argument) = node.child_by_field_name("argument").map(unwrap_expression) else {
        return RawFieldValue::Unsupported("unary_expression");
    };
    if argument.kind() != "number" {
        return RawFieldValue::Unsupported("unary_expression");
    }
    let Some(value) = parse_number(node_text(argument, source)) else {
        return RawFieldValue::Unsupported("number");
    };

    match operator {
        "+" => RawFieldValue::Number(value),
        "-" => negate(&value)
            .map(RawFieldValue::Number)
            .unwrap_or(RawFieldValue::Unsupported("unary_expression")),
        _ => RawFieldValue::Unsupported("unary_expression"),
    }
}

fn negate(value: &Number) -> Option<Number> {
    if let Some(i) = value.as_i64() {
        if let Some(n) = i.checked_neg() {
            return Some(Number::from(n));
        }
    }
    value.as_f64().and_then(|f| number_from_f64(-f))
}

/// Parse a JavaScript numeric literal. BigInt literals are not representable.
fn parse_number(text: &str) -> Option<Number> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    if cleaned.ends_with('n') {
        return None;
    }

    let lower = cleaned.to_ascii_lowercase();
    let radix = if lower.starts_with("0x") {
        Some(16)
    } else if lower.starts_with("0o") {
        Some(8)
    } else if lower.starts_with("0b") {
        Some(2)
    } else {
        None
    };

    if let Some(radix) = radix {
        let value = u64::from_str_radix(&lower[2..], radix).ok()?;
        return if value as f64 <= MAX_SAFE_INTEGER {
            Some(Number::from(value))
        } else {
            number_from_f64(value as f64)
        };
    }

    let value: f64 = lower.parse().ok()?;
    number_from_f64(value)
}

/// Integral values become JSON integers so `3` does not serialize as `3.0`.
fn number_from_f64(value: f64) -> Option<Number> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        return Some(Number::from(value as i64));
    }
    Number::from_f64(value)
}

fn decode_string(node: Node, source: &str) -> String {
    let mut units: Vec<u16> = Vec::new();
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        match child.kind() {
            "string_fragment" => units.extend(node_text(child, source).encode_utf16()),
            "escape_sequence" => decode_escape(node_text(child, source), &mut units),
            _ => {}
        }
    }

    String::from_utf16_lossy(&units)
}

fn decode_escape(escape: &str, units: &mut Vec<u16>) {
    let body = escape.strip_prefix('\\').unwrap_or(escape);
    let mut chars = body.chars();
    let Some(first) = chars.next() else {
        return;
    };
    let rest = chars.as_str();

    let simple = match first {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        'b' => Some('\u{8}'),
        'f' => Some('\u{c}'),
        'v' => Some('\u{b}'),
        // Line continuation
        '\n' | '\r' | '\u{2028}' | '\u{2029}' => return,
        _ => None,
    };
    if let Some(c) = simple {
        units.push(c as u16);
        return;
    }

    match first {
        'x' => {
            if let Ok(code) = u16::from_str_radix(rest, 16) {
                units.push(code);
            }
        }
        'u' => {
            if let Some(braced) = rest.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
                if let Some(c) = u32::from_str_radix(braced, 16).ok().and_then(char::from_u32) {
                    let mut buf = [0u16; 2];
                    units.extend_from_slice(c.encode_utf16(&mut buf));
                }
            } else if let Ok(code) = u16::from_str_radix(rest, 16) {
                units.push(code);
            }
        }
        '0'..='7' => {
            if let Ok(code) = u16::from_str_radix(body, 8) {
                units.push(code);
            }
        }
        other => {
            let mut buf = [0u16; 2];
            units.extend_from_slice(other.encode_utf16(&mut buf));
        }
    }
}

fn first_named_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    found
}

fn last_named_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .last();
    found
}
