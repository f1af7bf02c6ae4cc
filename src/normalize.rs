//! @dose
//! purpose: Merges the args/argTypes candidates of one story file into the ordered list of
//!     PropertyDescriptors that ends up in the component's `props` array.
//!
//! when-editing:
//!     - !Candidates must arrive in source order; the first time a name is seen fixes its
//!       position in the output
//!     - Type resolution: declared argTypes type, else inferred from the final default,
//!       else `unknown`
//!     - Default resolution: args default, else argTypes defaultValue
//!
//! invariants:
//!     - Names are unique in the output
//!     - A later occurrence updates fields in place but never clears one an earlier
//!       occurrence set
//!     - isList is true exactly when the resolved default is a list
//!     - A default holding any unsupported node is dropped with an UnsupportedNode diagnostic
//!
//! gotchas:
//!     - Declared names outside the vocabulary (`function`, `enum`) count as undeclared

use crate::parser::{Candidate, CandidateEntry, CandidateSource};
use crate::types::{Diagnostic, PropType, PropertyDescriptor, RawFieldValue};
use indexmap::IndexMap;

/// Properties and diagnostics produced for one story file
#[derive(Debug, Default)]
pub struct Normalized {
    pub properties: Vec<PropertyDescriptor>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Everything collected so far for one property name
#[derive(Debug, Default)]
struct PropState {
    declared_type: Option<PropType>,
    description: Option<String>,
    args_default: Option<RawFieldValue>,
    arg_types_default: Option<RawFieldValue>,
}

impl PropState {
    fn finish(self, name: String) -> PropertyDescriptor {
        let default_value = self.args_default.or(self.arg_types_default);
        let prop_type = self
            .declared_type
            .or_else(|| default_value.as_ref().and_then(RawFieldValue::inferred_type))
            .unwrap_or(PropType::Unknown);
        let is_list = default_value.as_ref().is_some_and(RawFieldValue::is_list);

        PropertyDescriptor {
            name,
            prop_type,
            description: self.description,
            default_value,
            is_list,
        }
    }
}

/// Accumulates candidates in source order
#[derive(Debug, Default)]
pub struct PropAccumulator {
    props: IndexMap<String, PropState>,
    diagnostics: Vec<Diagnostic>,
}

impl PropAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_candidate(&mut self, candidate: &Candidate) {
        for entry in &candidate.entries {
            match candidate.source {
                CandidateSource::Args => self.add_arg(&candidate.declaration, entry),
                CandidateSource::ArgTypes => self.add_arg_type(&candidate.declaration, entry),
            }
        }
    }

    fn add_arg(&mut self, declaration: &str, entry: &CandidateEntry) {
        let state = self.props.entry(entry.name.clone()).or_default();
        if let Some(value) = static_default(declaration, entry, &entry.value, &mut self.diagnostics) {
            state.args_default = Some(value);
        }
    }

    fn add_arg_type(&mut self, declaration: &str, entry: &CandidateEntry) {
        let state = self.props.entry(entry.name.clone()).or_default();

        let RawFieldValue::Map(fields) = &entry.value else {
            let shape = match &entry.value {
                RawFieldValue::Unsupported(kind) => *kind,
                other => other.inferred_type().map(|t| t.as_str()).unwrap_or("unknown"),
            };
            self.diagnostics.push(Diagnostic::unsupported(
                entry.line,
                format!("{}.{} is not an object literal ({})", declaration, entry.name, shape),
            ));
            return;
        };

        if let Some(declared) = fields.get("type").and_then(declared_type) {
            state.declared_type = Some(declared);
        }

        if let Some(description) = fields.get("description").and_then(RawFieldValue::as_str) {
            state.description = Some(description.to_string());
        }

        if let Some(value) = fields.get("defaultValue") {
            if let Some(value) = static_default(declaration, entry, value, &mut self.diagnostics) {
                state.arg_types_default = Some(value);
            }
        }
    }

    /// Resolve every property, keeping first-seen order.
    pub fn finish(self) -> Normalized {
        Normalized {
            properties: self
                .props
                .into_iter()
                .map(|(name, state)| state.finish(name))
                .collect(),
            diagnostics: self.diagnostics,
        }
    }
}

/// Normalize candidates that are already in source order.
pub fn normalize(candidates: &[Candidate]) -> Normalized {
    let mut acc = PropAccumulator::new();
    for candidate in candidates {
        acc.add_candidate(candidate);
    }
    acc.finish()
}

/// `type: "string"` or `type: { name: "string" }`
fn declared_type(value: &RawFieldValue) -> Option<PropType> {
    let name = match value {
        RawFieldValue::String(name) => name.as_str(),
        RawFieldValue::Map(_) => value.get("name")?.as_str()?,
        _ => return None,
    };
    PropType::from_declared(name)
}

fn static_default(
    declaration: &str,
    entry: &CandidateEntry,
    value: &RawFieldValue,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<RawFieldValue> {
    match value.unsupported_kind() {
        None => Some(value.clone()),
        Some(kind) => {
            diagnostics.push(Diagnostic::unsupported(
                entry.line,
                format!(
                    "{}.{}: default value omitted, `{}` cannot be evaluated statically",
                    declaration, entry.name, kind
                ),
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{locate, SourceUnit, SourceVariant};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn normalize_source(source: &str) -> Normalized {
        let unit = SourceUnit::parse(source, SourceVariant::Tsx).expect("fixture should parse");
        normalize(&locate(&unit).candidates)
    }

    fn props_json(normalized: &Normalized) -> serde_json::Value {
        serde_json::to_value(&normalized.properties).unwrap()
    }

    #[test]
    fn test_args_scalars_in_order() {
        let out = normalize_source(r#"export default { args: { label: "Go", count: 3 } };"#);
        assert_eq!(
            props_json(&out),
            json!([
                {"name": "label", "type": "string", "defaultValue": "Go", "isList": false},
                {"name": "count", "type": "number", "defaultValue": 3, "isList": false},
            ])
        );
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_arg_types_structured_entry() {
        let out = normalize_source(
            r#"
export default {
  argTypes: {
    color: { type: { name: "string" }, description: "Swatch", defaultValue: "red" },
  },
};
"#,
        );
        assert_eq!(
            props_json(&out),
            json!([{
                "name": "color",
                "type": "string",
                "description": "Swatch",
                "defaultValue": "red",
                "isList": false,
            }])
        );
    }

    #[test]
    fn test_list_default_is_object_list() {
        let out = normalize_source(r#"export default { args: { tags: ["a", "b"] } };"#);
        let prop = &out.properties[0];
        assert_eq!(prop.prop_type, PropType::Object);
        assert!(prop.is_list);
        assert_eq!(
            prop.default_value,
            Some(RawFieldValue::List(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_args_default_beats_arg_types_default() {
        let out = normalize_source(
            r#"
export default {
  argTypes: { size: { type: "number", description: "Px", defaultValue: 12 } },
  args: { size: "large" },
};
"#,
        );
        assert_eq!(
            props_json(&out),
            json!([{
                "name": "size",
                "type": "number",
                "description": "Px",
                "defaultValue": "large",
                "isList": false,
            }])
        );
    }

    #[test]
    fn test_arg_types_default_used_when_args_missing() {
        let out = normalize_source(
            r#"
export default {
  args: { label: "Go" },
  argTypes: { rows: { defaultValue: [[1, 2], [3, 4]] } },
};
"#,
        );
        let rows = &out.properties[1];
        assert_eq!(rows.name, "rows");
        assert_eq!(rows.prop_type, PropType::Object);
        assert!(rows.is_list);
    }

    #[test]
    fn test_first_seen_position_and_field_merge() {
        let out = normalize_source(
            r#"
const meta = {
  args: { disabled: false, label: "Meta" },
  argTypes: { label: { description: "Button text" } },
};
export default meta;
export const Primary = { args: { label: "Primary", icon: null } };
export const Secondary = { argTypes: { label: { type: { name: "other" } } } };
"#,
        );
        assert_eq!(
            props_json(&out),
            json!([
                {"name": "disabled", "type": "boolean", "defaultValue": false, "isList": false},
                {
                    "name": "label",
                    "type": "string",
                    "description": "Button text",
                    "defaultValue": "Primary",
                    "isList": false,
                },
                {"name": "icon", "type": "null", "defaultValue": null, "isList": false},
            ])
        );
    }

    #[test]
    fn test_declared_array_and_shorthand_types() {
        let out = normalize_source(
            r#"
export default {
  argTypes: {
    items: { type: { name: "array" } },
    mode: { type: "string", control: { type: "select" }, options: ["a", "b"] },
    onClick: { type: { name: "function" } },
  },
};
"#,
        );
        let types: Vec<_> = out.properties.iter().map(|p| p.prop_type).collect();
        assert_eq!(types, vec![PropType::Object, PropType::String, PropType::Unknown]);
        assert!(out.properties.iter().all(|p| !p.is_list));
    }

    #[test]
    fn test_declared_type_beats_inferred() {
        let out = normalize_source(
            r#"export default { args: { count: "3" }, argTypes: { count: { type: "number" } } };"#,
        );
        assert_eq!(out.properties[0].prop_type, PropType::Number);
        assert_eq!(out.properties[0].default_value, Some("3".into()));
    }

    #[test]
    fn test_unsupported_default_is_omitted_with_diagnostic() {
        let out = normalize_source(
            r#"
export default {
  args: {
    onClick: fn(),
    style: { color: theme.primary },
    label: `Hello`,
  },
};
"#,
        );
        assert_eq!(
            props_json(&out),
            json!([
                {"name": "onClick", "type": "unknown", "isList": false},
                {"name": "style", "type": "unknown", "isList": false},
                {"name": "label", "type": "unknown", "isList": false},
            ])
        );
        assert_eq!(out.diagnostics.len(), 3);
        assert_eq!(out.diagnostics[0].line, Some(4));
        assert!(out.diagnostics[0].message.contains("default export.args.onClick"));
        assert!(out.diagnostics[1].message.contains("member_expression"));
    }

    #[test]
    fn test_array_hole_default_is_omitted() {
        let out = normalize_source("export default { args: { a: [1, , 2] } };");
        assert_eq!(
            props_json(&out),
            json!([{"name": "a", "type": "unknown", "isList": false}])
        );
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].message.contains("array_hole"));
    }

    #[test]
    fn test_declared_type_kept_for_list_default() {
        let out = normalize_source(
            r#"export default { args: { tags: ["a"] }, argTypes: { tags: { type: "string" } } };"#,
        );
        assert_eq!(
            props_json(&out),
            json!([{"name": "tags", "type": "string", "defaultValue": ["a"], "isList": true}])
        );
    }

    #[test]
    fn test_unsupported_later_default_keeps_earlier() {
        let out = normalize_source(
            r#"
export default { args: { size: 2 } };
export const Big = { args: { size: compute() } };
"#,
        );
        assert_eq!(out.properties[0].default_value, Some(2.into()));
        assert_eq!(out.diagnostics.len(), 1);
    }

    #[test]
    fn test_non_object_arg_type_entry() {
        let out = normalize_source(r#"export default { argTypes: { label: "text" } };"#);
        assert_eq!(out.properties.len(), 1);
        assert_eq!(out.properties[0].prop_type, PropType::Unknown);
        assert_eq!(
            out.diagnostics[0].message,
            "default export.argTypes.label is not an object literal (string)"
        );
    }

    #[test]
    fn test_empty_when_no_metadata() {
        let out = normalize_source("export const Primary = () => <Button />;");
        assert!(out.properties.is_empty());
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_accumulator_directly() {
        let candidate = Candidate {
            source: CandidateSource::Args,
            provenance: crate::parser::Provenance::MemberAssignment,
            declaration: "Primary.args".to_string(),
            position: 0,
            line: 1,
            entries: vec![
                CandidateEntry {
                    name: "b".into(),
                    value: true.into(),
                    line: 1,
                },
                CandidateEntry {
                    name: "a".into(),
                    value: RawFieldValue::Null,
                    line: 1,
                },
            ],
        };
        let mut acc = PropAccumulator::new();
        acc.add_candidate(&candidate);
        let out = acc.finish();
        let names: Vec<_> = out.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
