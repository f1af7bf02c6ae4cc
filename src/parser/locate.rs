//! @dose
//! purpose: Finds the metadata-bearing declarations of a story file and pulls their `args`
//!     and `argTypes` object literals out as evaluated candidates for the normalizer.
//!
//! when-editing:
//!     - !Every search rule runs independently; a file may match several of them
//!     - !Only top-level statements are inspected, nested scopes never carry story metadata
//!     - Rules, in precedence order for the provenance tag:
//!         default export object, variable that is default-exported, variable named `meta`,
//!         named export object with args/argTypes, `Story.args = {...}` assignment to a top-level binding
//!
//! invariants:
//!     - A declaration reached by several rules is reported once
//!     - At most one `args` and one `argTypes` per declaration (the last key wins, as in JS)
//!     - Candidates are returned in source order of their object literal
//!
//! gotchas:
//!     - `export default meta;` only names the declaration; the object lives on the binding
//!     - A file with no matching declaration is valid and yields no candidates

use crate::parser::evaluate::{evaluate, object_entries, unwrap_expression, EntryKey};
use crate::parser::{line_of, node_text, SourceUnit};
use crate::types::{Diagnostic, RawFieldValue};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tree_sitter::Node;

/// Identifier reserved for the story metadata object
pub const META_IDENTIFIER: &str = "meta";

/// Which search rule matched a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// `export default { ... }`
    DefaultExport,
    /// `const m = { ... }; export default m;`
    DefaultExportedVariable,
    /// `const meta = { ... }`
    MetaVariable,
    /// `export const Primary = { args: { ... } }`
    NamedExport,
    /// `Primary.args = { ... }`
    MemberAssignment,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::DefaultExport => "default-export",
            Provenance::DefaultExportedVariable => "default-exported-variable",
            Provenance::MetaVariable => "meta-variable",
            Provenance::NamedExport => "named-export",
            Provenance::MemberAssignment => "member-assignment",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two substructures a declaration can contribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Args,
    ArgTypes,
}

impl CandidateSource {
    pub fn key(&self) -> &'static str {
        match self {
            CandidateSource::Args => "args",
            CandidateSource::ArgTypes => "argTypes",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "args" => Some(CandidateSource::Args),
            "argTypes" => Some(CandidateSource::ArgTypes),
            _ => None,
        }
    }
}

/// A top-level node found to describe component metadata
#[derive(Debug, Clone)]
pub struct MetadataDeclaration<'tree> {
    pub provenance: Provenance,
    /// Binding or export name, absent for an anonymous default export
    pub name: Option<String>,
    /// Declaration value with TypeScript wrappers removed
    pub node: Node<'tree>,
    /// Set for member assignments, whose value is the args/argTypes object itself
    pub field: Option<CandidateSource>,
}

impl MetadataDeclaration<'_> {
    pub fn is_object(&self) -> bool {
        self.node.kind() == "object"
    }

    pub fn line(&self) -> usize {
        line_of(self.node)
    }

    /// Human-readable label used in diagnostics
    pub fn label(&self) -> String {
        match (&self.name, self.field) {
            (Some(name), Some(field)) => format!("{}.{}", name, field.key()),
            (Some(name), None) => name.clone(),
            (None, _) => "default export".to_string(),
        }
    }
}

/// One `name: value` entry of an args/argTypes object
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateEntry {
    pub name: String,
    pub value: RawFieldValue,
    pub line: usize,
}

/// An evaluated args or argTypes object
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub source: CandidateSource,
    pub provenance: Provenance,
    /// Label of the declaration the candidate came from
    pub declaration: String,
    /// Byte offset of the object literal, used for source ordering
    pub position: usize,
    pub line: usize,
    pub entries: Vec<CandidateEntry>,
}

/// Everything the locator found in one story file
#[derive(Debug, Default)]
pub struct Located {
    pub declarations: usize,
    pub candidates: Vec<Candidate>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Top-level facts gathered in one pass over the program node
#[derive(Default)]
struct TopLevel<'tree> {
    bindings: HashMap<String, Node<'tree>>,
    default_object: Option<Node<'tree>>,
    default_name: Option<String>,
    named_exports: Vec<(String, Node<'tree>)>,
    assignments: Vec<(String, CandidateSource, Node<'tree>)>,
}

/// Find all metadata declarations, in source order.
pub fn locate_declarations(unit: &SourceUnit) -> Vec<MetadataDeclaration<'_>> {
    let source = unit.source();
    let top = scan_top_level(unit.root(), source);
    let mut found: Vec<MetadataDeclaration> = Vec::new();

    if let Some(node) = top.default_object {
        found.push(MetadataDeclaration {
            provenance: Provenance::DefaultExport,
            name: None,
            node,
            field: None,
        });
    }

    if let Some(name) = &top.default_name {
        if let Some(node) = top.bindings.get(name) {
            found.push(MetadataDeclaration {
                provenance: Provenance::DefaultExportedVariable,
                name: Some(name.clone()),
                node: *node,
                field: None,
            });
        }
    }

    if let Some(node) = top.bindings.get(META_IDENTIFIER) {
        found.push(MetadataDeclaration {
            provenance: Provenance::MetaVariable,
            name: Some(META_IDENTIFIER.to_string()),
            node: *node,
            field: None,
        });
    }

    for (name, node) in &top.named_exports {
        if node.kind() == "object" && has_metadata_key(*node, source) {
            found.push(MetadataDeclaration {
                provenance: Provenance::NamedExport,
                name: Some(name.clone()),
                node: *node,
                field: None,
            });
        }
    }

    // Only assignments to story bindings count; `window.args = ...` does not
    for (name, field, node) in &top.assignments {
        if !top.bindings.contains_key(name) {
            continue;
        }
        found.push(MetadataDeclaration {
            provenance: Provenance::MemberAssignment,
            name: Some(name.clone()),
            node: *node,
            field: Some(*field),
        });
    }

    // First rule to reach a node keeps it
    let mut seen = HashSet::new();
    found.retain(|decl| seen.insert(decl.node.id()));
    found.sort_by_key(|decl| decl.node.start_byte());
    found
}

/// Locate declarations and evaluate their args/argTypes candidates.
pub fn locate(unit: &SourceUnit) -> Located {
    let source = unit.source();
    let declarations = locate_declarations(unit);
    let mut located = Located {
        declarations: declarations.len(),
        ..Default::default()
    };

    for decl in &declarations {
        if !decl.is_object() {
            located.diagnostics.push(Diagnostic::unsupported(
                decl.line(),
                format!(
                    "{} is not an object literal ({})",
                    decl.label(),
                    decl.node.kind()
                ),
            ));
            continue;
        }

        match decl.field {
            Some(field) => {
                located
                    .candidates
                    .push(build_candidate(decl, field, decl.node, source, &mut located.diagnostics));
            }
            None => {
                for (field, value) in metadata_fields(decl.node, source) {
                    if value.kind() != "object" {
                        located.diagnostics.push(Diagnostic::unsupported(
                            line_of(value),
                            format!(
                                "{}.{} is not an object literal ({})",
                                decl.label(),
                                field.key(),
                                value.kind()
                            ),
                        ));
                        continue;
                    }
                    located
                        .candidates
                        .push(build_candidate(decl, field, value, source, &mut located.diagnostics));
                }
            }
        }
    }

    located.candidates.sort_by_key(|c| c.position);
    located
}

fn scan_top_level<'tree>(program: Node<'tree>, source: &str) -> TopLevel<'tree> {
    let mut top = TopLevel::default();
    let mut cursor = program.walk();

    for statement in program.named_children(&mut cursor) {
        match statement.kind() {
            "lexical_declaration" | "variable_declaration" => {
                for (name, value) in declarators(statement, source) {
                    top.bindings.insert(name, value);
                }
            }
            "export_statement" => scan_export(statement, source, &mut top),
            "expression_statement" => {
                if let Some(assignment) = metadata_assignment(statement, source) {
                    top.assignments.push(assignment);
                }
            }
            _ => {}
        }
    }

    top
}

fn scan_export<'tree>(statement: Node<'tree>, source: &str, top: &mut TopLevel<'tree>) {
    let is_default = {
        let mut cursor = statement.walk();
        let found = statement
            .children(&mut cursor)
            .any(|child| child.kind() == "default");
        found
    };

    if is_default {
        let Some(value) = statement.child_by_field_name("value").map(unwrap_expression) else {
            // export default function/class
            return;
        };
        match value.kind() {
            "identifier" => top.default_name = Some(node_text(value, source).to_string()),
            _ => top.default_object = Some(value),
        }
        return;
    }

    if let Some(declaration) = statement.child_by_field_name("declaration") {
        if matches!(
            declaration.kind(),
            "lexical_declaration" | "variable_declaration"
        ) {
            for (name, value) in declarators(declaration, source) {
                top.bindings.insert(name.clone(), value);
                top.named_exports.push((name, value));
            }
        }
        return;
    }

    // export { meta as default }
    let mut cursor = statement.walk();
    for child in statement.named_children(&mut cursor) {
        if child.kind() != "export_clause" {
            continue;
        }
        let mut clause_cursor = child.walk();
        for specifier in child.named_children(&mut clause_cursor) {
            let alias = specifier
                .child_by_field_name("alias")
                .map(|alias| node_text(alias, source));
            if alias == Some("default") {
                if let Some(name) = specifier.child_by_field_name("name") {
                    top.default_name = Some(node_text(name, source).to_string());
                }
            }
        }
    }
}

/// `(name, unwrapped initializer)` for each simple declarator
fn declarators<'tree>(declaration: Node<'tree>, source: &str) -> Vec<(String, Node<'tree>)> {
    let mut out = Vec::new();
    let mut cursor = declaration.walk();

    for declarator in declaration.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let (Some(name), Some(value)) = (
            declarator.child_by_field_name("name"),
            declarator.child_by_field_name("value"),
        ) else {
            continue;
        };
        // Destructuring patterns never name a metadata object
        if name.kind() != "identifier" {
            continue;
        }
        out.push((node_text(name, source).to_string(), unwrap_expression(value)));
    }

    out
}

/// `Primary.args = { ... };`
fn metadata_assignment<'tree>(
    statement: Node<'tree>,
    source: &str,
) -> Option<(String, CandidateSource, Node<'tree>)> {
    let expression = statement.named_child(0)?;
    if expression.kind() != "assignment_expression" {
        return None;
    }
    let left = expression.child_by_field_name("left")?;
    let right = expression.child_by_field_name("right")?;
    if left.kind() != "member_expression" {
        return None;
    }
    let object = left.child_by_field_name("object")?;
    let property = left.child_by_field_name("property")?;
    if object.kind() != "identifier" {
        return None;
    }
    let field = CandidateSource::from_key(node_text(property, source))?;
    Some((
        node_text(object, source).to_string(),
        field,
        unwrap_expression(right),
    ))
}

fn has_metadata_key(object: Node, source: &str) -> bool {
    object_entries(object, source)
        .iter()
        .any(|entry| entry.name().and_then(CandidateSource::from_key).is_some())
}

/// The `args` and `argTypes` values of a declaration object, last key wins.
fn metadata_fields<'tree>(object: Node<'tree>, source: &str) -> Vec<(CandidateSource, Node<'tree>)> {
    let mut args = None;
    let mut arg_types = None;

    for entry in object_entries(object, source) {
        match entry.name().and_then(CandidateSource::from_key) {
            Some(CandidateSource::Args) => args = Some(unwrap_expression(entry.value)),
            Some(CandidateSource::ArgTypes) => arg_types = Some(unwrap_expression(entry.value)),
            None => {}
        }
    }

    let mut fields: Vec<(CandidateSource, Node)> = [
        args.map(|node| (CandidateSource::Args, node)),
        arg_types.map(|node| (CandidateSource::ArgTypes, node)),
    ]
    .into_iter()
    .flatten()
    .collect();
    fields.sort_by_key(|(_, node)| node.start_byte());
    fields
}

fn build_candidate(
    decl: &MetadataDeclaration,
    source_kind: CandidateSource,
    object: Node,
    source: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Candidate {
    let label = match decl.field {
        Some(_) => decl.label(),
        None => format!("{}.{}", decl.label(), source_kind.key()),
    };
    let mut entries = Vec::new();

    for entry in object_entries(object, source) {
        match entry.key {
            EntryKey::Named(name) => entries.push(CandidateEntry {
                name,
                value: evaluate(entry.value, source),
                line: line_of(entry.value),
            }),
            EntryKey::Spread => diagnostics.push(Diagnostic::unsupported(
                line_of(entry.value),
                format!("{}: spread entry `{}` skipped", label, node_text(entry.value, source)),
            )),
            EntryKey::Computed => diagnostics.push(Diagnostic::unsupported(
                line_of(entry.value),
                format!("{}: computed key skipped", label),
            )),
        }
    }

    Candidate {
        source: source_kind,
        provenance: decl.provenance,
        declaration: label,
        position: object.start_byte(),
        line: line_of(object),
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SourceVariant;
    use crate::types::DiagnosticKind;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> SourceUnit {
        SourceUnit::parse(source, SourceVariant::Tsx).expect("fixture should parse")
    }

    fn summary(located: &Located) -> Vec<(CandidateSource, Provenance, Vec<String>)> {
        located
            .candidates
            .iter()
            .map(|c| {
                (
                    c.source,
                    c.provenance,
                    c.entries.iter().map(|e| e.name.clone()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_default_export_object() {
        let unit = parse(
            r#"
export default {
  title: "Button",
  args: { label: "Go", count: 3 },
  argTypes: { label: { description: "Text" } },
};
"#,
        );
        let located = locate(&unit);
        assert_eq!(located.declarations, 1);
        assert_eq!(
            summary(&located),
            vec![
                (
                    CandidateSource::Args,
                    Provenance::DefaultExport,
                    vec!["label".to_string(), "count".to_string()]
                ),
                (
                    CandidateSource::ArgTypes,
                    Provenance::DefaultExport,
                    vec!["label".to_string()]
                ),
            ]
        );
        assert!(located.diagnostics.is_empty());
    }

    #[test]
    fn test_default_exported_variable_with_satisfies() {
        let unit = parse(
            r#"
import type { Meta } from "@storybook/react";
const config = {
  component: Button,
  argTypes: { size: { type: { name: "string" } } },
} satisfies Meta<typeof Button>;
export default config;
"#,
        );
        let decls = locate_declarations(&unit);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].provenance, Provenance::DefaultExportedVariable);
        assert_eq!(decls[0].name.as_deref(), Some("config"));

        let located = locate(&unit);
        assert_eq!(
            summary(&located),
            vec![(
                CandidateSource::ArgTypes,
                Provenance::DefaultExportedVariable,
                vec!["size".to_string()]
            )]
        );
    }

    #[test]
    fn test_meta_variable_and_named_exports() {
        let unit = parse(
            r#"
const meta: Meta<typeof Card> = {
  args: { title: "Card" },
};
export default meta;

export const Primary: Story = { args: { elevated: true } };
export const Secondary = { args: { elevated: false, tone: "muted" } };
export const Plain = { render: () => <Card /> };
export const helper = () => 1;
"#,
        );
        let decls = locate_declarations(&unit);
        let provenances: Vec<_> = decls.iter().map(|d| d.provenance).collect();
        assert_eq!(
            provenances,
            vec![
                Provenance::DefaultExportedVariable,
                Provenance::NamedExport,
                Provenance::NamedExport,
            ]
        );

        let located = locate(&unit);
        let labels: Vec<_> = located
            .candidates
            .iter()
            .map(|c| c.declaration.as_str())
            .collect();
        assert_eq!(labels, vec!["meta.args", "Primary.args", "Secondary.args"]);
    }

    #[test]
    fn test_unexported_meta_variable() {
        let unit = parse("const meta = { args: { open: false } };\nexport const A = {};");
        let decls = locate_declarations(&unit);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].provenance, Provenance::MetaVariable);
    }

    #[test]
    fn test_exported_meta_is_reported_once() {
        let unit = parse("export const meta = { args: { a: 1 } };\nexport default meta;");
        let decls = locate_declarations(&unit);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].provenance, Provenance::DefaultExportedVariable);
        assert_eq!(locate(&unit).candidates.len(), 1);
    }

    #[test]
    fn test_export_clause_default_alias() {
        let unit = parse("const stories = { args: { a: 1 } };\nexport { stories as default };");
        let decls = locate_declarations(&unit);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].provenance, Provenance::DefaultExportedVariable);
    }

    #[test]
    fn test_member_assignment_stories() {
        let unit = parse(
            r#"
export default { title: "Legacy/Button" };
const Template = (args) => <Button {...args} />;
export const Primary = Template.bind({});
Primary.args = { primary: true, label: "Button" };
Primary.argTypes = { label: { description: "Label" } };
window.args = { injected: true };
console.argTypes = { b: {} };
"#,
        );
        let located = locate(&unit);
        assert_eq!(
            summary(&located),
            vec![
                (
                    CandidateSource::Args,
                    Provenance::MemberAssignment,
                    vec!["primary".to_string(), "label".to_string()]
                ),
                (
                    CandidateSource::ArgTypes,
                    Provenance::MemberAssignment,
                    vec!["label".to_string()]
                ),
            ]
        );
        assert_eq!(located.candidates[0].declaration, "Primary.args");
    }

    #[test]
    fn test_last_args_key_wins() {
        let unit = parse("export default { args: { a: 1 }, args: { b: 2 } };");
        let located = locate(&unit);
        assert_eq!(
            summary(&located),
            vec![(
                CandidateSource::Args,
                Provenance::DefaultExport,
                vec!["b".to_string()]
            )]
        );
    }

    #[test]
    fn test_candidates_in_source_order() {
        let unit = parse(
            r#"
export const First = { args: { one: 1 } };
export default { argTypes: { two: {} }, args: { three: 3 } };
"#,
        );
        let located = locate(&unit);
        let names: Vec<_> = located
            .candidates
            .iter()
            .flat_map(|c| c.entries.iter().map(|e| e.name.as_str()))
            .collect();
        assert_eq!(names, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_no_metadata_is_empty_not_error() {
        let unit = parse("import { Button } from './Button';\nexport const Primary = () => <Button />;");
        let located = locate(&unit);
        assert_eq!(located.declarations, 0);
        assert!(located.candidates.is_empty());
        assert!(located.diagnostics.is_empty());
    }

    #[test]
    fn test_non_object_shapes_are_diagnosed() {
        let unit = parse(
            r#"
export default defineMeta({ args: { a: 1 } });
const meta = { args: sharedArgs, argTypes: { ...base, size: {} } };
"#,
        );
        let located = locate(&unit);
        let messages: Vec<_> = located
            .diagnostics
            .iter()
            .map(|d| {
                assert_eq!(d.kind, DiagnosticKind::UnsupportedNode);
                d.message.clone()
            })
            .collect();
        assert_eq!(
            messages,
            vec![
                "default export is not an object literal (call_expression)".to_string(),
                "meta.args is not an object literal (identifier)".to_string(),
                "meta.argTypes: spread entry `...base` skipped".to_string(),
            ]
        );
        assert_eq!(located.diagnostics[0].line, Some(2));
        assert_eq!(
            summary(&located),
            vec![(
                CandidateSource::ArgTypes,
                Provenance::MetaVariable,
                vec!["size".to_string()]
            )]
        );
    }

    #[test]
    fn test_entry_values_are_evaluated() {
        let unit = parse("export default { args: { items: ['a', 'b'], onClick: fn() } };");
        let located = locate(&unit);
        let entries = &located.candidates[0].entries;
        assert_eq!(
            entries[0].value,
            RawFieldValue::List(vec!["a".into(), "b".into()])
        );
        assert_eq!(entries[1].value, RawFieldValue::Unsupported("call_expression"));
        assert_eq!(entries[1].line, 1);
    }
}
