//! @dose
//! purpose: Runs the per-story pipeline: parse, locate declarations, evaluate candidates,
//!     normalize. Returns the component's properties plus any field-level diagnostics.
//!
//! invariants:
//!     - No state is shared between calls; each story is extracted independently
//!     - Only a syntax error fails extraction; unsupported values become diagnostics
//!
//! flows:
//!     - SourceUnit::parse -> locate -> normalize

use crate::normalize::normalize;
use crate::parser::{locate, ParseError, SourceUnit, SourceVariant};
use crate::types::{Diagnostic, PropertyDescriptor};
use std::path::Path;
use tracing::debug;

/// Result of extracting one story file
#[derive(Debug, Default)]
pub struct Extraction {
    pub properties: Vec<PropertyDescriptor>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Extract the properties declared in a story source.
pub fn extract_properties(source: &str, variant: SourceVariant) -> Result<Extraction, ParseError> {
    let unit = SourceUnit::parse(source, variant)?;
    Ok(extract_unit(&unit))
}

/// Read a story file and extract its properties.
pub fn extract_file(path: &Path) -> Result<Extraction, ParseError> {
    let unit = SourceUnit::from_file(path)?;
    let mut extraction = extract_unit(&unit);
    for diagnostic in &mut extraction.diagnostics {
        diagnostic.path = Some(path.to_path_buf());
    }
    Ok(extraction)
}

pub fn extract_unit(unit: &SourceUnit) -> Extraction {
    let located = locate(unit);
    debug!(
        path = ?unit.path(),
        declarations = located.declarations,
        candidates = located.candidates.len(),
        "located story metadata"
    );

    let normalized = normalize(&located.candidates);
    let mut diagnostics = located.diagnostics;
    diagnostics.extend(normalized.diagnostics);
    diagnostics.sort_by_key(|d| d.line);

    Extraction {
        properties: normalized.properties,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DiagnosticKind, PropType};
    use pretty_assertions::assert_eq;

    const BUTTON_STORY: &str = include_str!("../test_fixtures/Button/Button.stories.tsx");
    const LEGACY_STORY: &str = include_str!("../test_fixtures/Legacy/Legacy.stories.js");

    #[test]
    fn test_extract_csf3_story() {
        let extraction = extract_properties(BUTTON_STORY, SourceVariant::Tsx).unwrap();
        let summary: Vec<_> = extraction
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.prop_type, p.is_list))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("label", PropType::String, false),
                ("variant", PropType::String, false),
                ("size", PropType::Number, false),
                ("disabled", PropType::Boolean, false),
                ("tags", PropType::Object, true),
                ("onClick", PropType::Unknown, false),
            ]
        );
        assert_eq!(
            extraction.properties[1].description.as_deref(),
            Some("Visual style")
        );
        assert_eq!(extraction.diagnostics.len(), 1);
        assert_eq!(extraction.diagnostics[0].kind, DiagnosticKind::UnsupportedNode);
    }

    #[test]
    fn test_extract_legacy_story() {
        let extraction = extract_properties(LEGACY_STORY, SourceVariant::Jsx).unwrap();
        let names: Vec<_> = extraction.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["title", "columns", "rows", "striped"]);
        let rows = &extraction.properties[2];
        assert!(rows.is_list);
        assert_eq!(rows.prop_type, PropType::Object);
        assert_eq!(extraction.diagnostics.len(), 1);
        assert!(extraction.diagnostics[0].message.contains("spread entry `...Default.args`"));
    }

    #[test]
    fn test_extract_syntax_error() {
        let result = extract_properties("export default { args: { a: 1 ", SourceVariant::Script);
        assert!(matches!(result, Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let first = extract_properties(BUTTON_STORY, SourceVariant::Tsx).unwrap();
        let second = extract_properties(BUTTON_STORY, SourceVariant::Tsx).unwrap();
        assert_eq!(
            serde_json::to_string(&first.properties).unwrap(),
            serde_json::to_string(&second.properties).unwrap()
        );
    }

    #[test]
    fn test_extract_file_sets_diagnostic_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Chip.stories.ts");
        std::fs::write(&path, "export default { args: { onDelete: action('x') } };").unwrap();

        let extraction = extract_file(&path).unwrap();
        assert_eq!(extraction.properties.len(), 1);
        assert_eq!(extraction.diagnostics[0].path.as_deref(), Some(path.as_path()));
    }
}
