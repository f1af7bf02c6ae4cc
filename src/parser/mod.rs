//! @dose
//! purpose: Tree-sitter integration for story files. Picks the grammar for a file's language
//!     variant, parses the text into a SourceUnit and rejects trees containing syntax errors.
//!     The evaluator and locator submodules work on the tree held by a SourceUnit.
//!
//! when-editing:
//!     - !Plain script and JSX share the JavaScript grammar; .ts and .tsx need different
//!       TypeScript grammars because `<T>x` casts conflict with JSX
//!     - Keep the extension table in SourceVariant::from_extension in sync with
//!       STORY_EXTENSIONS in component.rs
//!
//! invariants:
//!     - A SourceUnit always holds an error-free tree; parse() returns Syntax otherwise
//!     - Nothing in this module executes or interprets the source text
//!
//! gotchas:
//!     - tree-sitter never fails outright on bad input, it inserts ERROR/MISSING nodes, so
//!       the syntax check walks the tree for the first such node

pub mod evaluate;
pub mod locate;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

pub use evaluate::{evaluate, object_entries, unwrap_expression, EntryKey, ObjectEntry};
pub use locate::{
    locate, locate_declarations, Candidate, CandidateEntry, CandidateSource, Located,
    MetadataDeclaration, Provenance, META_IDENTIFIER,
};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("Unsupported story extension: {0}")]
    UnsupportedExtension(String),
    #[error("Failed to initialize parser: {0}")]
    Language(String),
}

/// Language variant a story file is parsed as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceVariant {
    Script,
    Jsx,
    TypeScript,
    Tsx,
}

impl SourceVariant {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "mjs" | "cjs" => Some(SourceVariant::Script),
            "jsx" => Some(SourceVariant::Jsx),
            "ts" | "mts" | "cts" => Some(SourceVariant::TypeScript),
            "tsx" => Some(SourceVariant::Tsx),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| ParseError::UnsupportedExtension(ext.to_string()))
    }

    fn create_parser(&self) -> Result<Parser, ParseError> {
        let mut parser = Parser::new();
        let language = match self {
            SourceVariant::Script | SourceVariant::Jsx => tree_sitter_javascript::LANGUAGE.into(),
            SourceVariant::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceVariant::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        };
        parser
            .set_language(&language)
            .map_err(|e| ParseError::Language(e.to_string()))?;
        Ok(parser)
    }
}

/// A story file's text together with its parsed tree
pub struct SourceUnit {
    path: Option<PathBuf>,
    variant: SourceVariant,
    source: String,
    tree: Tree,
}

impl SourceUnit {
    /// Parse source text as the given variant.
    pub fn parse(source: impl Into<String>, variant: SourceVariant) -> Result<Self, ParseError> {
        let source = source.into();
        let mut parser = variant.create_parser()?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| ParseError::Language("parser returned no tree".to_string()))?;

        if let Some(err) = first_syntax_error(tree.root_node(), &source) {
            return Err(err);
        }

        Ok(Self {
            path: None,
            variant,
            source,
            tree,
        })
    }

    /// Read and parse a file, choosing the variant from its extension.
    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        let variant = SourceVariant::from_path(path)?;
        let source = std::fs::read_to_string(path)?;
        let mut unit = Self::parse(source, variant)?;
        unit.path = Some(path.to_path_buf());
        Ok(unit)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn variant(&self) -> SourceVariant {
        self.variant
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Text covered by a node of this unit's tree
    pub fn text(&self, node: Node) -> &str {
        node_text(node, &self.source)
    }
}

pub(crate) fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// 1-based line of a node's first byte
pub(crate) fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

/// Find the first ERROR or MISSING node in document order.
fn first_syntax_error(root: Node, source: &str) -> Option<ParseError> {
    if !root.has_error() {
        return None;
    }

    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            let message = if node.is_missing() {
                format!("missing `{}`", node.kind())
            } else {
                let snippet: String = node_text(node, source)
                    .lines()
                    .next()
                    .unwrap_or("")
                    .chars()
                    .take(40)
                    .collect();
                format!("unexpected `{}`", snippet.trim())
            };
            return Some(ParseError::Syntax {
                line: pos.row + 1,
                column: pos.column + 1,
                message,
            });
        }

        // Only descend into subtrees that contain the error
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                // has_error() was set but no node was found; report the root
                let pos = root.start_position();
                return Some(ParseError::Syntax {
                    line: pos.row + 1,
                    column: pos.column + 1,
                    message: "invalid syntax".to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Button.stories.js", SourceVariant::Script)]
    #[case("Button.stories.mjs", SourceVariant::Script)]
    #[case("Button.stories.jsx", SourceVariant::Jsx)]
    #[case("Button.stories.ts", SourceVariant::TypeScript)]
    #[case("Button.stories.tsx", SourceVariant::Tsx)]
    fn test_variant_from_path(#[case] path: &str, #[case] expected: SourceVariant) {
        assert_eq!(SourceVariant::from_path(Path::new(path)).unwrap(), expected);
    }

    #[test]
    fn test_variant_rejects_unknown_extension() {
        let err = SourceVariant::from_path(Path::new("Button.mdx")).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedExtension(ext) if ext == "mdx"));
        assert!(SourceVariant::from_path(Path::new("Makefile")).is_err());
    }

    #[test]
    fn test_parse_valid_sources() {
        let js = "export default { args: { label: 'Go' } };";
        assert!(SourceUnit::parse(js, SourceVariant::Script).is_ok());

        let jsx = "export const Primary = () => <Button label=\"Go\" />;";
        assert!(SourceUnit::parse(jsx, SourceVariant::Jsx).is_ok());

        let ts = "const meta: Meta<typeof Button> = { args: { n: 1 } };\nexport default meta;";
        assert!(SourceUnit::parse(ts, SourceVariant::TypeScript).is_ok());

        let tsx = "export default { component: Button } satisfies Meta;\nexport const A = () => <Button />;";
        assert!(SourceUnit::parse(tsx, SourceVariant::Tsx).is_ok());
    }

    #[test]
    fn test_parse_reports_syntax_error_position() {
        let source = "export default {\n  args: { label: 'Go' \n};\n";
        let err = SourceUnit::parse(source, SourceVariant::Script)
            .err()
            .expect("should fail");
        match err {
            ParseError::Syntax { line, column, .. } => {
                assert!(line >= 1 && line <= 3, "line was {}", line);
                assert!(column >= 1);
            }
            other => panic!("Expected Syntax, got {:?}", other),
        }
    }

    #[test]
    fn test_typed_syntax_rejected_as_plain_script() {
        let source = "const meta: Meta = { args: {} };\nexport default meta;";
        assert!(matches!(
            SourceUnit::parse(source, SourceVariant::Script),
            Err(ParseError::Syntax { .. })
        ));
    }

    #[test]
    fn test_text_and_line() {
        let unit = SourceUnit::parse("\n\nconst x = 1;", SourceVariant::Script).unwrap();
        let decl = unit.root().named_child(0).unwrap();
        assert_eq!(unit.text(decl), "const x = 1;");
        assert_eq!(line_of(decl), 3);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Card.stories.ts");
        std::fs::write(&path, "export default { args: { title: 'Hi' } };").unwrap();

        let unit = SourceUnit::from_file(&path).unwrap();
        assert_eq!(unit.variant(), SourceVariant::TypeScript);
        assert_eq!(unit.path(), Some(path.as_path()));
        assert!(unit.source().contains("title"));
    }
}
