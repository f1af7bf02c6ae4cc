//! @dose
//! purpose: Turns a components directory into a Manifest. Discovers story files, pairs each
//!     with the implementation file named after its directory, extracts the story's
//!     properties and packages them into ComponentRecords.
//!
//! when-editing:
//!     - !Only a missing components directory aborts the run; every other failure skips
//!       one component and is reported as a Diagnostic
//!     - Keep STORY_EXTENSIONS in sync with SourceVariant::from_extension
//!
//! invariants:
//!     - Records appear in discovery order (sorted story paths), regardless of the
//!       parallel extraction
//!     - module/include paths use `/` separators on every platform
//!
//! gotchas:
//!     - The sibling is looked up by the directory name, not the story file's stem
//!
//! flows:
//!     - discover_stories -> (par) assemble_component -> collect in order -> Manifest

use crate::exclusion::{build_walker, ExclusionConfig};
use crate::extract::{extract_properties, Extraction};
use crate::parser::{ParseError, SourceVariant};
use crate::types::{ComponentRecord, Diagnostic, DiagnosticKind, Manifest};
use glob::{glob_with, MatchOptions, Pattern};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Extensions accepted for story files
pub const STORY_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx"];

/// Extensions accepted for the implementation file next to a story
pub const SIBLING_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];

static STORY_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^/\\]+\.stories\.(js|jsx|mjs|cjs|ts|tsx)$").expect("story pattern is valid")
});

static UNSAFE_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9._-]").expect("name pattern is valid"));

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("Components directory not found: {}", .0.display())]
    Discovery(PathBuf),
    #[error("No implementation file {expected} next to {}", .story.display())]
    MissingSibling { story: PathBuf, expected: String },
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

impl AssembleError {
    /// File-scoped failures as diagnostics; None for the fatal discovery error
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        match self {
            AssembleError::Discovery(_) => None,
            AssembleError::MissingSibling { story, expected } => Some(
                Diagnostic::new(
                    DiagnosticKind::MissingSibling,
                    format!("no implementation file {}", expected),
                )
                .with_path(story),
            ),
            AssembleError::Read { path, source } => Some(
                Diagnostic::new(DiagnosticKind::ReadError, source.to_string()).with_path(path),
            ),
            AssembleError::Parse { path, source } => {
                let diagnostic = match source {
                    ParseError::Syntax {
                        line,
                        column,
                        message,
                    } => Diagnostic::new(
                        DiagnosticKind::SyntaxError,
                        format!("column {}: {}", column, message),
                    )
                    .at_line(*line),
                    ParseError::IoError(e) => Diagnostic::new(DiagnosticKind::ReadError, e.to_string()),
                    other => Diagnostic::new(DiagnosticKind::SyntaxError, other.to_string()),
                };
                Some(diagnostic.with_path(path))
            }
        }
    }
}

/// Settings for one manifest build, after config and CLI are merged
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Absolute or root-joined components directory
    pub components_dir: PathBuf,
    pub version: String,
    pub base_dir: String,
    pub exclusion: ExclusionConfig,
}

impl AssembleOptions {
    pub fn new(components_dir: impl Into<PathBuf>) -> Self {
        Self {
            components_dir: components_dir.into(),
            version: "1.0.0".to_string(),
            base_dir: "./components".to_string(),
            exclusion: ExclusionConfig::default(),
        }
    }
}

/// Outcome of a manifest build
#[derive(Debug, Default)]
pub struct BuildReport {
    pub manifest: Manifest,
    /// Stories that did not produce a record
    pub skipped: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildReport {
    /// Diagnostics that did not skip a component
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| !d.kind.skips_component())
            .count()
    }
}

pub fn is_story_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| STORY_FILE.is_match(name))
}

/// Find every story file below the components directory, sorted by path.
pub fn discover_stories(options: &AssembleOptions) -> Result<Vec<PathBuf>, AssembleError> {
    let dir = &options.components_dir;
    if !dir.is_dir() {
        return Err(AssembleError::Discovery(dir.clone()));
    }

    let mut stories: Vec<PathBuf> = build_walker(dir, &options.exclusion)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| is_story_file(path))
        .collect();
    stories.sort();

    debug!(count = stories.len(), dir = %dir.display(), "discovered story files");
    Ok(stories)
}

/// Locate `<dir>/<dirname>.{js,jsx,ts,tsx}` next to a story file.
pub fn find_sibling(story: &Path) -> Result<PathBuf, AssembleError> {
    let (dir, dir_name) = component_dir(story);
    let expected = format!("{}.{{{}}}", dir_name, SIBLING_EXTENSIONS.join(","));
    let missing = || AssembleError::MissingSibling {
        story: story.to_path_buf(),
        expected: expected.clone(),
    };

    let pattern = format!(
        "{}/{}.*",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(&dir_name)
    );
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let entries = glob_with(&pattern, options).map_err(|_| missing())?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_stem().and_then(|s| s.to_str()) == Some(dir_name.as_str())
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| SIBLING_EXTENSIONS.contains(&e))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next().ok_or_else(missing)
}

/// Lower-cased, URL-safe component name derived from a directory name
pub fn component_name(dir_name: &str) -> String {
    UNSAFE_NAME_CHARS
        .replace_all(&dir_name.to_lowercase(), "-")
        .into_owned()
}

pub fn display_name(dir_name: &str) -> String {
    dir_name.replace('-', " ").to_uppercase()
}

fn component_dir(story: &Path) -> (PathBuf, String) {
    let dir = story.parent().map(Path::to_path_buf).unwrap_or_default();
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, name)
}

/// `./Button/Button.tsx` style path relative to the components directory
fn include_path(sibling: &Path, components_dir: &Path) -> String {
    let relative = sibling.strip_prefix(components_dir).unwrap_or(sibling);
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("./{}", parts.join("/"))
}

/// Build the record for one story file.
pub fn assemble_component(
    story: &Path,
    options: &AssembleOptions,
) -> Result<(ComponentRecord, Vec<Diagnostic>), AssembleError> {
    let sibling = find_sibling(story)?;
    let (_, dir_name) = component_dir(story);

    let variant = SourceVariant::from_path(story).map_err(|source| AssembleError::Parse {
        path: story.to_path_buf(),
        source,
    })?;
    let source = fs::read_to_string(story).map_err(|source| AssembleError::Read {
        path: story.to_path_buf(),
        source,
    })?;
    let Extraction {
        properties,
        mut diagnostics,
    } = extract_properties(&source, variant).map_err(|source| AssembleError::Parse {
        path: story.to_path_buf(),
        source,
    })?;
    for diagnostic in &mut diagnostics {
        diagnostic.path = Some(story.to_path_buf());
    }

    let include = include_path(&sibling, &options.components_dir);
    let record = ComponentRecord {
        name: component_name(&dir_name),
        version: options.version.clone(),
        display_name: display_name(&dir_name),
        base_dir: options.base_dir.clone(),
        module: format!("require('{}').default", include),
        include: vec![include],
        props: properties,
        packages: Vec::new(),
    };

    debug!(
        story = %story.display(),
        component = %record.name,
        props = record.props.len(),
        "assembled component"
    );
    Ok((record, diagnostics))
}

/// Discover, extract and assemble every component under the components directory.
pub fn build_manifest(options: &AssembleOptions) -> Result<BuildReport, AssembleError> {
    let stories = discover_stories(options)?;

    let results: Vec<_> = stories
        .par_iter()
        .map(|story| assemble_component(story, options))
        .collect();

    let mut report = BuildReport::default();
    let mut names = HashSet::new();

    for result in results {
        match result {
            Ok((record, diagnostics)) => {
                if !names.insert(record.name.clone()) {
                    warn!(component = %record.name, "several story files share a component name");
                }
                report.diagnostics.extend(diagnostics);
                report.manifest.push(record);
            }
            Err(e) => {
                let Some(diagnostic) = e.to_diagnostic() else {
                    return Err(e);
                };
                report.skipped += 1;
                report.diagnostics.push(diagnostic);
            }
        }
    }

    for diagnostic in &report.diagnostics {
        warn!("{}", diagnostic);
    }

    Ok(report)
}
