//! File-scoped diagnostics recorded while building a manifest.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// Story file could not be parsed; the component is skipped
    SyntaxError,
    /// No implementation file next to the story; the component is skipped
    MissingSibling,
    /// Story file could not be read; the component is skipped
    ReadError,
    /// A value could not be evaluated statically; only that field is omitted
    UnsupportedNode,
}

impl DiagnosticKind {
    /// Whether this kind drops the whole component from the manifest
    pub fn skips_component(&self) -> bool {
        !matches!(self, DiagnosticKind::UnsupportedNode)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::SyntaxError => "syntax-error",
            DiagnosticKind::MissingSibling => "missing-sibling",
            DiagnosticKind::ReadError => "read-error",
            DiagnosticKind::UnsupportedNode => "unsupported-node",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// 1-based source line, when the diagnostic points into a file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: None,
            line: None,
            message: message.into(),
        }
    }

    pub fn unsupported(line: usize, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::UnsupportedNode, message).at_line(line)
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}", path.display())?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
            }
            write!(f, ": ")?;
        } else if let Some(line) = self.line {
            write!(f, "line {}: ", line)?;
        }
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}
