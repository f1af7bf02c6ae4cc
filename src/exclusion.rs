//! @dose
//! purpose: File exclusion for the story walk, combining gitignore files, built-in directory
//!     exclusions and patterns from prefab.toml/CLI --exclude.
//!
//! when-editing:
//!     - !Override patterns use ! prefix to negate (exclude), so we add ! to user patterns
//!     - The ignore crate handles gitignore parsing automatically
//!
//! invariants:
//!     - Default exclusions (node_modules, storybook-static, etc.) are always applied
//!     - CLI --exclude patterns are combined with prefab.toml exclude patterns
//!     - Gitignore is respected by default unless --no-gitignore is passed
//!
//! gotchas:
//!     - Patterns are relative to the directory being walked (the components directory)
//!     - The ignore crate's override patterns are inclusive by default, so we negate them

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::path::Path;
use tracing::warn;

/// Configuration for file exclusion during directory walking
#[derive(Debug, Clone)]
pub struct ExclusionConfig {
    /// Glob patterns to exclude (prefab.toml `exclude` plus --exclude flags)
    pub patterns: Vec<String>,
    /// Whether to respect .gitignore files (default: true)
    pub respect_gitignore: bool,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            respect_gitignore: true,
        }
    }
}

/// Directories that never hold source stories
const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "coverage",
    "storybook-static",
    ".storybook",
    ".next",
    ".turbo",
    ".cache",
];

/// Build a WalkBuilder with the given exclusion configuration
pub fn build_walker(root: &Path, config: &ExclusionConfig) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);

    builder.git_ignore(config.respect_gitignore);
    builder.git_global(config.respect_gitignore);
    builder.git_exclude(config.respect_gitignore);
    // .gitignore applies even outside a git checkout
    builder.require_git(false);

    builder.hidden(false);

    let mut overrides = OverrideBuilder::new(root);

    for dir in DEFAULT_EXCLUDED_DIRS {
        let _ = overrides.add(&format!("!{}/**", dir));
        let _ = overrides.add(&format!("!{}", dir));
    }

    for pattern in &config.patterns {
        if let Err(e) = overrides.add(&format!("!{}", pattern)) {
            warn!(pattern = %pattern, error = %e, "invalid exclude pattern");
        }
    }

    match overrides.build() {
        Ok(built) => {
            builder.overrides(built);
        }
        Err(e) => warn!(error = %e, "failed to build exclude overrides"),
    }

    builder
}

/// Build a GlobSet from patterns for matching individual paths
pub fn build_exclude_globset(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => warn!(pattern = %pattern, error = %e, "invalid exclude pattern"),
        }
    }

    builder.build().ok()
}

/// Check if a directory name is excluded by default
pub fn is_default_excluded_dir(name: &str) -> bool {
    DEFAULT_EXCLUDED_DIRS.contains(&name)
}

/// Whether any component of a relative path is a default-excluded directory
pub fn in_default_excluded_dir(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str().to_str().is_some_and(is_default_excluded_dir))
}
