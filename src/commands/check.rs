//! @dose
//! purpose: This module implements the check command that rebuilds the manifest in memory and
//!     compares it with the one on disk, reporting added, removed and changed components.
//!
//! when-editing:
//!     - !Never write the manifest during a check
//!     - Comparison is on the serialized text, so ordering and formatting drift also count
//!
//! invariants:
//!     - A missing or unparsable manifest is stale
//!     - Skipped components only fail the check with --strict
//!
//! flows:
//!     - Build: same discovery and assembly as generate
//!     - Compare: serialized text first, then a per-component diff for the report

use crate::cli::CheckArgs;
use crate::commands::summary_line;
use crate::component::build_manifest;
use crate::config::Config;
use crate::types::Manifest;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Per-component differences between two manifests, by component name
#[derive(Debug, Default, PartialEq)]
pub struct ManifestDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

impl ManifestDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compare an on-disk manifest against a freshly built one.
pub fn diff_manifests(current: &Manifest, expected: &Manifest) -> ManifestDiff {
    let current_by_name: HashMap<&str, _> = current
        .components
        .iter()
        .map(|c| (c.name.as_str(), c))
        .collect();
    let expected_by_name: HashMap<&str, _> = expected
        .components
        .iter()
        .map(|c| (c.name.as_str(), c))
        .collect();

    let mut diff = ManifestDiff::default();
    for record in &expected.components {
        match current_by_name.get(record.name.as_str()) {
            None => diff.added.push(record.name.clone()),
            Some(existing) if *existing != record => diff.changed.push(record.name.clone()),
            Some(_) => {}
        }
    }
    for record in &current.components {
        if !expected_by_name.contains_key(record.name.as_str()) {
            diff.removed.push(record.name.clone());
        }
    }
    diff
}

pub fn run_check(args: &CheckArgs, root: &Path) -> Result<()> {
    let config = Config::load(root);
    let options = args.common.assemble_options(root, &config);
    let output = args.common.output_path(root, &config);

    let report = build_manifest(&options).context("Failed to build manifest")?;
    let expected = report
        .manifest
        .to_json()
        .context("Failed to serialize manifest")?;

    if !output.exists() {
        anyhow::bail!(
            "Manifest not found at {}; run `prefab-manifest generate`",
            output.display()
        );
    }
    let on_disk = fs::read_to_string(&output)
        .with_context(|| format!("Failed to read {}", output.display()))?;

    let up_to_date = on_disk == expected;
    if !up_to_date {
        match Manifest::from_json(&on_disk) {
            Ok(current) => {
                let diff = diff_manifests(&current, &report.manifest);
                for name in &diff.added {
                    println!("added: {}", name);
                }
                for name in &diff.removed {
                    println!("removed: {}", name);
                }
                for name in &diff.changed {
                    println!("changed: {}", name);
                }
                if diff.is_empty() {
                    println!("changed: component order or formatting");
                }
            }
            Err(e) => {
                debug!(error = %e, "existing manifest does not parse");
                println!("changed: {} is not a valid manifest", output.display());
            }
        }
    }

    println!("{}", summary_line(&report));

    if !up_to_date {
        anyhow::bail!("Manifest is stale: {}", output.display());
    }
    if args.strict && report.skipped > 0 {
        anyhow::bail!("{} components were skipped", report.skipped);
    }

    println!("Manifest is up to date");
    Ok(())
}
