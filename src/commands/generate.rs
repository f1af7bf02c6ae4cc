//! @dose
//! purpose: This module implements the generate command that builds the component manifest
//!     from every story file and writes it as wmprefab.config.json (or prints it).
//!
//! when-editing:
//!     - !The manifest is written once, after every component has been assembled
//!     - Per-component failures are counted as skipped, never fatal
//!
//! invariants:
//!     - stdout carries only the manifest in --dry-run mode; the summary goes to stderr then
//!     - --strict fails the run after writing when any component was skipped
//!
//! flows:
//!     - Config::load -> build_manifest -> Manifest::to_json -> write or print -> summary

use crate::cli::GenerateArgs;
use crate::component::{build_manifest, AssembleOptions, BuildReport};
use crate::config::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

pub fn run_generate(args: &GenerateArgs, root: &Path) -> Result<()> {
    let config = Config::load(root);
    let options = args.common.assemble_options(root, &config);
    let output = args.common.output_path(root, &config);

    let report = if args.dry_run {
        let report = build_manifest(&options).context("Failed to build manifest")?;
        let json = report
            .manifest
            .to_json()
            .context("Failed to serialize manifest")?;
        print!("{}", json);
        eprintln!("{}", summary_line(&report));
        report
    } else {
        let report = generate_manifest(&options, &output)?;
        println!("{}", summary_line(&report));
        report
    };

    if args.strict && report.skipped > 0 {
        anyhow::bail!("{} components were skipped", report.skipped);
    }

    Ok(())
}

/// Build the manifest and write it to `output`.
pub fn generate_manifest(options: &AssembleOptions, output: &Path) -> Result<BuildReport> {
    let report = build_manifest(options).context("Failed to build manifest")?;
    let json = report
        .manifest
        .to_json()
        .context("Failed to serialize manifest")?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(output, json).with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        path = %output.display(),
        components = report.manifest.components.len(),
        "wrote manifest"
    );
    Ok(report)
}

pub fn summary_line(report: &BuildReport) -> String {
    format!(
        "Components: {}, Skipped: {}, Warnings: {}",
        report.manifest.components.len(),
        report.skipped,
        report.warning_count()
    )
}
