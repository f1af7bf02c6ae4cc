//! @dose
//! purpose: Implements the inspect command: extracts one story file and prints its normalized
//!     property list as JSON, without looking for a sibling or touching the manifest.
//!
//! invariants:
//!     - A syntax error fails the command; unsupported values are logged as warnings

use crate::cli::InspectArgs;
use crate::extract::extract_file;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

pub fn run_inspect(args: &InspectArgs, root: &Path) -> Result<()> {
    let path = if args.story.is_absolute() {
        args.story.clone()
    } else {
        root.join(&args.story)
    };

    let extraction =
        extract_file(&path).with_context(|| format!("Failed to extract {}", path.display()))?;

    for diagnostic in &extraction.diagnostics {
        warn!("{}", diagnostic);
    }

    let json = serde_json::to_string_pretty(&extraction.properties)
        .context("Failed to serialize properties")?;
    println!("{}", json);
    Ok(())
}
