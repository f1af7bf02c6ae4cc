//! @dose
//! purpose: This module defines the command-line interface for prefab-manifest using the clap
//!     derive macros. It specifies all commands (generate, inspect, check, watch) and their
//!     arguments.
//!
//! when-editing:
//!     - !Each command struct must derive Args and be added to the Commands enum
//!     - !Global flags (root, verbose, quiet) are defined on Cli and propagate to all subcommands
//!     - Flags that also exist in prefab.toml are Option so an absent flag falls through
//!       to the config value
//!
//! invariants:
//!     - Precedence is CLI flag > prefab.toml > built-in default
//!     - CLI --exclude patterns are appended to the config's exclude list
//!
//! gotchas:
//!     - The --root flag is global but optional; defaults to current directory in main.rs

use crate::component::AssembleOptions;
use crate::config::Config;
use crate::exclusion::ExclusionConfig;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "prefab-manifest")]
#[command(author, version, about = "Extract component props from story files into a prefab manifest")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to project root (defaults to current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the manifest from all story files
    Generate(GenerateArgs),

    /// Print the properties extracted from one story file
    Inspect(InspectArgs),

    /// Check that the manifest on disk is up to date
    Check(CheckArgs),

    /// Watch story files and regenerate the manifest on change
    Watch(WatchArgs),
}

/// Discovery options shared by generate, check and watch
#[derive(Args, Clone, Default)]
pub struct CommonOptions {
    /// Components directory relative to the root [default: components]
    #[arg(long, value_name = "DIR")]
    pub components_dir: Option<PathBuf>,

    /// Manifest file relative to the root [default: wmprefab.config.json]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Exclude files/directories matching glob pattern (can be repeated)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Don't respect .gitignore files
    #[arg(long)]
    pub no_gitignore: bool,
}

impl CommonOptions {
    /// Create an ExclusionConfig from these options, merging with config file patterns
    pub fn exclusion_config(&self, config_patterns: &[String]) -> ExclusionConfig {
        let mut patterns = config_patterns.to_vec();
        patterns.extend(self.exclude.clone());
        ExclusionConfig {
            patterns,
            respect_gitignore: !self.no_gitignore,
        }
    }

    pub fn assemble_options(&self, root: &Path, config: &Config) -> AssembleOptions {
        let components_dir = self
            .components_dir
            .as_ref()
            .unwrap_or(&config.components_dir);
        AssembleOptions {
            components_dir: root.join(components_dir),
            version: config.version.clone(),
            base_dir: config.base_dir.clone(),
            exclusion: self.exclusion_config(&config.exclude),
        }
    }

    pub fn output_path(&self, root: &Path, config: &Config) -> PathBuf {
        root.join(self.output.as_ref().unwrap_or(&config.output))
    }
}

#[derive(Args, Clone, Default)]
pub struct GenerateArgs {
    /// Dry run - print the manifest instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Strict mode - fail when any component was skipped
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Story file to extract
    pub story: PathBuf,
}

#[derive(Args, Default)]
pub struct CheckArgs {
    /// Strict mode - also fail when any component was skipped
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Args, Default)]
pub struct WatchArgs {
    /// Debounce delay in milliseconds
    #[arg(long, default_value_t = 200)]
    pub debounce: u64,

    /// Clear screen before each update
    #[arg(long)]
    pub clear: bool,

    #[command(flatten)]
    pub common: CommonOptions,
}
