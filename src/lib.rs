//! @dose
//! purpose: This is the library crate root for prefab-manifest, exposing the extraction engine
//!     for use as both a CLI tool and a library. It re-exports the types and entry points most
//!     consumers need.
//!
//! when-editing:
//!     - !All public modules must be declared here with pub mod
//!     - Keep the re-export list organized by module
//!
//! invariants:
//!     - extract_properties is the whole per-story engine; build_manifest adds discovery
//!       and assembly on top of it
//!
//! gotchas:
//!     - The lib.rs is separate from main.rs - library consumers get lib, CLI gets main

pub mod cli;
pub mod commands;
pub mod component;
pub mod config;
pub mod exclusion;
pub mod extract;
pub mod normalize;
pub mod parser;
pub mod types;

// Re-export main types for convenience
pub use cli::{CheckArgs, Cli, Commands, GenerateArgs, InspectArgs, WatchArgs};
pub use component::{build_manifest, AssembleError, AssembleOptions, BuildReport};
pub use extract::{extract_file, extract_properties, Extraction};
pub use parser::{ParseError, SourceUnit, SourceVariant};
pub use types::{
    ComponentRecord, Diagnostic, DiagnosticKind, Manifest, PropType, PropertyDescriptor,
    RawFieldValue,
};
