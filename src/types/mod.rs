//! @dose
//! purpose: Core data types shared by the extraction engine and the manifest writer.
//!
//! flows:
//!     - Evaluator produces RawFieldValue from AST nodes
//!     - Normalizer turns candidate maps into PropertyDescriptor lists
//!     - Assembler wraps descriptors in a ComponentRecord and appends it to the Manifest

mod component;
mod diagnostic;
mod property;
mod value;

pub use component::{ComponentRecord, Manifest};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use property::{PropType, PropertyDescriptor};
pub use value::{NodeKind, RawFieldValue};
