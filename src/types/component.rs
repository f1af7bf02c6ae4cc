//! @dose
//! purpose: Manifest-level records. A ComponentRecord describes one component directory and
//!     the Manifest is the `{ "components": [...] }` document written for prefab packaging.
//!
//! invariants:
//!     - Field order is fixed by declaration order so output is snapshot-stable
//!     - name is lower-case and URL-safe; the download affordance fetches `<name>.zip`

use crate::types::PropertyDescriptor;
use serde::{Deserialize, Serialize};

/// One discovered component and its normalized properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub name: String,
    pub version: String,
    pub display_name: String,
    pub base_dir: String,
    /// Module reference, e.g. `require('./Button/Button.tsx').default`
    pub module: String,
    pub include: Vec<String>,
    pub props: Vec<PropertyDescriptor>,
    /// Packaging dependencies; filled in by downstream tooling
    #[serde(default)]
    pub packages: Vec<String>,
}

/// The aggregate manifest document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub components: Vec<ComponentRecord>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ComponentRecord) {
        self.components.push(record);
    }

    pub fn get(&self, name: &str) -> Option<&ComponentRecord> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Pretty-printed JSON with two-space indentation and a trailing newline.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
