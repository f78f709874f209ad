//! The in-memory template tree: metadata, sections, fields, conditions and
//! declarative control flow.
//!
//! A [`Template`] is built once per builder session and is immutable data
//! afterwards; consumers copy on write when editing. Conditions and control
//! flow are owned by the section or field that carries them.

pub mod condition;
pub mod config;
pub mod control_flow;
pub mod field;
pub mod section;

pub use condition::*;
pub use config::*;
pub use control_flow::*;
pub use field::*;
pub use section::*;

use ahash::AHashMap;
use serde_json::Value;

/// The full form definition tree.
#[derive(Debug, Clone, Default)]
pub struct Template {
    pub metadata: TemplateMetadata,
    pub schema: TemplateSchema,
    pub sections: Vec<Section>,
    pub styling: StylingConfig,
    pub behavior: BehaviorConfig,
    /// Free-form named values available to conditions and loops. Not
    /// schema-checked.
    pub variables: AHashMap<String, Value>,
}

impl Template {
    /// Looks up a section by id.
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Iterates every field in document order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    /// Total field count across all sections.
    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.fields.len()).sum()
    }
}
