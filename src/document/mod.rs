//! The portable document format.
//!
//! Documents are the serialized face of a template: plain serde structs with
//! camelCase keys, everything beyond identity fields optional. The parser
//! turns documents into [`crate::template::Template`]s (total, filling
//! defaults) and back (omitting defaults); the validator reports structural
//! and cross-reference problems without ever failing hard.

mod parser;
mod types;
mod validator;

pub use parser::TdlParser;
pub use types::{
    ActionDocument, ActionPayload, BehaviorDocument, ControlFlowDocument, CountDocument,
    ElseDocument, FieldDocument, ForEachDocument, IfBranchDocument, MetadataDocument,
    RepeatDocument, SchemaDocument, SectionDocument, StylingDocument, TemplateDocument,
    ValidationDocument, WhileDocument,
};
pub use validator::TdlValidator;
