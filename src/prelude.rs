//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types from the formdef crate. Import
//! this module to get the core builder, document, and evaluation types
//! without naming each one individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use formdef::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/template.json")?;
//! let template = TdlParser::parse_json(&json)?;
//!
//! let report = TdlValidator::validate_template(&template);
//! println!("valid: {}, warnings: {}", report.valid, report.warnings.len());
//!
//! let mut converter = RenderConverter::new();
//! let gui = converter.convert_to_gui(&template, &ConversionOptions::default());
//! println!("lost features: {}", gui.warnings.len());
//! # Ok(())
//! # }
//! ```

// Building
pub use crate::builder::{
    BuilderOptions, ConditionalBuilder, FieldBuilder, SectionBuilder, TemplateBuilder,
};

// Template model
pub use crate::template::{
    Condition, Field, FieldOption, FieldType, Section, Template, ValidationMode, ValidationRules,
    VisibilityOperator,
};

// Evaluation
pub use crate::condition::ConditionEvaluator;
pub use crate::engine::ControlFlowEngine;
pub use crate::scope::ScopeChain;

// Documents and rendering
pub use crate::document::{TdlParser, TdlValidator, TemplateDocument};
pub use crate::render::{ConversionOptions, GuiTemplate, RenderConverter};

// Error types
pub use crate::error::{BuildError, ControlFlowError, ValidationReport};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
