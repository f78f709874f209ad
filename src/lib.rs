//! # Formdef - Declarative Form-Template Definition Engine
//!
//! **Formdef** builds, evaluates, and exchanges form templates. Templates are
//! assembled programmatically through a fluent builder, stored and exchanged
//! as portable JSON documents, and rendered through a deliberately flat GUI
//! model. Conditions, variables, and bounded loops let one template describe
//! many concrete forms.
//!
//! ## Core Workflow
//!
//! 1.  **Build**: Use [`builder::TemplateBuilder`] to assemble a template,
//!     with eager loops and conditionals that run at construction time.
//! 2.  **Exchange**: Serialize to and parse from portable documents with
//!     [`document::TdlParser`], and check them with
//!     [`document::TdlValidator`].
//! 3.  **Execute**: Let [`engine::ControlFlowEngine`] expand the declarative
//!     control flow carried by document templates.
//! 4.  **Render**: Convert to the GUI model with [`render::RenderConverter`],
//!     accepting the documented losses.
//!
//! ## Quick Start
//!
//! ```rust
//! use formdef::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let mut variables = ahash::AHashMap::new();
//!     variables.insert("show_contact".to_string(), json!(true));
//!
//!     let template = TemplateBuilder::default()
//!         .create("Inspection Report")
//!         .description("Daily line inspection")
//!         .author("qa-team")
//!         .variables(variables)
//!         .section("General")
//!         .field(FieldType::Text, "Inspector name")?
//!         .required()
//!         .end()
//!         .end()
//!         .when("show_contact")
//!         .then(|b| b.section("Contact").end())
//!         .endif()
//!         .build()?;
//!
//!     assert_eq!(template.sections.len(), 2);
//!
//!     // Round-trip through the document format.
//!     let json = TdlParser::to_json_pretty(&template)?;
//!     let parsed = TdlParser::parse_json(&json)?;
//!     assert_eq!(parsed.metadata.name, "Inspection Report");
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod condition;
pub mod document;
pub mod engine;
pub mod error;
pub mod expr;
pub mod prelude;
pub mod render;
pub mod scope;
pub mod template;
