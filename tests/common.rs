//! Common test utilities for building templates and documents.
use formdef::prelude::*;
use serde_json::json;

/// Routes `log` output through env_logger so warn-path tests can be
/// inspected with `RUST_LOG=formdef=warn`.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds a small two-section template through the fluent builder.
///
/// Section "General" carries a required text field and a number field;
/// section "Ratings" carries a select field with options.
#[allow(dead_code)]
pub fn create_sample_template() -> Template {
    TemplateBuilder::default()
        .create("Sample Report")
        .description("A small template for tests")
        .version("2.0.0")
        .author("tests")
        .tags(["sample"])
        .section("General")
        .field(FieldType::Text, "Inspector name")
        .expect("section is open")
        .required()
        .field(FieldType::Number, "Line number")
        .expect("section is open")
        .end()
        .end()
        .section("Ratings")
        .field(FieldType::Select, "Overall rating")
        .expect("section is open")
        .options(["good", "acceptable", "bad"])
        .end()
        .end()
        .build()
        .expect("sample template builds")
}

/// A minimal document with most defaults left out, one forEach loop, and a
/// conditional field.
#[allow(dead_code)]
pub const SAMPLE_DOCUMENT_JSON: &str = r#"{
  "metadata": {
    "name": "Machine Checklist",
    "version": "1.2.0",
    "author": "qa"
  },
  "variables": {
    "machines": ["press", "lathe"]
  },
  "sections": [
    {
      "id": "overview",
      "title": "Overview",
      "fields": [
        { "id": "operator", "type": "text", "label": "Operator", "required": true },
        {
          "id": "shift_notes",
          "type": "textarea",
          "label": "Shift notes",
          "conditional": { "dependsOn": "operator", "operator": "not_equals", "values": [""] }
        }
      ]
    },
    {
      "id": "machines",
      "title": "Machines",
      "controlFlow": {
        "forEach": {
          "array": "machines",
          "variable": "machine",
          "do": [
            { "id": "machine_ok", "type": "checkbox", "label": "Machine OK" }
          ]
        }
      }
    }
  ]
}"#;

/// Scope chain preloaded with the bindings the condition truth-table tests
/// expect.
#[allow(dead_code)]
pub fn create_sample_scopes() -> ScopeChain {
    let mut scopes = ScopeChain::new();
    scopes.set_variable("age", json!(18));
    scopes.set_variable("age_text", json!("17"));
    scopes.set_variable("tags", json!(["vip", "beta"]));
    scopes.set_variable("status", json!("active"));
    scopes.set_variable("enabled", json!(true));
    scopes
}
