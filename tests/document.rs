//! Tests for document parsing, serialization, and validation.
mod common;
use common::*;

use formdef::document::{TdlParser, TdlValidator, TemplateDocument};
use formdef::prelude::*;
use formdef::template::{ArraySource, LayoutMode, SpacingMode, ValidationMode};

#[test]
fn test_parse_fills_documented_defaults() {
    let template = TdlParser::parse_json(SAMPLE_DOCUMENT_JSON).expect("valid document");

    assert_eq!(template.metadata.name, "Machine Checklist");
    assert_eq!(template.metadata.version, "1.2.0");
    assert_eq!(template.metadata.author, "qa");
    // Omitted configuration falls back to documented defaults.
    assert_eq!(template.schema.validation, ValidationMode::Loose);
    assert_eq!(template.styling.theme, "default");
    assert_eq!(template.styling.layout, LayoutMode::Fluid);
    assert_eq!(template.styling.spacing, SpacingMode::Normal);
    assert!(!template.behavior.auto_save);
    assert!(!template.behavior.show_progress);
}

#[test]
fn test_parse_control_flow_and_conditionals() {
    let template = TdlParser::parse_json(SAMPLE_DOCUMENT_JSON).expect("valid document");

    let overview = template.section("overview").expect("section exists");
    assert!(overview.fields[1].conditional.is_some());

    let machines = template.section("machines").expect("section exists");
    let control_flow = machines.control_flow.as_ref().expect("forEach loop");
    let for_each = control_flow.for_each.as_ref().expect("forEach clause");
    assert!(matches!(&for_each.array, ArraySource::Name(name) if name == "machines"));
    assert_eq!(for_each.variable, "machine");
    assert_eq!(for_each.body.len(), 1);
}

#[test]
fn test_parse_unknown_field_type_degrades_to_text() {
    init_logging();
    let json = r#"{
      "metadata": { "name": "Odd" },
      "sections": [
        {
          "id": "s",
          "title": "S",
          "fields": [{ "id": "f", "type": "hologram", "label": "F" }]
        }
      ]
    }"#;
    let template = TdlParser::parse_json(json).expect("parses despite unknown type");
    assert_eq!(template.fields().next().expect("field").field_type, FieldType::Text);
}

#[test]
fn test_parse_json_rejects_malformed_input() {
    assert!(TdlParser::parse_json("not json at all").is_err());
    assert!(TdlParser::parse_json("{\"sections\": []}").is_err());
}

#[test]
fn test_round_trip_preserves_structure() {
    let template = create_sample_template();

    let json = TdlParser::to_json_pretty(&template).expect("serializes");
    let parsed = TdlParser::parse_json(&json).expect("parses back");

    assert_eq!(parsed.metadata.name, template.metadata.name);
    assert_eq!(parsed.metadata.version, template.metadata.version);
    assert_eq!(parsed.sections.len(), template.sections.len());
    assert_eq!(parsed.field_count(), template.field_count());

    for (before, after) in template.fields().zip(parsed.fields()) {
        assert_eq!(before.id, after.id);
        assert_eq!(before.field_type, after.field_type);
        assert_eq!(before.required, after.required);
    }
}

#[test]
fn test_serialize_omits_defaults() {
    let template = create_sample_template();
    let document = TdlParser::serialize(&template);

    assert!(document.schema.is_none());
    assert!(document.behavior.is_none());
    assert!(document.styling.is_none());
}

#[test]
fn test_validate_document_accepts_sample() {
    let document: TemplateDocument =
        serde_json::from_str(SAMPLE_DOCUMENT_JSON).expect("deserializes");
    let report = TdlValidator::validate_document(&document);
    assert!(report.valid, "unexpected errors: {}", report.error_summary());
}

#[test]
fn test_validate_document_flags_duplicates() {
    let json = r#"{
      "metadata": { "name": "Dups", "version": "1.0.0" },
      "sections": [
        {
          "id": "a",
          "title": "A",
          "fields": [
            { "id": "f1", "type": "text", "label": "One" },
            { "id": "f1", "type": "text", "label": "Two" }
          ]
        },
        { "id": "a", "title": "A again" }
      ]
    }"#;
    let document: TemplateDocument = serde_json::from_str(json).expect("deserializes");
    let report = TdlValidator::validate_document(&document);

    assert!(!report.valid);
    assert!(report
        .errors
        .iter()
        .any(|e| e.message.contains("Duplicate section ID: a")));
    assert!(report
        .errors
        .iter()
        .any(|e| e.message.contains("Duplicate field ID: f1")));
}

#[test]
fn test_validate_document_warns_on_missing_metadata_and_options() {
    let json = r#"{
      "metadata": { "name": "Bare" },
      "sections": [
        {
          "id": "s",
          "title": "S",
          "fields": [{ "id": "choice", "type": "select", "label": "Pick" }]
        }
      ]
    }"#;
    let document: TemplateDocument = serde_json::from_str(json).expect("deserializes");
    let report = TdlValidator::validate_document(&document);

    assert!(report.valid);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.message.contains("version")));
    assert!(report
        .warnings
        .iter()
        .any(|w| w.message.contains("should have options")));
}

#[test]
fn test_validate_document_warns_on_unknown_dependency() {
    let json = r#"{
      "metadata": { "name": "Refs", "version": "1.0.0", "author": "qa", "description": "d" },
      "sections": [
        {
          "id": "s",
          "title": "S",
          "fields": [
            {
              "id": "f",
              "type": "text",
              "label": "F",
              "conditional": { "dependsOn": "nonexistent", "operator": "equals", "values": ["x"] }
            }
          ]
        }
      ]
    }"#;
    let document: TemplateDocument = serde_json::from_str(json).expect("deserializes");
    let report = TdlValidator::validate_document(&document);

    // Dangling references warn rather than error.
    assert!(report.valid);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.message.contains("unknown field: nonexistent")));
}

#[test]
fn test_validate_template_flags_control_flow_problems() {
    let json = r#"{
      "metadata": { "name": "Broken" },
      "sections": [
        {
          "id": "s",
          "title": "S",
          "controlFlow": {
            "forEach": { "array": "items", "variable": "", "do": [] }
          }
        }
      ]
    }"#;
    let template = TdlParser::parse_json(json).expect("parses");
    let report = TdlValidator::validate_template(&template);
    assert!(!report.valid);
}
