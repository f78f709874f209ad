//! End-to-end tests covering the build, serialize, parse, validate, and
//! render pipeline working together.
mod common;

mod integration_tests {
    use crate::common::*;
    use chrono::Utc;
    use formdef::document::{TdlParser, TdlValidator, ValidationDocument};
    use formdef::engine::ControlFlowEngine;
    use formdef::prelude::*;
    use formdef::render::{Complexity, GuiField, GuiFieldType, GuiSection};
    use formdef::scope::ScopeChain;
    use formdef::template::{FieldOption, SingleCondition, TemplateAction, VisibilityCondition};

    fn gui_with_fields(count: usize) -> GuiTemplate {
        GuiTemplate {
            id: "gui_1".to_string(),
            name: "Synthetic".to_string(),
            description: String::new(),
            sections: vec![GuiSection {
                id: "s".to_string(),
                title: "S".to_string(),
                fields: (0..count)
                    .map(|i| GuiField {
                        id: format!("f{}", i),
                        label: format!("Field {}", i),
                        ..GuiField::default()
                    })
                    .collect(),
                conditional: None,
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_serialize_parse_validate_round_trip() {
        let template = create_sample_template();

        let json = TdlParser::to_json_pretty(&template).expect("serializes");
        let parsed = TdlParser::parse_json(&json).expect("parses back");

        let report = TdlValidator::validate_template(&parsed);
        assert!(report.valid, "unexpected errors: {}", report.error_summary());
        assert_eq!(parsed.metadata.name, "Sample Report");
        assert_eq!(parsed.field_count(), 3);
    }

    #[test]
    fn test_document_control_flow_executes() {
        let template = TdlParser::parse_json(SAMPLE_DOCUMENT_JSON).expect("valid document");

        let scopes = ScopeChain::with_variables(template.variables.clone());
        let mut engine = ControlFlowEngine::new(scopes);

        let config = template
            .section("machines")
            .and_then(|s| s.control_flow.as_ref())
            .expect("forEach control flow");
        let actions = engine.process_control_flow(config).expect("loop runs");

        // One checkbox per entry in the machines variable.
        assert_eq!(actions.len(), 2);
        assert!(actions
            .iter()
            .all(|a| matches!(a, TemplateAction::CreateField(_))));
    }

    #[test]
    fn test_convert_to_gui_skips_control_flow_by_default() {
        let template = TdlParser::parse_json(SAMPLE_DOCUMENT_JSON).expect("valid document");

        let mut converter = RenderConverter::new();
        let result = converter.convert_to_gui(&template, &ConversionOptions::default());

        assert!(result.success);
        let gui = result.result.expect("gui template");
        assert_eq!(gui.sections.len(), 1);
        assert_eq!(gui.sections[0].title, "Overview");
        assert!(gui.id.starts_with("template_"));

        let warnings: Vec<&str> = result.warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(warnings.iter().any(|w| w.contains("'Machines'")));
        assert!(warnings.iter().any(|w| w.contains("variables will be lost")));
        assert!(warnings.iter().any(|w| w.contains("Control flow logic will be lost")));
    }

    #[test]
    fn test_convert_to_gui_preserve_ids_keeps_everything_named() {
        let template = TdlParser::parse_json(SAMPLE_DOCUMENT_JSON).expect("valid document");

        let mut converter = RenderConverter::new();
        let options = ConversionOptions {
            preserve_ids: true,
            include_control_flow: true,
            ..ConversionOptions::default()
        };
        let result = converter.convert_to_gui(&template, &options);

        let gui = result.result.expect("gui template");
        assert_eq!(gui.sections.len(), 2);
        assert_eq!(gui.sections[0].id, "overview");
        assert_eq!(gui.sections[1].id, "machines");
        assert_eq!(gui.sections[0].fields[0].id, "operator");
    }

    #[test]
    fn test_range_fields_render_as_numbers() {
        let template = TemplateBuilder::default()
            .create("Sliders")
            .section("S")
            .field(FieldType::Range, "Loudness")
            .expect("section is open")
            .end()
            .end()
            .build()
            .expect("builds");

        let mut converter = RenderConverter::new();
        let result = converter.convert_to_gui(&template, &ConversionOptions::default());
        let gui = result.result.expect("gui template");

        assert_eq!(gui.sections[0].fields[0].field_type, GuiFieldType::Number);
    }

    #[test]
    fn test_convert_from_gui_generates_metadata_and_schema() {
        let mut gui = gui_with_fields(0);
        gui.sections = vec![
            GuiSection {
                id: "uploads".to_string(),
                title: "Uploads".to_string(),
                fields: vec![
                    GuiField {
                        id: "doc".to_string(),
                        field_type: GuiFieldType::File,
                        label: "Document".to_string(),
                        required: true,
                        ..GuiField::default()
                    },
                    GuiField {
                        id: "when".to_string(),
                        field_type: GuiFieldType::Date,
                        label: "When".to_string(),
                        ..GuiField::default()
                    },
                ],
                conditional: None,
            },
            GuiSection {
                id: "choices".to_string(),
                title: "Choices".to_string(),
                fields: vec![GuiField {
                    id: "pick".to_string(),
                    field_type: GuiFieldType::Select,
                    label: "Pick".to_string(),
                    options: vec![FieldOption::from("a"), FieldOption::from("b")],
                    ..GuiField::default()
                }],
                conditional: None,
            },
        ];

        let mut converter = RenderConverter::new();
        let options = ConversionOptions {
            preserve_ids: true,
            generate_metadata: true,
            strict: true,
            ..ConversionOptions::default()
        };
        let result = converter.convert_from_gui(&gui, &options);

        let template = result.result.expect("template");
        assert_eq!(template.metadata.author, "gui-converter");
        assert_eq!(template.schema.validation, ValidationMode::Strict);
        assert_eq!(template.schema.required_fields, vec!["doc".to_string()]);

        let tags = &template.metadata.tags;
        for expected in [
            "converted",
            "gui",
            "file-upload",
            "date-input",
            "multiple-choice",
            "multi-section",
            "simple",
        ] {
            assert!(tags.iter().any(|t| t == expected), "missing tag {}", expected);
        }
    }

    #[test]
    fn test_check_compatibility_flags_awkward_fields() {
        let mut gui = gui_with_fields(1);
        gui.sections[0].fields[0].validation = Some(ValidationDocument {
            pattern: Some("x".repeat(60)),
            ..ValidationDocument::default()
        });
        gui.sections[0].fields.push(GuiField {
            id: "many".to_string(),
            field_type: GuiFieldType::Select,
            label: "Many".to_string(),
            options: (0..25)
                .map(|i| FieldOption::from(format!("option {}", i)))
                .collect(),
            ..GuiField::default()
        });

        let report = RenderConverter::check_compatibility(&gui);
        assert!(!report.compatible);
        assert_eq!(report.issues.len(), 2);
        assert!(report.issues[0].contains("complex validation pattern"));
        assert!(report.issues[1].contains("many options (25)"));

        let clean = RenderConverter::check_compatibility(&gui_with_fields(2));
        assert!(clean.compatible);
    }

    #[test]
    fn test_conversion_stats_complexity_buckets() {
        assert_eq!(
            RenderConverter::conversion_stats(&gui_with_fields(12)).complexity,
            Complexity::High
        );
        assert_eq!(
            RenderConverter::conversion_stats(&gui_with_fields(6)).complexity,
            Complexity::Medium
        );

        let mut small = gui_with_fields(3);
        small.sections[0].fields[0].conditional = Some(VisibilityCondition::Single(
            SingleCondition::new("f1", VisibilityOperator::Equals, vec!["x".to_string()]),
        ));
        let stats = RenderConverter::conversion_stats(&small);
        assert_eq!(stats.complexity, Complexity::Low);
        assert_eq!(stats.fields, 3);
        assert_eq!(stats.conditional_fields, 1);
        assert_eq!(stats.conditional_sections, 0);
    }
}
