//! Tests for the fluent builder and its eager control flow.
mod common;
use common::*;

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use formdef::error::BuildError;
use formdef::prelude::*;
use formdef::template::ContextPredicate;
use serde_json::json;

#[test]
fn test_builder_assembles_metadata_and_structure() {
    let template = create_sample_template();

    assert_eq!(template.metadata.name, "Sample Report");
    assert_eq!(template.metadata.version, "2.0.0");
    assert_eq!(template.sections.len(), 2);
    assert_eq!(template.field_count(), 3);

    let general = &template.sections[0];
    assert_eq!(general.title, "General");
    assert!(general.fields[0].required);
    assert_eq!(general.fields[1].field_type, FieldType::Number);
}

#[test]
fn test_generated_ids_are_deterministic_and_unique() {
    let template = create_sample_template();

    assert_eq!(template.sections[0].id, "section_1");
    assert_eq!(template.sections[1].id, "section_2");

    let mut ids: Vec<&str> = template.fields().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["field_1", "field_2", "field_3"]);
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn test_field_without_section_fails_before_mutation() {
    let result = TemplateBuilder::default().field(FieldType::Text, "Orphan");
    match result {
        Err(BuildError::NoActiveSection { label }) => assert_eq!(label, "Orphan"),
        other => panic!("expected NoActiveSection, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_strict_build_fails_on_validation_errors() {
    let options = BuilderOptions {
        strict: true,
        validate_on_build: true,
        default_required: false,
    };
    // No name set, which is a validation error.
    let result = TemplateBuilder::new(options).section("Only").end().build();
    assert!(matches!(result, Err(BuildError::ValidationFailed(_))));
}

#[test]
fn test_lenient_build_succeeds_with_warnings() {
    // Empty sections only warn; the default options still build.
    let template = TemplateBuilder::default()
        .create("Sparse")
        .section("Empty")
        .end()
        .build()
        .expect("lenient build succeeds");
    assert_eq!(template.sections.len(), 1);
}

#[test]
fn test_for_each_literal_array() {
    let items = vec![json!("press"), json!("lathe"), json!("mill")];
    let template = TemplateBuilder::default()
        .create("Machines")
        .for_each(items, |builder, item, index| {
            let title = format!("{} ({})", item.as_str().unwrap_or("?"), index);
            builder.section(title).end()
        })
        .expect("loop within ceiling")
        .build()
        .expect("builds");

    assert_eq!(template.sections.len(), 3);
    assert_eq!(template.sections[0].title, "press (0)");
    assert_eq!(template.sections[2].title, "mill (2)");
}

#[test]
fn test_for_each_named_array_resolves_variables() {
    let mut variables = ahash::AHashMap::new();
    variables.insert("lines".to_string(), json!(["A", "B"]));

    let template = TemplateBuilder::default()
        .create("Lines")
        .variables(variables)
        .for_each("lines", |builder, item, _| {
            builder.section(item.as_str().unwrap_or("?").to_string()).end()
        })
        .expect("loop within ceiling")
        .build()
        .expect("builds");

    assert_eq!(template.sections.len(), 2);
}

#[test]
fn test_for_each_non_array_is_noop() {
    let mut variables = ahash::AHashMap::new();
    variables.insert("lines".to_string(), json!("not an array"));

    let template = TemplateBuilder::default()
        .create("Lines")
        .variables(variables)
        .for_each("lines", |builder, _, _| builder)
        .expect("noop loop")
        .build()
        .expect("builds");

    assert!(template.sections.is_empty());
}

#[test]
fn test_repeat_binds_index() {
    let template = TemplateBuilder::default()
        .create("Shifts")
        .repeat(3, |builder, index| {
            builder.section(format!("Shift {}", index + 1)).end()
        })
        .expect("loop within ceiling")
        .build()
        .expect("builds");

    assert_eq!(template.sections.len(), 3);
    assert_eq!(template.sections[1].title, "Shift 2");
}

#[test]
fn test_negative_repeat_is_noop() {
    let template = TemplateBuilder::default()
        .create("Empty")
        .repeat(-2, |builder, _| builder)
        .expect("noop loop")
        .build()
        .expect("builds");
    assert!(template.sections.is_empty());
}

#[test]
fn test_while_loop_runs_until_condition_fails() {
    let counter = Arc::new(AtomicI64::new(0));
    let check = Arc::clone(&counter);

    let template = TemplateBuilder::default()
        .create("Bounded")
        .while_loop(
            Condition::Function(ContextPredicate::new(move |_| {
                check.load(Ordering::SeqCst) < 4
            })),
            move |builder| {
                counter.fetch_add(1, Ordering::SeqCst);
                builder.section("Pass").end()
            },
        )
        .expect("loop terminates")
        .build()
        .expect("builds");

    assert_eq!(template.sections.len(), 4);
}

#[test]
fn test_while_loop_ceiling_is_fatal() {
    let result = TemplateBuilder::default()
        .create("Runaway")
        .with_max_iterations(10)
        .while_loop(
            Condition::Function(ContextPredicate::new(|_| true)),
            |builder| builder,
        );
    assert!(matches!(
        result,
        Err(BuildError::ControlFlow(
            ControlFlowError::IterationLimitExceeded { limit: 10 }
        ))
    ));
}

#[test]
fn test_when_then_runs_on_truthy_condition() {
    let mut variables = ahash::AHashMap::new();
    variables.insert("include_extras".to_string(), json!(true));

    let template = TemplateBuilder::default()
        .create("Conditional")
        .variables(variables)
        .when("include_extras")
        .then(|b| b.section("Extras").end())
        .endif()
        .build()
        .expect("builds");

    assert_eq!(template.sections.len(), 1);
    assert_eq!(template.sections[0].title, "Extras");
}

#[test]
fn test_otherwise_runs_without_else_if_branches() {
    let template = TemplateBuilder::default()
        .create("Conditional")
        .when("missing_flag")
        .then(|b| b.section("Then").end())
        .otherwise(|b| b.section("Otherwise").end())
        .endif()
        .build()
        .expect("builds");

    assert_eq!(template.sections.len(), 1);
    assert_eq!(template.sections[0].title, "Otherwise");
}

#[test]
fn test_otherwise_is_skipped_when_else_if_present() {
    // With an elseIf branch declared, a fully failed chain falls through to
    // nothing. The fallback only fires when no elseIf exists at all.
    let template = TemplateBuilder::default()
        .create("Conditional")
        .when("missing_flag")
        .then(|b| b.section("Then").end())
        .else_if("other_missing_flag")
        .then(|b| b.section("ElseIf").end())
        .otherwise(|b| b.section("Otherwise").end())
        .endif()
        .build()
        .expect("builds");

    assert!(template.sections.is_empty());
}

#[test]
fn test_else_if_branch_matches() {
    let mut variables = ahash::AHashMap::new();
    variables.insert("tier".to_string(), json!("silver"));

    let template = TemplateBuilder::default()
        .create("Tiers")
        .variables(variables)
        .when("tier == 'gold'")
        .then(|b| b.section("Gold").end())
        .else_if("tier == 'silver'")
        .then(|b| b.section("Silver").end())
        .endif()
        .build()
        .expect("builds");

    assert_eq!(template.sections.len(), 1);
    assert_eq!(template.sections[0].title, "Silver");
}

#[test]
fn test_section_and_field_customization() {
    let template = TemplateBuilder::default()
        .create("Custom")
        .section("Contact")
        .id("contact")
        .naable()
        .field(FieldType::Email, "Email")
        .expect("section is open")
        .id("email")
        .placeholder("name@example.com")
        .max_length(120)
        .conditional("has_email", VisibilityOperator::Equals, vec!["yes".into()])
        .end()
        .end()
        .build()
        .expect("builds");

    let section = template.section("contact").expect("custom section id");
    assert!(section.naable);
    let field = section.field("email").expect("custom field id");
    assert_eq!(field.placeholder.as_deref(), Some("name@example.com"));
    assert_eq!(
        field.validation.as_ref().and_then(|v| v.max_length),
        Some(120)
    );
    assert!(field.conditional.is_some());
}

#[test]
fn test_behavior_and_styling_options() {
    use formdef::template::{LayoutMode, StylingPatch};

    let template = TemplateBuilder::default()
        .create("Styled")
        .auto_save(30)
        .show_progress()
        .styling(StylingPatch {
            theme: Some("dark".to_string()),
            layout: Some(LayoutMode::Fixed),
            ..StylingPatch::default()
        })
        .build()
        .expect("builds");

    assert!(template.behavior.auto_save);
    assert_eq!(template.behavior.auto_save_interval, Some(30));
    assert!(template.behavior.show_progress);
    assert_eq!(template.styling.theme, "dark");
    assert_eq!(template.styling.layout, LayoutMode::Fixed);
}

#[test]
fn test_extend_copies_parent_sections_and_variables() {
    let parent = create_sample_template();

    let child = TemplateBuilder::default()
        .create("Child Report")
        .extend(&parent)
        .section("Additions")
        .end()
        .build()
        .expect("builds");

    assert_eq!(child.metadata.extends.as_deref(), Some("Sample Report"));
    assert_eq!(child.sections.len(), 3);
}
