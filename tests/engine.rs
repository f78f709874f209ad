//! Tests for the declarative control-flow engine.
mod common;

use formdef::engine::ControlFlowEngine;
use formdef::error::ControlFlowError;
use formdef::template::{
    ArraySource, ComparisonOp, Condition, ConditionalBlock, ContextPredicate, ControlFlowConfig,
    CountSource, ElseIfBranch, Field, FieldType, ForEachClause, LoopBlock, LoopKind,
    TemplateAction, WhileClause,
};
use serde_json::json;

fn create_field_action(id: &str) -> TemplateAction {
    TemplateAction::CreateField(Field::new(id, FieldType::Text, id))
}

fn field_ids(actions: &[TemplateAction]) -> Vec<String> {
    actions
        .iter()
        .filter_map(|action| match action {
            TemplateAction::CreateField(field) => Some(field.id.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_conditional_then_branch() {
    let mut engine = ControlFlowEngine::default();
    engine.scopes_mut().set_variable("ready", json!(true));

    let mut block = ConditionalBlock::new(Condition::Variable("ready".to_string()));
    block.then = vec![create_field_action("then_field")];
    block.else_actions = Some(vec![create_field_action("else_field")]);

    let actions = engine.execute_conditional(&block).expect("executes");
    assert_eq!(field_ids(&actions), vec!["then_field"]);
}

#[test]
fn test_conditional_else_without_else_if() {
    let mut engine = ControlFlowEngine::default();

    let mut block = ConditionalBlock::new(Condition::Variable("missing".to_string()));
    block.then = vec![create_field_action("then_field")];
    block.else_actions = Some(vec![create_field_action("else_field")]);

    let actions = engine.execute_conditional(&block).expect("executes");
    assert_eq!(field_ids(&actions), vec!["else_field"]);
}

#[test]
fn test_else_is_unreachable_when_else_if_present() {
    // A present elseIf vector consumes the failure path; the else branch
    // only fires when no elseIf vector exists at all.
    let mut engine = ControlFlowEngine::default();

    let mut block = ConditionalBlock::new(Condition::Variable("missing".to_string()));
    block.then = vec![create_field_action("then_field")];
    block.else_if = Some(vec![ElseIfBranch {
        condition: Condition::Variable("also_missing".to_string()),
        then: vec![create_field_action("else_if_field")],
    }]);
    block.else_actions = Some(vec![create_field_action("else_field")]);

    let actions = engine.execute_conditional(&block).expect("executes");
    assert!(actions.is_empty());
}

#[test]
fn test_first_matching_else_if_wins() {
    let mut engine = ControlFlowEngine::default();
    engine.scopes_mut().set_variable("tier", json!("silver"));

    let comparison = |value: &str| Condition::Comparison {
        variable: "tier".to_string(),
        operator: ComparisonOp::Eq,
        value: json!(value),
    };

    let mut block = ConditionalBlock::new(comparison("gold"));
    block.then = vec![create_field_action("gold_field")];
    block.else_if = Some(vec![
        ElseIfBranch {
            condition: comparison("silver"),
            then: vec![create_field_action("silver_field")],
        },
        ElseIfBranch {
            condition: comparison("silver"),
            then: vec![create_field_action("duplicate_field")],
        },
    ]);

    let actions = engine.execute_conditional(&block).expect("executes");
    assert_eq!(field_ids(&actions), vec!["silver_field"]);
}

#[test]
fn test_for_each_binds_item_index_length() {
    let mut engine = ControlFlowEngine::default();
    engine
        .scopes_mut()
        .set_variable("machines", json!(["press", "lathe"]));

    let block = LoopBlock {
        kind: LoopKind::ForEach,
        array: Some(ArraySource::Name("machines".to_string())),
        count: None,
        condition: None,
        variable: Some("machine".to_string()),
        body: vec![create_field_action("check")],
    };

    let actions = engine.execute_loop(&block).expect("executes");
    assert_eq!(actions.len(), 2);
    // Loop bindings live in the loop scope and are gone afterwards.
    assert!(engine.scopes().get_variable("machine").is_none());
}

#[test]
fn test_for_each_non_array_yields_nothing() {
    common::init_logging();
    let mut engine = ControlFlowEngine::default();
    engine.scopes_mut().set_variable("machines", json!(42));

    let block = LoopBlock {
        kind: LoopKind::ForEach,
        array: Some(ArraySource::Name("machines".to_string())),
        count: None,
        condition: None,
        variable: Some("machine".to_string()),
        body: vec![create_field_action("check")],
    };

    let actions = engine.execute_loop(&block).expect("degrades");
    assert!(actions.is_empty());
}

#[test]
fn test_for_each_missing_array_is_an_error() {
    let mut engine = ControlFlowEngine::default();
    let block = LoopBlock {
        kind: LoopKind::ForEach,
        array: None,
        count: None,
        condition: None,
        variable: None,
        body: vec![],
    };
    assert!(matches!(
        engine.execute_loop(&block),
        Err(ControlFlowError::MissingLoopProperty { .. })
    ));
}

#[test]
fn test_repeat_with_expression_count() {
    let mut engine = ControlFlowEngine::default();
    engine.scopes_mut().set_variable("shifts", json!(3));

    let block = LoopBlock {
        kind: LoopKind::Repeat,
        array: None,
        count: Some(CountSource::Expression("shifts".to_string())),
        condition: None,
        variable: Some("shift".to_string()),
        body: vec![create_field_action("shift_check")],
    };

    let actions = engine.execute_loop(&block).expect("executes");
    assert_eq!(actions.len(), 3);
}

#[test]
fn test_negative_repeat_count_yields_nothing() {
    let mut engine = ControlFlowEngine::default();
    let block = LoopBlock {
        kind: LoopKind::Repeat,
        array: None,
        count: Some(CountSource::Literal(-1)),
        condition: None,
        variable: None,
        body: vec![create_field_action("never")],
    };
    let actions = engine.execute_loop(&block).expect("degrades");
    assert!(actions.is_empty());
}

#[test]
fn test_while_loop_and_set_variable() {
    // The while body counts down through setVariable actions; the condition
    // re-reads the binding each pass.
    let mut engine = ControlFlowEngine::default();
    engine.scopes_mut().set_variable("remaining", json!(3));

    let condition = Condition::Function(ContextPredicate::new(|scopes| {
        scopes
            .get_variable("remaining")
            .map(|v| formdef::expr::to_number(&v) > 0.0)
            .unwrap_or(false)
    }));

    // remaining starts at 3; each pass emits a field and decrements by
    // rebinding to iteration-dependent values is awkward without functions,
    // so use a registered function instead.
    engine.scopes_mut().register_function(
        "decrement",
        std::sync::Arc::new(|args: &[serde_json::Value]| {
            json!(formdef::expr::to_number(args.first().unwrap_or(&json!(0))) - 1.0)
        }),
    );

    let block = LoopBlock {
        kind: LoopKind::While,
        array: None,
        count: None,
        condition: Some(condition),
        variable: None,
        body: vec![
            create_field_action("pass"),
            TemplateAction::CallFunction {
                name: "decrement".to_string(),
                args: vec![json!(0)],
                return_variable: None,
            },
            TemplateAction::SetVariable {
                name: "remaining".to_string(),
                value: json!(0),
            },
        ],
    };

    let actions = engine.execute_loop(&block).expect("terminates");
    assert_eq!(actions.len(), 1);
}

#[test]
fn test_iteration_ceiling_is_exact() {
    // A ceiling of N allows exactly N iterations and fails on the next.
    let body = vec![create_field_action("pass")];

    let within = LoopBlock {
        kind: LoopKind::Repeat,
        array: None,
        count: Some(CountSource::Literal(5)),
        condition: None,
        variable: None,
        body: body.clone(),
    };
    let mut engine = ControlFlowEngine::default().with_max_iterations(5);
    let actions = engine.execute_loop(&within).expect("exactly at the ceiling");
    assert_eq!(actions.len(), 5);

    let beyond = LoopBlock {
        kind: LoopKind::Repeat,
        array: None,
        count: Some(CountSource::Literal(6)),
        condition: None,
        variable: None,
        body,
    };
    let mut engine = ControlFlowEngine::default().with_max_iterations(5);
    assert!(matches!(
        engine.execute_loop(&beyond),
        Err(ControlFlowError::IterationLimitExceeded { limit: 5 })
    ));
}

#[test]
fn test_call_function_binds_result() {
    let mut engine = ControlFlowEngine::default();
    engine.scopes_mut().register_function(
        "double",
        std::sync::Arc::new(|args: &[serde_json::Value]| {
            json!(formdef::expr::to_number(args.first().unwrap_or(&json!(0))) * 2.0)
        }),
    );

    let actions = vec![TemplateAction::CallFunction {
        name: "double".to_string(),
        args: vec![json!(21)],
        return_variable: Some("answer".to_string()),
    }];
    engine.execute_actions(&actions).expect("executes");
    assert_eq!(engine.scopes().get_variable("answer"), Some(json!(42.0)));
}

#[test]
fn test_unknown_function_degrades() {
    let mut engine = ControlFlowEngine::default();
    let actions = vec![TemplateAction::CallFunction {
        name: "ghost".to_string(),
        args: vec![],
        return_variable: Some("out".to_string()),
    }];
    // Failure logs and leaves the binding unset; the run continues.
    let output = engine.execute_actions(&actions).expect("degrades");
    assert!(output.is_empty());
    assert!(engine.scopes().get_variable("out").is_none());
}

#[test]
fn test_process_control_flow_runs_clauses_in_order() {
    let mut engine = ControlFlowEngine::default();
    engine.scopes_mut().set_variable("ready", json!(true));
    engine
        .scopes_mut()
        .set_variable("machines", json!(["press"]));

    let mut conditional = ConditionalBlock::new(Condition::Variable("ready".to_string()));
    conditional.then = vec![create_field_action("header")];

    let config = ControlFlowConfig {
        conditional: Some(conditional),
        for_each: Some(ForEachClause {
            array: ArraySource::Name("machines".to_string()),
            variable: "machine".to_string(),
            body: vec![create_field_action("machine_check")],
        }),
        repeat: None,
        while_loop: Some(WhileClause {
            condition: Condition::Variable("never".to_string()),
            body: vec![create_field_action("unreachable")],
        }),
    };

    let actions = engine.process_control_flow(&config).expect("executes");
    assert_eq!(field_ids(&actions), vec!["header", "machine_check"]);
}

#[test]
fn test_validate_control_flow_reports_structural_issues() {
    let config = ControlFlowConfig {
        conditional: Some(ConditionalBlock::new(Condition::Expression(String::new()))),
        for_each: Some(ForEachClause {
            array: ArraySource::Name(String::new()),
            variable: String::new(),
            body: vec![],
        }),
        repeat: None,
        while_loop: None,
    };

    let issues = ControlFlowEngine::validate_control_flow(&config);
    assert!(issues.len() >= 3);
}

#[test]
fn test_reset_clears_state() {
    let mut engine = ControlFlowEngine::default().with_max_iterations(3);
    let block = LoopBlock {
        kind: LoopKind::Repeat,
        array: None,
        count: Some(CountSource::Literal(3)),
        condition: None,
        variable: None,
        body: vec![create_field_action("pass")],
    };
    engine.execute_loop(&block).expect("first run fits");

    // The counter is shared across loops; without a reset the next run
    // overflows immediately.
    assert!(engine.execute_loop(&block).is_err());
    engine.reset();
    engine.execute_loop(&block).expect("counter cleared");
}
