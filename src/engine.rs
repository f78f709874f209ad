//! Declarative control-flow execution for document templates.
//!
//! The engine interprets [`ControlFlowConfig`]s attached to sections and
//! fields, expanding conditionals and bounded loops into flat action lists.
//! It is entirely separate from the builder's eager loop macros: the builder
//! runs loops at construction time, the engine runs them when a document
//! template is materialized.

use ahash::AHashMap;
use log::warn;
use serde_json::Value;

use crate::condition::ConditionEvaluator;
use crate::error::{ControlFlowError, TemplateIssue};
use crate::expr::to_number;
use crate::scope::ScopeChain;
use crate::template::{
    ArraySource, Condition, ConditionalBlock, ControlFlowConfig, CountSource, LoopBlock, LoopKind,
    TemplateAction,
};

const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Executes control-flow blocks against a scope chain, with a shared
/// iteration ceiling across all loops of one engine run.
pub struct ControlFlowEngine {
    scopes: ScopeChain,
    max_iterations: usize,
    iterations: usize,
}

impl Default for ControlFlowEngine {
    fn default() -> Self {
        Self::new(ScopeChain::new())
    }
}

impl ControlFlowEngine {
    pub fn new(scopes: ScopeChain) -> Self {
        Self {
            scopes,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            iterations: 0,
        }
    }

    /// Overrides the iteration ceiling shared by every loop this engine runs.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn scopes(&self) -> &ScopeChain {
        &self.scopes
    }

    pub fn scopes_mut(&mut self) -> &mut ScopeChain {
        &mut self.scopes
    }

    /// Executes a conditional block. When the condition fails and an
    /// `else_if` vector is present, only its branches are consulted; the
    /// `else` branch runs only when no `else_if` vector exists at all.
    /// Longstanding quirk, kept for compatibility with existing templates.
    pub fn execute_conditional(
        &mut self,
        block: &ConditionalBlock,
    ) -> Result<Vec<TemplateAction>, ControlFlowError> {
        if self.evaluate(&block.condition) {
            return self.execute_actions(&block.then);
        }

        if let Some(branches) = &block.else_if {
            for branch in branches {
                if self.evaluate(&branch.condition) {
                    return self.execute_actions(&branch.then);
                }
            }
            return Ok(Vec::new());
        }

        match &block.else_actions {
            Some(actions) => self.execute_actions(actions),
            None => Ok(Vec::new()),
        }
    }

    /// Executes a loop block. One scope wraps the whole loop and is exited
    /// even when the body errors out.
    pub fn execute_loop(
        &mut self,
        block: &LoopBlock,
    ) -> Result<Vec<TemplateAction>, ControlFlowError> {
        self.scopes.enter_scope(AHashMap::new());
        let result = self.run_loop_body(block);
        self.scopes.exit_scope();
        result
    }

    fn run_loop_body(&mut self, block: &LoopBlock) -> Result<Vec<TemplateAction>, ControlFlowError> {
        match block.kind {
            LoopKind::ForEach => self.run_for_each(block),
            LoopKind::Repeat => self.run_repeat(block),
            LoopKind::While => self.run_while(block),
        }
    }

    fn run_for_each(&mut self, block: &LoopBlock) -> Result<Vec<TemplateAction>, ControlFlowError> {
        let source = block.array.as_ref().ok_or(ControlFlowError::MissingLoopProperty {
            loop_kind: LoopKind::ForEach.name(),
            property: "array",
        })?;
        let variable = block.variable.as_deref().unwrap_or("item");

        let items = match source {
            ArraySource::Literal(items) => items.clone(),
            ArraySource::Name(name) => match self.scopes.get_variable(name) {
                Some(Value::Array(items)) => items,
                other => {
                    warn!(
                        "forEach source '{}' is not an array ({})",
                        name,
                        match other {
                            Some(_) => "wrong type",
                            None => "unbound",
                        }
                    );
                    return Ok(Vec::new());
                }
            },
        };

        let mut actions = Vec::new();
        let length = items.len();
        for (index, item) in items.into_iter().enumerate() {
            self.check_iteration_limit()?;
            self.scopes.set_variable(variable, item);
            self.scopes.set_variable("index", Value::from(index));
            self.scopes.set_variable("length", Value::from(length));

            actions.extend(self.execute_actions(&block.body)?);

            if self.scopes.should_break_loop() {
                self.scopes.clear_loop_controls();
                break;
            }
            if self.scopes.should_continue_loop() {
                self.scopes.clear_loop_controls();
            }
        }
        Ok(actions)
    }

    fn run_repeat(&mut self, block: &LoopBlock) -> Result<Vec<TemplateAction>, ControlFlowError> {
        let source = block.count.as_ref().ok_or(ControlFlowError::MissingLoopProperty {
            loop_kind: LoopKind::Repeat.name(),
            property: "count",
        })?;

        let count = match source {
            CountSource::Literal(count) => *count,
            CountSource::Expression(expression) => match self.scopes.evaluate_expression(expression)
            {
                Some(value) => to_number(&value) as i64,
                None => {
                    warn!("repeat count expression '{}' did not resolve", expression);
                    return Ok(Vec::new());
                }
            },
        };
        if count < 0 {
            warn!("repeat count {} is negative, skipping loop", count);
            return Ok(Vec::new());
        }

        let mut actions = Vec::new();
        for index in 0..count {
            self.check_iteration_limit()?;
            if let Some(variable) = &block.variable {
                self.scopes.set_variable(variable.clone(), Value::from(index));
            }
            self.scopes.set_variable("index", Value::from(index));
            self.scopes.set_variable("count", Value::from(count));

            actions.extend(self.execute_actions(&block.body)?);

            if self.scopes.should_break_loop() {
                self.scopes.clear_loop_controls();
                break;
            }
            if self.scopes.should_continue_loop() {
                self.scopes.clear_loop_controls();
            }
        }
        Ok(actions)
    }

    fn run_while(&mut self, block: &LoopBlock) -> Result<Vec<TemplateAction>, ControlFlowError> {
        let condition = block.condition.as_ref().ok_or(ControlFlowError::MissingLoopProperty {
            loop_kind: LoopKind::While.name(),
            property: "condition",
        })?;

        let mut actions = Vec::new();
        let mut iteration: i64 = 0;
        while self.evaluate(condition) {
            self.check_iteration_limit()?;
            self.scopes.set_variable("iteration", Value::from(iteration));

            actions.extend(self.execute_actions(&block.body)?);

            if self.scopes.should_break_loop() {
                self.scopes.clear_loop_controls();
                break;
            }
            if self.scopes.should_continue_loop() {
                self.scopes.clear_loop_controls();
            }
            iteration += 1;
        }
        Ok(actions)
    }

    /// Executes a list of actions, flattening nested control flow. Structure
    /// actions pass through unchanged; variable and function actions mutate
    /// the scope chain and emit nothing.
    pub fn execute_actions(
        &mut self,
        actions: &[TemplateAction],
    ) -> Result<Vec<TemplateAction>, ControlFlowError> {
        let mut output = Vec::new();
        for action in actions {
            match action {
                TemplateAction::SetVariable { name, value } => {
                    self.scopes.set_variable(name.clone(), value.clone());
                }
                TemplateAction::CallFunction {
                    name,
                    args,
                    return_variable,
                } => match self.scopes.call_function(name, args) {
                    Ok(result) => {
                        if let Some(binding) = return_variable {
                            self.scopes.set_variable(binding.clone(), result);
                        }
                    }
                    Err(err) => warn!("callFunction action failed: {}", err),
                },
                TemplateAction::Conditional(block) => {
                    output.extend(self.execute_conditional(block)?);
                }
                TemplateAction::Loop(block) => {
                    output.extend(self.execute_loop(block)?);
                }
                passthrough @ (TemplateAction::CreateField(_)
                | TemplateAction::CreateSection(_)) => {
                    output.push(passthrough.clone());
                }
            }
        }
        Ok(output)
    }

    /// Runs every clause of a control-flow config in declaration order and
    /// flattens the resulting actions.
    pub fn process_control_flow(
        &mut self,
        config: &ControlFlowConfig,
    ) -> Result<Vec<TemplateAction>, ControlFlowError> {
        let mut actions = Vec::new();

        if let Some(block) = &config.conditional {
            actions.extend(self.execute_conditional(block)?);
        }
        if let Some(clause) = &config.for_each {
            let block = LoopBlock {
                kind: LoopKind::ForEach,
                array: Some(clause.array.clone()),
                count: None,
                condition: None,
                variable: Some(clause.variable.clone()),
                body: clause.body.clone(),
            };
            actions.extend(self.execute_loop(&block)?);
        }
        if let Some(clause) = &config.repeat {
            let block = LoopBlock {
                kind: LoopKind::Repeat,
                array: None,
                count: Some(clause.count.clone()),
                condition: None,
                variable: clause.variable.clone(),
                body: clause.body.clone(),
            };
            actions.extend(self.execute_loop(&block)?);
        }
        if let Some(clause) = &config.while_loop {
            let block = LoopBlock {
                kind: LoopKind::While,
                array: None,
                count: None,
                condition: Some(clause.condition.clone()),
                variable: None,
                body: clause.body.clone(),
            };
            actions.extend(self.execute_loop(&block)?);
        }

        Ok(actions)
    }

    /// Structural checks for a control-flow config. Condition contents are
    /// checked by [`ConditionEvaluator::validate_condition`].
    pub fn validate_control_flow(config: &ControlFlowConfig) -> Vec<TemplateIssue> {
        let mut issues = Vec::new();

        if let Some(block) = &config.conditional {
            issues.extend(ConditionEvaluator::validate_condition(&block.condition));
            if let Some(branches) = &block.else_if {
                for branch in branches {
                    issues.extend(ConditionEvaluator::validate_condition(&branch.condition));
                }
            }
        }
        if let Some(clause) = &config.for_each {
            if clause.variable.is_empty() {
                issues.push(TemplateIssue::validation(
                    "forEach loop requires variable property",
                ));
            }
            if let ArraySource::Name(name) = &clause.array {
                if name.is_empty() {
                    issues.push(TemplateIssue::validation(
                        "forEach loop requires array property",
                    ));
                }
            }
        }
        if let Some(clause) = &config.repeat {
            if let CountSource::Expression(expression) = &clause.count {
                if expression.is_empty() {
                    issues.push(TemplateIssue::validation(
                        "repeat loop requires count property",
                    ));
                }
            }
        }
        if let Some(clause) = &config.while_loop {
            issues.extend(ConditionEvaluator::validate_condition(&clause.condition));
        }

        issues
    }

    /// Clears the iteration counter and resets the scope chain to a single
    /// empty root scope.
    pub fn reset(&mut self) {
        self.iterations = 0;
        self.scopes.reset();
    }

    fn evaluate(&self, condition: &Condition) -> bool {
        ConditionEvaluator::new(&self.scopes).evaluate(condition)
    }

    fn check_iteration_limit(&mut self) -> Result<(), ControlFlowError> {
        if self.iterations >= self.max_iterations {
            return Err(ControlFlowError::IterationLimitExceeded {
                limit: self.max_iterations,
            });
        }
        self.iterations += 1;
        Ok(())
    }
}
