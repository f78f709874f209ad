use serde_json::Value;

use super::condition::Condition;
use super::field::Field;
use super::section::Section;

/// A declarative bundle of at most one conditional and/or one loop, carried
/// by a section or field and expanded by the control-flow engine after a
/// document has been parsed.
///
/// This is the stored, document-driven counterpart of the builder's eager
/// loop macros; the two deliberately share vocabulary but not code.
#[derive(Debug, Clone, Default)]
pub struct ControlFlowConfig {
    pub conditional: Option<ConditionalBlock>,
    pub for_each: Option<ForEachClause>,
    pub repeat: Option<RepeatClause>,
    pub while_loop: Option<WhileClause>,
}

impl ControlFlowConfig {
    pub fn is_empty(&self) -> bool {
        self.conditional.is_none()
            && self.for_each.is_none()
            && self.repeat.is_none()
            && self.while_loop.is_none()
    }
}

/// An `if/elseIf*/else` block.
///
/// `else_if` is an `Option<Vec<_>>` on purpose: the executor falls through to
/// `else_actions` only when no `else_if` vector is present at all. When the
/// vector exists but no branch matches, `else` is skipped. See
/// `ControlFlowEngine::execute_conditional`.
#[derive(Debug, Clone)]
pub struct ConditionalBlock {
    pub condition: Condition,
    pub then: Vec<TemplateAction>,
    pub else_if: Option<Vec<ElseIfBranch>>,
    pub else_actions: Option<Vec<TemplateAction>>,
}

impl ConditionalBlock {
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            then: Vec::new(),
            else_if: None,
            else_actions: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElseIfBranch {
    pub condition: Condition,
    pub then: Vec<TemplateAction>,
}

/// Where a forEach loop finds its items: a named binding or an inline array.
#[derive(Debug, Clone)]
pub enum ArraySource {
    Name(String),
    Literal(Vec<Value>),
}

impl From<&str> for ArraySource {
    fn from(name: &str) -> Self {
        ArraySource::Name(name.to_string())
    }
}

impl From<String> for ArraySource {
    fn from(name: String) -> Self {
        ArraySource::Name(name)
    }
}

impl From<Vec<Value>> for ArraySource {
    fn from(items: Vec<Value>) -> Self {
        ArraySource::Literal(items)
    }
}

/// A repeat count: a literal or an expression evaluated against the scopes.
#[derive(Debug, Clone)]
pub enum CountSource {
    Literal(i64),
    Expression(String),
}

impl From<i64> for CountSource {
    fn from(count: i64) -> Self {
        CountSource::Literal(count)
    }
}

impl From<&str> for CountSource {
    fn from(expression: &str) -> Self {
        CountSource::Expression(expression.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ForEachClause {
    pub array: ArraySource,
    pub variable: String,
    pub body: Vec<TemplateAction>,
}

#[derive(Debug, Clone)]
pub struct RepeatClause {
    pub count: CountSource,
    pub variable: Option<String>,
    pub body: Vec<TemplateAction>,
}

#[derive(Debug, Clone)]
pub struct WhileClause {
    pub condition: Condition,
    pub body: Vec<TemplateAction>,
}

/// The kinds a [`LoopBlock`] dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    ForEach,
    Repeat,
    While,
}

impl LoopKind {
    pub fn name(&self) -> &'static str {
        match self {
            LoopKind::ForEach => "forEach",
            LoopKind::Repeat => "repeat",
            LoopKind::While => "while",
        }
    }
}

/// The engine's internal loop representation, produced from the clause
/// structs above before execution.
#[derive(Debug, Clone)]
pub struct LoopBlock {
    pub kind: LoopKind,
    pub array: Option<ArraySource>,
    pub count: Option<CountSource>,
    pub condition: Option<Condition>,
    pub variable: Option<String>,
    pub body: Vec<TemplateAction>,
}

/// One step in a control-flow body. `CreateField`/`CreateSection` carry the
/// constructors the engine flattens back into the tree; the rest mutate the
/// scope chain or recurse.
#[derive(Debug, Clone)]
pub enum TemplateAction {
    CreateField(Field),
    CreateSection(Section),
    SetVariable {
        name: String,
        value: Value,
    },
    CallFunction {
        name: String,
        args: Vec<Value>,
        return_variable: Option<String>,
    },
    Conditional(ConditionalBlock),
    Loop(LoopBlock),
}
