use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scope::ScopeChain;

/// A runtime-evaluated predicate attached to control flow. Evaluated against
/// the current scope chain by the condition evaluator.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Truthy check of a named binding.
    Variable(String),
    /// A binding compared against a literal (or array of literals).
    Comparison {
        variable: String,
        operator: ComparisonOp,
        value: Value,
    },
    /// A free-form expression in the restricted grammar, evaluated lazily
    /// against live bindings.
    Expression(String),
    /// A caller-supplied predicate over the scope chain. Does not survive
    /// serialization.
    Function(ContextPredicate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Contains,
}

impl ComparisonOp {
    /// Maps a string-grammar operator token. Unrecognized tokens fall back
    /// to equality, matching the parser's forgiving behavior.
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "==" => ComparisonOp::Eq,
            "!=" => ComparisonOp::Neq,
            ">" => ComparisonOp::Gt,
            ">=" => ComparisonOp::Gte,
            "<" => ComparisonOp::Lt,
            "<=" => ComparisonOp::Lte,
            "in" => ComparisonOp::In,
            "contains" => ComparisonOp::Contains,
            _ => ComparisonOp::Eq,
        }
    }

    /// The reverse operator table used when serializing conditions back to
    /// the string grammar.
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Neq => "!=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
            ComparisonOp::In => "in",
            ComparisonOp::Contains => "contains",
        }
    }
}

/// A cloneable, debuggable wrapper around a caller-supplied predicate.
#[derive(Clone)]
pub struct ContextPredicate(Arc<dyn Fn(&ScopeChain) -> bool + Send + Sync>);

impl ContextPredicate {
    pub fn new(f: impl Fn(&ScopeChain) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, scopes: &ScopeChain) -> bool {
        (self.0)(scopes)
    }
}

impl fmt::Debug for ContextPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextPredicate(<fn>)")
    }
}

/// Visibility operator for the simpler `dependsOn` triples carried by
/// sections and fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityOperator {
    Equals,
    Contains,
    NotEquals,
}

/// One `{dependsOn, operator, values}` visibility triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleCondition {
    pub depends_on: String,
    pub operator: VisibilityOperator,
    pub values: Vec<String>,
}

impl SingleCondition {
    pub fn new(
        depends_on: impl Into<String>,
        operator: VisibilityOperator,
        values: Vec<String>,
    ) -> Self {
        Self {
            depends_on: depends_on.into(),
            operator,
            values,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundLogic {
    And,
    Or,
}

/// Several visibility conditions combined with and/or logic. Conditions may
/// nest arbitrarily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundCondition {
    pub logic: CompoundLogic,
    pub conditions: Vec<VisibilityCondition>,
}

/// Visibility condition on a section or field: either a single triple or a
/// compound combination. Untagged so documents may write either shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VisibilityCondition {
    Compound(CompoundCondition),
    Single(SingleCondition),
}

impl VisibilityCondition {
    /// Every field id this condition depends on, for cross-reference checks.
    pub fn dependencies(&self) -> Vec<&str> {
        match self {
            VisibilityCondition::Single(single) => vec![single.depends_on.as_str()],
            VisibilityCondition::Compound(compound) => compound
                .conditions
                .iter()
                .flat_map(|c| c.dependencies())
                .collect(),
        }
    }
}

impl From<SingleCondition> for VisibilityCondition {
    fn from(condition: SingleCondition) -> Self {
        VisibilityCondition::Single(condition)
    }
}

impl From<CompoundCondition> for VisibilityCondition {
    fn from(condition: CompoundCondition) -> Self {
        VisibilityCondition::Compound(condition)
    }
}
