//! Condition evaluation and the condition string grammar.
//!
//! Evaluation is deliberately forgiving: any failure while resolving a
//! condition degrades to `false` with a logged warning and never propagates.
//! The string grammar covers bare identifiers, binary comparisons, `in` and
//! `contains` infixes; anything else becomes a raw expression evaluated
//! later against live bindings.

use log::warn;
use serde_json::Value;

use crate::error::TemplateIssue;
use crate::expr::{to_boolean, to_number, values_equal};
use crate::scope::ScopeChain;
use crate::template::{ComparisonOp, Condition};

/// Evaluates [`Condition`]s against a borrowed scope chain.
pub struct ConditionEvaluator<'a> {
    scopes: &'a ScopeChain,
}

impl<'a> ConditionEvaluator<'a> {
    pub fn new(scopes: &'a ScopeChain) -> Self {
        Self { scopes }
    }

    /// Evaluates a condition to a boolean. Never fails; evaluation problems
    /// log and count as `false`.
    pub fn evaluate(&self, condition: &Condition) -> bool {
        match condition {
            Condition::Variable(name) => self
                .scopes
                .get_variable(name)
                .map(|v| to_boolean(&v))
                .unwrap_or(false),
            Condition::Expression(expression) => match self.scopes.evaluate_expression(expression) {
                Some(value) => to_boolean(&value),
                None => false,
            },
            Condition::Function(predicate) => predicate.call(self.scopes),
            Condition::Comparison {
                variable,
                operator,
                value,
            } => self.evaluate_comparison(variable, *operator, value),
        }
    }

    fn evaluate_comparison(&self, variable: &str, operator: ComparisonOp, right: &Value) -> bool {
        let left = match self.scopes.get_variable(variable) {
            Some(value) => value,
            None => {
                // An unbound left side can only satisfy `neq`.
                return matches!(operator, ComparisonOp::Neq);
            }
        };

        match operator {
            ComparisonOp::Eq => values_equal(&left, right),
            ComparisonOp::Neq => !values_equal(&left, right),
            ComparisonOp::Gt => to_number(&left) > to_number(right),
            ComparisonOp::Gte => to_number(&left) >= to_number(right),
            ComparisonOp::Lt => to_number(&left) < to_number(right),
            ComparisonOp::Lte => to_number(&left) <= to_number(right),
            ComparisonOp::In => match right {
                Value::Array(items) => items.iter().any(|item| values_equal(&left, item)),
                _ => false,
            },
            ComparisonOp::Contains => match (&left, right) {
                (Value::String(haystack), Value::String(needle)) => haystack.contains(needle),
                (Value::Array(items), needle) => {
                    items.iter().any(|item| values_equal(item, needle))
                }
                _ => false,
            },
        }
    }

    /// Parses the condition string grammar, trying forms in priority order.
    pub fn parse_condition_string(input: &str) -> Condition {
        let input = input.trim();

        if is_identifier(input) {
            return Condition::Variable(input.to_string());
        }

        if let Some((left, symbol, right)) = split_comparison(input) {
            return Condition::Comparison {
                variable: left.to_string(),
                operator: ComparisonOp::from_symbol(symbol),
                value: parse_literal(right),
            };
        }

        if let Some((left, right)) = split_infix(input, " in ") {
            return Condition::Comparison {
                variable: left.to_string(),
                operator: ComparisonOp::In,
                value: Value::Array(parse_array_literal(right)),
            };
        }

        if let Some((left, right)) = split_infix(input, " contains ") {
            return Condition::Comparison {
                variable: left.to_string(),
                operator: ComparisonOp::Contains,
                value: parse_literal(right),
            };
        }

        Condition::Expression(input.to_string())
    }

    /// Serializes a condition back to the string grammar. `Function`
    /// conditions have no textual form and serialize to an empty string.
    pub fn serialize_condition(condition: &Condition) -> String {
        match condition {
            Condition::Variable(name) => name.clone(),
            Condition::Expression(expression) => expression.clone(),
            Condition::Comparison {
                variable,
                operator,
                value,
            } => format!("{} {} {}", variable, operator.symbol(), value),
            Condition::Function(_) => {
                warn!("Function conditions cannot be serialized to the string grammar");
                String::new()
            }
        }
    }

    /// Structural checks per condition tag. Returns issues, never errors.
    pub fn validate_condition(condition: &Condition) -> Vec<TemplateIssue> {
        let mut issues = Vec::new();
        match condition {
            Condition::Variable(name) => {
                if name.is_empty() {
                    issues.push(TemplateIssue::validation(
                        "Variable condition must have variable property",
                    ));
                }
            }
            Condition::Expression(expression) => {
                if expression.is_empty() {
                    issues.push(TemplateIssue::validation(
                        "Expression condition must have expression property",
                    ));
                }
            }
            Condition::Comparison { variable, .. } => {
                if variable.is_empty() {
                    issues.push(TemplateIssue::validation(
                        "Comparison condition must have variable property",
                    ));
                }
            }
            Condition::Function(_) => {}
        }
        issues
    }
}

/// Accepted wherever a condition is taken: a ready [`Condition`] passes
/// through, strings are parsed with the condition grammar.
pub trait IntoCondition {
    fn into_condition(self) -> Condition;
}

impl IntoCondition for Condition {
    fn into_condition(self) -> Condition {
        self
    }
}

impl IntoCondition for &str {
    fn into_condition(self) -> Condition {
        ConditionEvaluator::parse_condition_string(self)
    }
}

impl IntoCondition for String {
    fn into_condition(self) -> Condition {
        ConditionEvaluator::parse_condition_string(&self)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Splits `lhs OP rhs` on the first comparison operator. Two-character
/// operators are tried before their one-character prefixes.
fn split_comparison(input: &str) -> Option<(&str, &str, &str)> {
    const SYMBOLS: [&str; 6] = ["==", "!=", ">=", "<=", ">", "<"];
    for (index, _) in input.char_indices() {
        for symbol in SYMBOLS {
            if input[index..].starts_with(symbol) {
                let left = input[..index].trim();
                let right = input[index + symbol.len()..].trim();
                if left.is_empty() || right.is_empty() {
                    return None;
                }
                return Some((left, symbol, right));
            }
        }
    }
    None
}

fn split_infix<'a>(input: &'a str, keyword: &str) -> Option<(&'a str, &'a str)> {
    let index = input.find(keyword)?;
    let left = input[..index].trim();
    let right = input[index + keyword.len()..].trim();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left, right))
}

/// Parses a right-hand literal: quoted string, number, boolean, null, or a
/// bare string.
pub(crate) fn parse_literal(text: &str) -> Value {
    let text = text.trim();

    if text.len() >= 2 {
        let bytes = text.as_bytes();
        if (bytes[0] == b'"' && bytes[text.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[text.len() - 1] == b'\'')
        {
            return Value::String(text[1..text.len() - 1].to_string());
        }
    }

    if let Ok(number) = text.parse::<f64>() {
        return serde_json::json!(number);
    }

    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" | "undefined" => Value::Null,
        other => Value::String(other.to_string()),
    }
}

/// Parses an array literal (JSON first, comma-split fallback) or a
/// comma-separated list; a single bare value becomes a one-element array.
pub(crate) fn parse_array_literal(text: &str) -> Vec<Value> {
    let text = text.trim();

    if text.starts_with('[') && text.ends_with(']') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
            return items;
        }
        return text[1..text.len() - 1]
            .split(',')
            .map(parse_literal)
            .collect();
    }

    if text.contains(',') {
        return text.split(',').map(parse_literal).collect();
    }

    vec![parse_literal(text)]
}
