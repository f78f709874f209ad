//! Hierarchical variable scopes for template construction and control flow.
//!
//! A [`ScopeChain`] is a strict stack: every [`ScopeChain::enter_scope`] must
//! be paired with exactly one [`ScopeChain::exit_scope`], even on error paths.
//! The chain lives for one builder session or one control-flow engine
//! invocation and is discarded afterwards.

use std::sync::Arc;

use ahash::AHashMap;
use log::warn;
use serde_json::Value;

use crate::error::RuntimeError;
use crate::expr::Expr;

/// A function registered on the chain and callable from `callFunction`
/// actions or `Function` conditions.
pub type TemplateFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// One node of the scope chain.
#[derive(Default, Clone)]
pub struct Scope {
    /// Variables visible in this scope, including values inherited at entry.
    variables: AHashMap<String, Value>,
    /// Bindings introduced directly in this scope; consulted before
    /// `variables` during lookup.
    locals: AHashMap<String, Value>,
    functions: AHashMap<String, TemplateFn>,
    break_loop: bool,
    continue_loop: bool,
}

/// The scope stack. The root scope is always present and cannot be popped.
pub struct ScopeChain {
    stack: Vec<Scope>,
}

impl Default for ScopeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeChain {
    pub fn new() -> Self {
        Self {
            stack: vec![Scope::default()],
        }
    }

    pub fn with_variables(variables: AHashMap<String, Value>) -> Self {
        let mut chain = Self::new();
        for (name, value) in variables {
            chain.set_variable(name, value);
        }
        chain
    }

    /// Pushes a new scope seeded with the given bindings.
    pub fn enter_scope(&mut self, seed: AHashMap<String, Value>) {
        let scope = Scope {
            variables: seed.clone(),
            locals: seed,
            functions: AHashMap::new(),
            break_loop: false,
            continue_loop: false,
        };
        self.stack.push(scope);
    }

    /// Pops the current scope. The popped scope's break/continue flags are
    /// copied onto the restored parent, so a signal raised in a nested loop
    /// bleeds into the enclosing one. Known quirk, kept for compatibility
    /// with existing templates.
    pub fn exit_scope(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        let child = self.stack.pop().expect("stack is non-empty");
        let parent = self.stack.last_mut().expect("root scope always present");
        parent.break_loop = child.break_loop;
        parent.continue_loop = child.continue_loop;
        true
    }

    /// Number of scopes currently on the stack, root included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn top(&mut self) -> &mut Scope {
        self.stack.last_mut().expect("root scope always present")
    }

    /// Binds a variable in the current scope.
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let top = self.top();
        top.variables.insert(name.clone(), value.clone());
        top.locals.insert(name, value);
    }

    /// Resolves a variable by walking the chain from the innermost scope
    /// outwards, consulting each scope's locals before its variables.
    /// Absence is `None`, never an error.
    pub fn get_variable(&self, name: &str) -> Option<Value> {
        for scope in self.stack.iter().rev() {
            if let Some(value) = scope.locals.get(name) {
                return Some(value.clone());
            }
            if let Some(value) = scope.variables.get(name) {
                return Some(value.clone());
            }
        }
        None
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.get_variable(name).is_some()
    }

    /// Registers a function in the current scope.
    pub fn register_function(&mut self, name: impl Into<String>, func: TemplateFn) {
        self.top().functions.insert(name.into(), func);
    }

    /// Calls a registered function, searching the chain outwards. Unknown
    /// names are a hard error; callers that want to tolerate it catch the
    /// `Err` themselves.
    pub fn call_function(&self, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        for scope in self.stack.iter().rev() {
            if let Some(func) = scope.functions.get(name) {
                return Ok(func(args));
            }
        }
        Err(RuntimeError::FunctionNotFound(name.to_string()))
    }

    pub fn set_break_loop(&mut self) {
        self.top().break_loop = true;
    }

    pub fn set_continue_loop(&mut self) {
        self.top().continue_loop = true;
    }

    pub fn clear_loop_controls(&mut self) {
        let top = self.top();
        top.break_loop = false;
        top.continue_loop = false;
    }

    pub fn should_break_loop(&self) -> bool {
        self.stack.last().map(|s| s.break_loop).unwrap_or(false)
    }

    pub fn should_continue_loop(&self) -> bool {
        self.stack.last().map(|s| s.continue_loop).unwrap_or(false)
    }

    /// Substitutes `${expr}` placeholders in a string. Placeholders that do
    /// not resolve are left verbatim.
    pub fn resolve_variables(&self, template: &str) -> String {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("${") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let placeholder = &after[..end];
                    match self.evaluate_expression(placeholder) {
                        Some(value) => output.push_str(&value_to_text(&value)),
                        None => {
                            output.push_str("${");
                            output.push_str(placeholder);
                            output.push('}');
                        }
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    output.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        output.push_str(rest);
        output
    }

    /// Evaluates a lookup expression against the chain. Recognized forms, in
    /// order: bare identifier, a `variables.` prefix, `name[index]` array
    /// indexing, dotted property chains, and finally the restricted
    /// expression grammar from [`crate::expr`]. Failures log and resolve to
    /// `None`.
    pub fn evaluate_expression(&self, expression: &str) -> Option<Value> {
        let expression = expression.trim();

        if is_identifier(expression) {
            return self.get_variable(expression);
        }

        if let Some(name) = expression.strip_prefix("variables.") {
            return self.get_variable(name);
        }

        if let Some((name, index)) = parse_index_access(expression) {
            return match self.get_variable(name) {
                Some(Value::Array(items)) => items.get(index).cloned(),
                _ => None,
            };
        }

        if expression.contains('.') && expression.chars().all(is_path_char) {
            let mut parts = expression.split('.');
            let mut value = self.get_variable(parts.next()?)?;
            for part in parts {
                match value {
                    Value::Object(map) => value = map.get(part)?.clone(),
                    _ => return None,
                }
            }
            return Some(value);
        }

        match Expr::parse(expression) {
            Ok(parsed) => {
                let result = parsed.evaluate(&|name| self.get_variable(name));
                if result.is_null() { None } else { Some(result) }
            }
            Err(err) => {
                warn!("Failed to evaluate expression '{}': {}", expression, err);
                None
            }
        }
    }

    /// Drops everything above the root scope and clears root state.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.push(Scope::default());
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

fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn parse_index_access(expression: &str) -> Option<(&str, usize)> {
    let open = expression.find('[')?;
    let close = expression.rfind(']')?;
    if close != expression.len() - 1 || close <= open {
        return None;
    }
    let name = &expression[..open];
    if !is_identifier(name) {
        return None;
    }
    let index = expression[open + 1..close].trim().parse::<usize>().ok()?;
    Some((name, index))
}

/// Renders a value for `${...}` interpolation: bare text for strings, JSON
/// for everything else.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
