//! A restricted expression language evaluated against the scope chain.
//!
//! Free-form condition strings that do not match the simpler condition
//! grammar fall back to this module: a small lexer, a precedence-climbing
//! parser and a tree-walking interpreter. The grammar deliberately stops at
//! identifiers, literals, `.`/`[]` access, comparison and logical operators;
//! there is no way to reach host code from an expression.

use serde_json::Value;

use crate::error::RuntimeError;

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Ident(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    Op(BinaryOp),
    Bang,
    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
}

/// Converts a value to a boolean the way the condition grammar expects:
/// booleans pass through, an empty string is false and every other string is
/// true, numbers are truthy when non-zero, arrays and objects when non-empty.
pub fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true") || !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Null => false,
    }
}

/// Coerces a value to a number for relational comparisons. Strings parse with
/// a fallback of 0, booleans become 0/1, arrays become their length.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Array(items) => items.len() as f64,
        _ => 0.0,
    }
}

/// Equality over JSON values with numbers compared numerically, so that
/// `1` and `1.0` are equal regardless of their serde representation.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            l.as_f64().unwrap_or(f64::NAN) == r.as_f64().unwrap_or(f64::NAN)
        }
        _ => left == right,
    }
}

impl Expr {
    /// Parses an expression string.
    pub fn parse(input: &str) -> Result<Self, RuntimeError> {
        let tokens = tokenize(input).map_err(|message| RuntimeError::ExpressionFailed {
            expression: input.to_string(),
            message,
        })?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser
            .parse_or()
            .map_err(|message| RuntimeError::ExpressionFailed {
                expression: input.to_string(),
                message,
            })?;
        if parser.pos != parser.tokens.len() {
            return Err(RuntimeError::ExpressionFailed {
                expression: input.to_string(),
                message: format!("unexpected trailing input at token {}", parser.pos),
            });
        }
        Ok(expr)
    }

    /// Evaluates the expression, resolving free identifiers through the
    /// supplied lookup. Unresolved identifiers evaluate to `Null`.
    pub fn evaluate(&self, resolve: &dyn Fn(&str) -> Option<Value>) -> Value {
        match self {
            Expr::Literal(v) => v.clone(),
            Expr::Ident(name) => resolve(name).unwrap_or(Value::Null),
            Expr::Member(base, key) => match base.evaluate(resolve) {
                Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            },
            Expr::Index(base, index) => {
                let base = base.evaluate(resolve);
                let index = index.evaluate(resolve);
                match (&base, &index) {
                    // Number literals lex as f64, so subscripts truncate
                    // rather than round-trip through integer representations.
                    (Value::Array(items), Value::Number(_)) => {
                        let i = to_number(&index);
                        if i < 0.0 {
                            return Value::Null;
                        }
                        items.get(i as usize).cloned().unwrap_or(Value::Null)
                    }
                    (Value::Object(map), Value::String(key)) => {
                        map.get(key).cloned().unwrap_or(Value::Null)
                    }
                    _ => Value::Null,
                }
            }
            Expr::Not(inner) => Value::Bool(!to_boolean(&inner.evaluate(resolve))),
            Expr::Binary(op, left, right) => {
                let l = left.evaluate(resolve);
                // Logical operators short-circuit before the right side runs.
                match op {
                    BinaryOp::And => {
                        if !to_boolean(&l) {
                            return Value::Bool(false);
                        }
                        return Value::Bool(to_boolean(&right.evaluate(resolve)));
                    }
                    BinaryOp::Or => {
                        if to_boolean(&l) {
                            return Value::Bool(true);
                        }
                        return Value::Bool(to_boolean(&right.evaluate(resolve)));
                    }
                    _ => {}
                }
                let r = right.evaluate(resolve);
                let outcome = match op {
                    BinaryOp::Eq => values_equal(&l, &r),
                    BinaryOp::Neq => !values_equal(&l, &r),
                    BinaryOp::Gt => to_number(&l) > to_number(&r),
                    BinaryOp::Gte => to_number(&l) >= to_number(&r),
                    BinaryOp::Lt => to_number(&l) < to_number(&r),
                    BinaryOp::Lte => to_number(&l) <= to_number(&r),
                    BinaryOp::And | BinaryOp::Or => unreachable!(),
                };
                Value::Bool(outcome)
            }
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Op(BinaryOp::Eq));
                i += 2;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Op(BinaryOp::Neq));
                i += 2;
            }
            '!' => {
                tokens.push(Token::Bang);
                i += 1;
            }
            '>' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Op(BinaryOp::Gte));
                i += 2;
            }
            '>' => {
                tokens.push(Token::Op(BinaryOp::Gt));
                i += 1;
            }
            '<' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Op(BinaryOp::Lte));
                i += 2;
            }
            '<' => {
                tokens.push(Token::Op(BinaryOp::Lt));
                i += 1;
            }
            '&' if chars.get(i + 1) == Some(&'&') => {
                tokens.push(Token::Op(BinaryOp::And));
                i += 2;
            }
            '|' if chars.get(i + 1) == Some(&'|') => {
                tokens.push(Token::Op(BinaryOp::Or));
                i += 2;
            }
            '"' | '\'' => {
                let quote = c;
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != quote {
                    end += 1;
                }
                if end == chars.len() {
                    return Err(format!("unterminated string starting at offset {}", i));
                }
                tokens.push(Token::Str(chars[start..end].iter().collect()));
                i = end + 1;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number literal '{}'", text))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.as_str() {
                    "and" => tokens.push(Token::Op(BinaryOp::And)),
                    "or" => tokens.push(Token::Op(BinaryOp::Or)),
                    "not" => tokens.push(Token::Bang),
                    _ => tokens.push(Token::Ident(word)),
                }
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Op(BinaryOp::Or))) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_comparison()?;
        while matches!(self.peek(), Some(Token::Op(BinaryOp::And))) {
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, String> {
        let left = self.parse_unary()?;
        let op = match self.peek() {
            Some(Token::Op(op)) if !matches!(op, BinaryOp::And | BinaryOp::Or) => *op,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_unary()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        if matches!(self.peek(), Some(Token::Bang)) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    match self.advance() {
                        Some(Token::Ident(name)) => {
                            expr = Expr::Member(Box::new(expr), name);
                        }
                        other => return Err(format!("expected identifier after '.', got {:?}", other)),
                    }
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_or()?;
                    match self.advance() {
                        Some(Token::RBracket) => {
                            expr = Expr::Index(Box::new(expr), Box::new(index));
                        }
                        other => return Err(format!("expected ']', got {:?}", other)),
                    }
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Literal(serde_json::json!(n))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Ident(word)) => match word.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" | "undefined" => Ok(Expr::Literal(Value::Null)),
                _ => Ok(Expr::Ident(word)),
            },
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    other => Err(format!("expected ')', got {:?}", other)),
                }
            }
            other => Err(format!("expected expression, got {:?}", other)),
        }
    }
}
