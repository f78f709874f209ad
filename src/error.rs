use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while constructing a template through the builder.
#[derive(Error, Debug, Clone)]
pub enum BuildError {
    #[error("Cannot add field '{label}' without a section. Call section() first.")]
    NoActiveSection { label: String },

    #[error("Template validation failed: {0}")]
    ValidationFailed(String),

    #[error(transparent)]
    ControlFlow(#[from] ControlFlowError),
}

/// Errors raised by the control-flow engine and the builder's loop macros.
#[derive(Error, Debug, Clone)]
pub enum ControlFlowError {
    #[error("Loop exceeded maximum iterations ({limit})")]
    IterationLimitExceeded { limit: usize },

    #[error("{loop_kind} loop requires {property} property")]
    MissingLoopProperty {
        loop_kind: &'static str,
        property: &'static str,
    },
}

/// Errors raised during runtime evaluation against the scope chain.
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    #[error("Function '{0}' not found")]
    FunctionNotFound(String),

    #[error("Failed to evaluate expression '{expression}': {message}")]
    ExpressionFailed { expression: String, message: String },
}

/// Errors that can occur when reading a portable document.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to parse template document JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Classification of a non-fatal problem found in a template or document.
///
/// Mirrors the document-level taxonomy: these travel in returned issue lists
/// rather than as propagated errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    Validation,
    Parsing,
    Runtime,
    ControlFlow,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Validation => write!(f, "validation"),
            IssueKind::Parsing => write!(f, "parsing"),
            IssueKind::Runtime => write!(f, "runtime"),
            IssueKind::ControlFlow => write!(f, "controlFlow"),
        }
    }
}

/// A single non-fatal problem, with an optional path into the offending
/// document node (e.g. `sections[2].fields[0].id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateIssue {
    pub kind: IssueKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl TemplateIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(IssueKind::Validation, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(IssueKind::Runtime, message)
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for TemplateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[{}] {} (at {})", self.kind, self.message, path),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// The outcome of a validation pass: structural errors and advisory warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<TemplateIssue>,
    pub warnings: Vec<TemplateIssue>,
}

impl ValidationReport {
    pub fn new(errors: Vec<TemplateIssue>, warnings: Vec<TemplateIssue>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Joins all error messages for strict-mode failure reporting.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
