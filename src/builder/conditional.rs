use crate::condition::{ConditionEvaluator, IntoCondition};
use crate::template::Condition;

use super::TemplateBuilder;

type Body = Box<dyn FnOnce(TemplateBuilder) -> TemplateBuilder>;

/// Collects the branches of an eager conditional. Nothing runs until
/// [`ConditionalBuilder::endif`], which evaluates the conditions against the
/// live scope chain and applies at most one body to the builder.
pub struct ConditionalBuilder {
    builder: TemplateBuilder,
    branches: Vec<(Condition, Option<Body>)>,
    otherwise: Option<Body>,
}

impl ConditionalBuilder {
    pub(crate) fn new(builder: TemplateBuilder, condition: Condition) -> Self {
        Self {
            builder,
            branches: vec![(condition, None)],
            otherwise: None,
        }
    }

    /// Sets the body of the most recently opened branch.
    pub fn then<F>(mut self, body: F) -> Self
    where
        F: FnOnce(TemplateBuilder) -> TemplateBuilder + 'static,
    {
        if let Some(branch) = self.branches.last_mut() {
            branch.1 = Some(Box::new(body));
        }
        self
    }

    /// Opens another branch tried when every earlier one failed.
    pub fn else_if<C: IntoCondition>(mut self, condition: C) -> Self {
        self.branches.push((condition.into_condition(), None));
        self
    }

    /// Sets the fallback body. It only runs when no `else_if` branch was
    /// declared at all; with branches present, a failed chain falls through
    /// to nothing. Longstanding quirk, kept for compatibility with existing
    /// templates.
    pub fn otherwise<F>(mut self, body: F) -> Self
    where
        F: FnOnce(TemplateBuilder) -> TemplateBuilder + 'static,
    {
        self.otherwise = Some(Box::new(body));
        self
    }

    /// Evaluates the collected branches and returns the parent builder.
    pub fn endif(self) -> TemplateBuilder {
        let ConditionalBuilder {
            mut builder,
            branches,
            otherwise,
        } = self;

        let has_else_if = branches.len() > 1;
        let mut branches = branches.into_iter();

        let (condition, body) = match branches.next() {
            Some(first) => first,
            None => return builder,
        };
        if ConditionEvaluator::new(builder.scopes()).evaluate(&condition) {
            if let Some(body) = body {
                builder = body(builder);
            }
            return builder;
        }

        if has_else_if {
            for (condition, body) in branches {
                if ConditionEvaluator::new(builder.scopes()).evaluate(&condition) {
                    if let Some(body) = body {
                        builder = body(builder);
                    }
                    return builder;
                }
            }
            return builder;
        }

        if let Some(body) = otherwise {
            builder = body(builder);
        }
        builder
    }
}
