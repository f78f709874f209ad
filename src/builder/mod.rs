//! Fluent, programmatic template construction.
//!
//! The builder is eager: loops and conditionals run at construction time and
//! bake their output into the template, in contrast to the declarative
//! control flow that [`crate::engine::ControlFlowEngine`] executes later.
//! Sub-builders take the parent by value and hand it back from `end()`, so a
//! chain reads top to bottom without intermediate bindings:
//!
//! ```
//! use formdef::prelude::*;
//!
//! let template = TemplateBuilder::default()
//!     .create("Contact")
//!     .section("Details")
//!     .field(FieldType::Text, "Name")?
//!     .required()
//!     .end()
//!     .end()
//!     .build()?;
//! assert_eq!(template.field_count(), 1);
//! # Ok::<(), formdef::error::BuildError>(())
//! ```

mod conditional;
mod field;
mod section;

pub use conditional::ConditionalBuilder;
pub use field::FieldBuilder;
pub use section::SectionBuilder;

use ahash::AHashMap;
use chrono::Utc;
use log::warn;
use serde_json::Value;

use crate::condition::{ConditionEvaluator, IntoCondition};
use crate::error::{BuildError, ControlFlowError, TemplateIssue, ValidationReport};
use crate::scope::{ScopeChain, TemplateFn};
use crate::template::{
    ArraySource, Field, FieldType, Section, StylingPatch, Template, ValidationMode,
};

const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Construction-time options for [`TemplateBuilder`].
#[derive(Debug, Clone)]
pub struct BuilderOptions {
    /// Turn validation errors at build time into hard failures.
    pub strict: bool,
    /// Run [`TemplateBuilder::validate`] inside [`TemplateBuilder::build`].
    pub validate_on_build: bool,
    /// Mark new fields required unless overridden.
    pub default_required: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            strict: false,
            validate_on_build: true,
            default_required: false,
        }
    }
}

/// Fluent builder over a [`Template`] under construction.
pub struct TemplateBuilder {
    template: Template,
    options: BuilderOptions,
    scopes: ScopeChain,
    current_section: Option<usize>,
    next_section: usize,
    next_field: usize,
    max_iterations: usize,
    iterations: usize,
}

impl Default for TemplateBuilder {
    fn default() -> Self {
        Self::new(BuilderOptions::default())
    }
}

impl TemplateBuilder {
    pub fn new(options: BuilderOptions) -> Self {
        Self {
            template: Template::default(),
            options,
            scopes: ScopeChain::new(),
            current_section: None,
            next_section: 1,
            next_field: 1,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            iterations: 0,
        }
    }

    /// Overrides the shared iteration ceiling for the eager loop macros.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    // Metadata and schema. These only mutate; validation happens at build.

    pub fn create(mut self, name: impl Into<String>) -> Self {
        self.template.metadata.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.template.metadata.description = description.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.template.metadata.version = version.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.template.metadata.author = author.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template.metadata.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Declares template variables. They become available to the eager
    /// control-flow macros immediately and are carried on the template.
    pub fn variables(mut self, variables: AHashMap<String, Value>) -> Self {
        for (name, value) in &variables {
            self.scopes.set_variable(name.clone(), value.clone());
        }
        self.template.variables.extend(variables);
        self
    }

    pub fn schema(mut self, validation: ValidationMode) -> Self {
        self.template.schema.validation = validation;
        self
    }

    pub fn required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template.schema.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Inherits from a parent template: records the lineage, copies its
    /// sections, and merges its variables without overriding ones already
    /// declared here.
    pub fn extend(mut self, parent: &Template) -> Self {
        self.template.metadata.extends = Some(parent.metadata.name.clone());
        self.template.sections.extend(parent.sections.iter().cloned());
        for (name, value) in &parent.variables {
            if !self.template.variables.contains_key(name) {
                self.template.variables.insert(name.clone(), value.clone());
                self.scopes.set_variable(name.clone(), value.clone());
            }
        }
        if self.current_section.is_none() && !self.template.sections.is_empty() {
            self.current_section = Some(self.template.sections.len() - 1);
        }
        self
    }

    // Structure.

    /// Opens a new section and makes it current. The generated id can be
    /// overridden through [`SectionBuilder::id`].
    pub fn section(mut self, title: impl Into<String>) -> SectionBuilder {
        let id = format!("section_{}", self.next_section);
        self.next_section += 1;
        self.template.sections.push(Section::new(id, title));
        let index = self.template.sections.len() - 1;
        self.current_section = Some(index);
        SectionBuilder::new(self, index)
    }

    /// Adds a field to the current section. Fails before any mutation when no
    /// section has been opened yet.
    pub fn field(
        mut self,
        field_type: FieldType,
        label: impl Into<String>,
    ) -> Result<FieldBuilder, BuildError> {
        let label = label.into();
        let section = self
            .current_section
            .ok_or_else(|| BuildError::NoActiveSection {
                label: label.clone(),
            })?;
        let id = format!("field_{}", self.next_field);
        self.next_field += 1;
        let mut field = Field::new(id, field_type, label);
        field.required = self.options.default_required;
        self.template.sections[section].fields.push(field);
        let index = self.template.sections[section].fields.len() - 1;
        Ok(FieldBuilder::new(self, section, index))
    }

    // Eager control flow. These run now, against the live scope chain, and
    // bake their output into the template.

    /// Runs the callback once per array element. The source is either a
    /// variable name resolved against the scope chain or a literal array; a
    /// named source that is not an array logs and adds nothing. The callback
    /// takes the builder by value so the full fluent API is available inside
    /// the body, with `item`, `index` and `length` bound in a fresh scope.
    pub fn for_each<A, F>(mut self, array: A, mut body: F) -> Result<Self, BuildError>
    where
        A: Into<ArraySource>,
        F: FnMut(TemplateBuilder, &Value, usize) -> TemplateBuilder,
    {
        let items = match array.into() {
            ArraySource::Literal(items) => items,
            ArraySource::Name(name) => match self.scopes.get_variable(&name) {
                Some(Value::Array(items)) => items,
                _ => {
                    warn!("forEach source '{}' is not an array, skipping", name);
                    return Ok(self);
                }
            },
        };

        let length = items.len();
        for (index, item) in items.into_iter().enumerate() {
            self.check_iteration_limit()?;
            let mut seed = AHashMap::new();
            seed.insert("item".to_string(), item.clone());
            seed.insert("index".to_string(), Value::from(index));
            seed.insert("length".to_string(), Value::from(length));
            self.scopes.enter_scope(seed);
            self = body(self, &item, index);
            self.scopes.exit_scope();
        }
        Ok(self)
    }

    /// Runs the callback `count` times with `index` and `count` bound in a
    /// fresh scope. A negative count logs and adds nothing.
    pub fn repeat<F>(mut self, count: i64, mut body: F) -> Result<Self, BuildError>
    where
        F: FnMut(TemplateBuilder, i64) -> TemplateBuilder,
    {
        if count < 0 {
            warn!("repeat count {} is negative, skipping", count);
            return Ok(self);
        }
        for index in 0..count {
            self.check_iteration_limit()?;
            let mut seed = AHashMap::new();
            seed.insert("index".to_string(), Value::from(index));
            seed.insert("count".to_string(), Value::from(count));
            self.scopes.enter_scope(seed);
            self = body(self, index);
            self.scopes.exit_scope();
        }
        Ok(self)
    }

    /// Runs the callback while the condition holds against the live scope
    /// chain, with `iteration` bound in a fresh scope. Exceeding the
    /// iteration ceiling is a hard error.
    pub fn while_loop<C, F>(mut self, condition: C, mut body: F) -> Result<Self, BuildError>
    where
        C: IntoCondition,
        F: FnMut(TemplateBuilder) -> TemplateBuilder,
    {
        let condition = condition.into_condition();
        let mut iteration: i64 = 0;
        while ConditionEvaluator::new(&self.scopes).evaluate(&condition) {
            self.check_iteration_limit()?;
            let mut seed = AHashMap::new();
            seed.insert("iteration".to_string(), Value::from(iteration));
            self.scopes.enter_scope(seed);
            self = body(self);
            self.scopes.exit_scope();
            iteration += 1;
        }
        Ok(self)
    }

    /// Opens an eager conditional. Branches collect until
    /// [`ConditionalBuilder::endif`], which evaluates them against the live
    /// scope chain and runs at most one body.
    pub fn when<C: IntoCondition>(self, condition: C) -> ConditionalBuilder {
        ConditionalBuilder::new(self, condition.into_condition())
    }

    // Behavior and styling.

    pub fn auto_save(mut self, interval: u64) -> Self {
        self.template.behavior.auto_save = true;
        self.template.behavior.auto_save_interval = Some(interval);
        self
    }

    pub fn show_progress(mut self) -> Self {
        self.template.behavior.show_progress = true;
        self
    }

    pub fn styling(mut self, patch: StylingPatch) -> Self {
        self.template.styling.apply(patch);
        self
    }

    /// Registers a function callable from `callFunction` actions and
    /// `Function` conditions during eager control flow.
    pub fn register_function(mut self, name: impl Into<String>, func: TemplateFn) -> Self {
        self.scopes.register_function(name, func);
        self
    }

    /// Sets a variable on the live scope chain without recording it on the
    /// template. Used by conditional branches and loop bodies.
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.scopes.set_variable(name, value);
    }

    pub fn scopes(&self) -> &ScopeChain {
        &self.scopes
    }

    /// Finalizes the template. With `validate_on_build`, an invalid template
    /// is a hard error under `strict` and a logged warning otherwise.
    pub fn build(mut self) -> Result<Template, BuildError> {
        self.template.metadata.updated = Utc::now();

        if self.options.validate_on_build {
            let report = self.validate();
            if !report.valid {
                if self.options.strict {
                    return Err(BuildError::ValidationFailed(report.error_summary()));
                }
                for issue in &report.errors {
                    warn!("Template validation: {}", issue);
                }
            }
            for issue in &report.warnings {
                warn!("Template validation: {}", issue);
            }
        }

        Ok(self.template)
    }

    /// Validates the template under construction. Errors block a strict
    /// build; warnings never do.
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.template.metadata.name.is_empty() {
            errors.push(TemplateIssue::validation("Template must have a name"));
        }
        if self.template.sections.is_empty() {
            warnings.push(TemplateIssue::validation("Template has no sections"));
        }
        for (s, section) in self.template.sections.iter().enumerate() {
            if section.fields.is_empty() {
                warnings.push(
                    TemplateIssue::validation(format!("Section '{}' has no fields", section.title))
                        .at(format!("sections[{}]", s)),
                );
            }
            for (f, field) in section.fields.iter().enumerate() {
                if field.id.is_empty() {
                    errors.push(
                        TemplateIssue::validation("Field must have an id")
                            .at(format!("sections[{}].fields[{}]", s, f)),
                    );
                }
            }
        }

        ValidationReport::new(errors, warnings)
    }

    pub(crate) fn template_mut(&mut self) -> &mut Template {
        &mut self.template
    }

    pub(crate) fn options(&self) -> &BuilderOptions {
        &self.options
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
