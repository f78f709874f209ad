use serde_json::Value;

use crate::error::BuildError;
use crate::template::{
    Field, FieldOption, FieldType, GroupingConfig, Orientation, SingleCondition,
    ValidationRules, VisibilityCondition, VisibilityOperator,
};

use super::{SectionBuilder, TemplateBuilder};

/// Builds one field. Owns the parent builder; [`FieldBuilder::end`] returns
/// to the enclosing section.
pub struct FieldBuilder {
    builder: TemplateBuilder,
    section: usize,
    index: usize,
}

impl FieldBuilder {
    pub(crate) fn new(builder: TemplateBuilder, section: usize, index: usize) -> Self {
        Self {
            builder,
            section,
            index,
        }
    }

    fn field_mut(&mut self) -> &mut Field {
        &mut self.builder.template_mut().sections[self.section].fields[self.index]
    }

    fn validation_mut(&mut self) -> &mut ValidationRules {
        self.field_mut().validation.get_or_insert_with(ValidationRules::default)
    }

    /// Replaces the generated field id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.field_mut().id = id.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.field_mut().required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.field_mut().required = false;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.field_mut().placeholder = Some(placeholder.into());
        self
    }

    /// Sets the choices of a choice field. Accepts plain strings or
    /// labeled value pairs through [`FieldOption`]'s `From` impls.
    pub fn options<I, O>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<FieldOption>,
    {
        self.field_mut().options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Allows selecting more than one option.
    pub fn multiple(mut self) -> Self {
        self.field_mut().multiple = true;
        self
    }

    pub fn validation(mut self, rules: ValidationRules) -> Self {
        self.field_mut().validation = Some(rules);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.validation_mut().min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.validation_mut().max = Some(max);
        self
    }

    pub fn min_length(mut self, min_length: u64) -> Self {
        self.validation_mut().min_length = Some(min_length);
        self
    }

    pub fn max_length(mut self, max_length: u64) -> Self {
        self.validation_mut().max_length = Some(max_length);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.validation_mut().pattern = Some(pattern.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.field_mut().default_value = Some(value.into());
        self
    }

    /// Shows this field only when a single visibility triple holds.
    pub fn conditional(
        mut self,
        depends_on: impl Into<String>,
        operator: VisibilityOperator,
        values: Vec<String>,
    ) -> Self {
        self.field_mut().conditional =
            Some(SingleCondition::new(depends_on, operator, values).into());
        self
    }

    /// Attaches an arbitrary visibility condition.
    pub fn conditional_compound(mut self, condition: impl Into<VisibilityCondition>) -> Self {
        self.field_mut().conditional = Some(condition.into());
        self
    }

    pub fn layout(mut self, orientation: Orientation) -> Self {
        self.field_mut().layout = Some(orientation);
        self
    }

    pub fn grouping(mut self, grouping: GroupingConfig) -> Self {
        self.field_mut().grouping = Some(grouping);
        self
    }

    /// Adds a sibling field to the same section, closing this one.
    pub fn field(
        self,
        field_type: FieldType,
        label: impl Into<String>,
    ) -> Result<FieldBuilder, BuildError> {
        self.builder.field(field_type, label)
    }

    /// Closes the field and returns to the enclosing section.
    pub fn end(self) -> SectionBuilder {
        SectionBuilder::new(self.builder, self.section)
    }
}
