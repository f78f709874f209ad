use crate::error::BuildError;
use crate::template::{
    CompoundCondition, CompoundLogic, FieldType, SingleCondition, VisibilityCondition,
    VisibilityOperator,
};

use super::{FieldBuilder, TemplateBuilder};

/// Builds one section. Owns the parent builder and hands it back from
/// [`SectionBuilder::end`].
pub struct SectionBuilder {
    builder: TemplateBuilder,
    index: usize,
}

impl SectionBuilder {
    pub(crate) fn new(builder: TemplateBuilder, index: usize) -> Self {
        Self { builder, index }
    }

    /// Replaces the generated section id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.builder.template_mut().sections[self.index].id = id.into();
        self
    }

    /// Shows this section only when a single visibility triple holds.
    pub fn conditional(
        mut self,
        depends_on: impl Into<String>,
        operator: VisibilityOperator,
        values: Vec<String>,
    ) -> Self {
        self.builder.template_mut().sections[self.index].conditional =
            Some(SingleCondition::new(depends_on, operator, values).into());
        self
    }

    /// Shows this section when any of the given triples holds.
    pub fn conditional_or(mut self, conditions: Vec<SingleCondition>) -> Self {
        self.builder.template_mut().sections[self.index].conditional =
            Some(compound(CompoundLogic::Or, conditions));
        self
    }

    /// Shows this section only when all of the given triples hold.
    pub fn conditional_and(mut self, conditions: Vec<SingleCondition>) -> Self {
        self.builder.template_mut().sections[self.index].conditional =
            Some(compound(CompoundLogic::And, conditions));
        self
    }

    /// Attaches an arbitrary, possibly nested, visibility condition.
    pub fn conditional_compound(mut self, condition: impl Into<VisibilityCondition>) -> Self {
        self.builder.template_mut().sections[self.index].conditional = Some(condition.into());
        self
    }

    /// Lets respondents mark the whole section as not applicable.
    pub fn naable(mut self) -> Self {
        self.builder.template_mut().sections[self.index].naable = true;
        self
    }

    /// Adds a field to this section.
    pub fn field(
        self,
        field_type: FieldType,
        label: impl Into<String>,
    ) -> Result<FieldBuilder, BuildError> {
        self.builder.field(field_type, label)
    }

    /// Closes the section and returns the parent builder. The section stays
    /// current, so a following `field()` call still lands in it.
    pub fn end(self) -> TemplateBuilder {
        self.builder
    }
}

fn compound(logic: CompoundLogic, conditions: Vec<SingleCondition>) -> VisibilityCondition {
    CompoundCondition {
        logic,
        conditions: conditions.into_iter().map(Into::into).collect(),
    }
    .into()
}
