use chrono::Utc;
use log::warn;
use serde_json::Value;

use crate::condition::ConditionEvaluator;
use crate::error::ParseError;
use crate::template::{
    ArraySource, BehaviorConfig, ConditionalBlock, ControlFlowConfig, CountSource, ElseIfBranch,
    Field, FieldType, ForEachClause, LoopBlock, LoopKind, RepeatClause, Section, StylingConfig,
    Template, TemplateAction, TemplateMetadata, TemplateSchema, ValidationRules, WhileClause,
};

use super::types::{
    ActionDocument, ActionPayload, BehaviorDocument, ControlFlowDocument, CountDocument,
    ElseDocument, FieldDocument, ForEachDocument, IfBranchDocument, MetadataDocument,
    RepeatDocument, SchemaDocument, SectionDocument, StylingDocument, TemplateDocument,
    ValidationDocument, WhileDocument,
};

/// Converts between documents and in-memory templates.
///
/// Parsing is total: missing optional fields fall back to documented
/// defaults and unknown field types degrade to text with a warning.
/// Serialization omits values that match the defaults, and drops the parts
/// that have no document form (custom validation predicates, function
/// conditions).
pub struct TdlParser;

impl TdlParser {
    pub fn parse(document: &TemplateDocument) -> Template {
        let now = Utc::now();
        Template {
            metadata: TemplateMetadata {
                name: document.metadata.name.clone(),
                version: document
                    .metadata
                    .version
                    .clone()
                    .unwrap_or_else(|| "1.0.0".to_string()),
                description: document.metadata.description.clone().unwrap_or_default(),
                author: document
                    .metadata
                    .author
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
                tags: document.metadata.tags.clone(),
                extends: document.metadata.extends.clone(),
                created: now,
                updated: now,
            },
            schema: match &document.schema {
                Some(schema) => TemplateSchema {
                    validation: schema.validation,
                    required_fields: schema.required_fields.clone(),
                },
                None => TemplateSchema::default(),
            },
            sections: document.sections.iter().map(Self::parse_section).collect(),
            styling: match &document.styling {
                Some(styling) => {
                    let mut config = StylingConfig::default();
                    if let Some(theme) = &styling.theme {
                        config.theme = theme.clone();
                    }
                    if let Some(layout) = styling.layout {
                        config.layout = layout;
                    }
                    if let Some(spacing) = styling.spacing {
                        config.spacing = spacing;
                    }
                    config.colors = styling.colors.clone();
                    config.animations = styling.animations;
                    config.conditional_styling = styling.conditional_styling.clone();
                    config
                }
                None => StylingConfig::default(),
            },
            behavior: match &document.behavior {
                Some(behavior) => BehaviorConfig {
                    auto_save: behavior.auto_save,
                    auto_save_interval: behavior.auto_save_interval,
                    show_progress: behavior.show_progress,
                },
                None => BehaviorConfig::default(),
            },
            variables: document.variables.clone(),
        }
    }

    /// Parses a JSON document. The only hard failure in the document layer;
    /// everything past the JSON boundary degrades instead.
    pub fn parse_json(json: &str) -> Result<Template, ParseError> {
        let document: TemplateDocument = serde_json::from_str(json)?;
        Ok(Self::parse(&document))
    }

    fn parse_section(document: &SectionDocument) -> Section {
        Section {
            id: document.id.clone(),
            title: document.title.clone(),
            fields: document.fields.iter().map(Self::parse_field).collect(),
            conditional: document.conditional.clone(),
            control_flow: document.control_flow.as_ref().map(Self::parse_control_flow),
            naable: document.naable,
        }
    }

    fn parse_field(document: &FieldDocument) -> Field {
        Field {
            id: document.id.clone(),
            field_type: FieldType::parse(&document.field_type),
            label: document.label.clone(),
            placeholder: document.placeholder.clone(),
            required: document.required,
            options: document.options.clone(),
            multiple: document.multiple,
            validation: document.validation.as_ref().map(|rules| ValidationRules {
                min: rules.min,
                max: rules.max,
                min_length: rules.min_length,
                max_length: rules.max_length,
                pattern: rules.pattern.clone(),
                custom: None,
            }),
            conditional: document.conditional.clone(),
            default_value: document.default_value.clone(),
            layout: document.layout,
            grouping: document.grouping.clone(),
            control_flow: document.control_flow.as_ref().map(Self::parse_control_flow),
        }
    }

    fn parse_control_flow(document: &ControlFlowDocument) -> ControlFlowConfig {
        let mut config = ControlFlowConfig::default();

        // elseIf/else only attach to a present if branch.
        if let Some(branch) = &document.conditional {
            let mut block =
                ConditionalBlock::new(ConditionEvaluator::parse_condition_string(&branch.condition));
            block.then = Self::parse_actions(&branch.then);
            block.else_if = document.else_if.as_ref().map(|branches| {
                branches
                    .iter()
                    .map(|branch| ElseIfBranch {
                        condition: ConditionEvaluator::parse_condition_string(&branch.condition),
                        then: Self::parse_actions(&branch.then),
                    })
                    .collect()
            });
            block.else_actions = document
                .else_branch
                .as_ref()
                .map(|branch| Self::parse_actions(branch.actions()));
            config.conditional = Some(block);
        }

        if let Some(for_each) = &document.for_each {
            config.for_each = Some(ForEachClause {
                array: Self::parse_array_source(&for_each.array),
                variable: for_each.variable.clone(),
                body: Self::parse_actions(&for_each.body),
            });
        }

        if let Some(repeat) = &document.repeat {
            config.repeat = Some(RepeatClause {
                count: match &repeat.count {
                    CountDocument::Literal(count) => CountSource::Literal(*count),
                    CountDocument::Expression(expression) => {
                        CountSource::Expression(expression.clone())
                    }
                },
                variable: repeat.variable.clone(),
                body: Self::parse_actions(&repeat.body),
            });
        }

        if let Some(while_loop) = &document.while_loop {
            config.while_loop = Some(WhileClause {
                condition: ConditionEvaluator::parse_condition_string(&while_loop.condition),
                body: Self::parse_actions(&while_loop.body),
            });
        }

        config
    }

    /// An array source written as a JSON array literal is inlined; anything
    /// else is a variable name resolved at run time.
    fn parse_array_source(text: &str) -> ArraySource {
        let trimmed = text.trim();
        if trimmed.starts_with('[') {
            match serde_json::from_str::<Vec<Value>>(trimmed) {
                Ok(items) => return ArraySource::Literal(items),
                Err(err) => warn!("Array literal '{}' failed to parse: {}", trimmed, err),
            }
        }
        ArraySource::Name(text.to_string())
    }

    fn parse_actions(documents: &[ActionDocument]) -> Vec<TemplateAction> {
        documents.iter().flat_map(Self::parse_action).collect()
    }

    fn parse_action(document: &ActionDocument) -> Vec<TemplateAction> {
        match document {
            ActionDocument::Field(field) => {
                vec![TemplateAction::CreateField(Self::parse_field(field))]
            }
            ActionDocument::ControlFlow(nested) => {
                Self::config_to_actions(Self::parse_control_flow(nested))
            }
            ActionDocument::Action(payload) => vec![match payload {
                ActionPayload::SetVariable { name, value } => TemplateAction::SetVariable {
                    name: name.clone(),
                    value: value.clone(),
                },
                ActionPayload::CallFunction {
                    name,
                    args,
                    return_variable,
                } => TemplateAction::CallFunction {
                    name: name.clone(),
                    args: args.clone(),
                    return_variable: return_variable.clone(),
                },
                ActionPayload::CreateField { data } => {
                    TemplateAction::CreateField(Self::parse_field(data))
                }
                ActionPayload::CreateSection { data } => {
                    TemplateAction::CreateSection(Self::parse_section(data))
                }
            }],
        }
    }

    /// Flattens a nested control-flow config into standalone actions.
    fn config_to_actions(config: ControlFlowConfig) -> Vec<TemplateAction> {
        let mut actions = Vec::new();
        if let Some(block) = config.conditional {
            actions.push(TemplateAction::Conditional(block));
        }
        if let Some(clause) = config.for_each {
            actions.push(TemplateAction::Loop(LoopBlock {
                kind: LoopKind::ForEach,
                array: Some(clause.array),
                count: None,
                condition: None,
                variable: Some(clause.variable),
                body: clause.body,
            }));
        }
        if let Some(clause) = config.repeat {
            actions.push(TemplateAction::Loop(LoopBlock {
                kind: LoopKind::Repeat,
                array: None,
                count: Some(clause.count),
                condition: None,
                variable: clause.variable,
                body: clause.body,
            }));
        }
        if let Some(clause) = config.while_loop {
            actions.push(TemplateAction::Loop(LoopBlock {
                kind: LoopKind::While,
                array: None,
                count: None,
                condition: Some(clause.condition),
                variable: None,
                body: clause.body,
            }));
        }
        actions
    }

    pub fn serialize(template: &Template) -> TemplateDocument {
        TemplateDocument {
            metadata: MetadataDocument {
                name: template.metadata.name.clone(),
                version: Some(template.metadata.version.clone()),
                description: Some(template.metadata.description.clone()),
                author: Some(template.metadata.author.clone()),
                tags: template.metadata.tags.clone(),
                extends: template.metadata.extends.clone(),
            },
            variables: template.variables.clone(),
            schema: if template.schema.validation != Default::default()
                || !template.schema.required_fields.is_empty()
            {
                Some(SchemaDocument {
                    validation: template.schema.validation,
                    required_fields: template.schema.required_fields.clone(),
                })
            } else {
                None
            },
            sections: template.sections.iter().map(Self::serialize_section).collect(),
            behavior: if template.behavior.auto_save || template.behavior.show_progress {
                Some(BehaviorDocument {
                    auto_save: template.behavior.auto_save,
                    auto_save_interval: template.behavior.auto_save_interval,
                    show_progress: template.behavior.show_progress,
                })
            } else {
                None
            },
            styling: Self::serialize_styling(&template.styling),
        }
    }

    pub fn to_json_pretty(template: &Template) -> Result<String, ParseError> {
        Ok(serde_json::to_string_pretty(&Self::serialize(template))?)
    }

    fn serialize_styling(styling: &StylingConfig) -> Option<StylingDocument> {
        let defaults = StylingConfig::default();
        if styling.theme == defaults.theme
            && styling.layout == defaults.layout
            && styling.spacing == defaults.spacing
            && styling.colors.is_empty()
            && !styling.animations
            && styling.conditional_styling.is_empty()
        {
            return None;
        }
        Some(StylingDocument {
            theme: Some(styling.theme.clone()),
            layout: Some(styling.layout),
            spacing: Some(styling.spacing),
            colors: styling.colors.clone(),
            animations: styling.animations,
            conditional_styling: styling.conditional_styling.clone(),
        })
    }

    fn serialize_section(section: &Section) -> SectionDocument {
        SectionDocument {
            id: section.id.clone(),
            title: section.title.clone(),
            fields: section.fields.iter().map(Self::serialize_field).collect(),
            conditional: section.conditional.clone(),
            control_flow: section.control_flow.as_ref().map(Self::serialize_control_flow),
            naable: section.naable,
        }
    }

    fn serialize_field(field: &Field) -> FieldDocument {
        FieldDocument {
            id: field.id.clone(),
            field_type: field.field_type.tag().to_string(),
            label: field.label.clone(),
            placeholder: field.placeholder.clone(),
            required: field.required,
            options: field.options.clone(),
            multiple: field.multiple,
            validation: field.validation.as_ref().and_then(|rules| {
                let document = ValidationDocument {
                    min: rules.min,
                    max: rules.max,
                    min_length: rules.min_length,
                    max_length: rules.max_length,
                    pattern: rules.pattern.clone(),
                };
                if document.is_empty() { None } else { Some(document) }
            }),
            conditional: field.conditional.clone(),
            default_value: field.default_value.clone(),
            layout: field.layout,
            grouping: field.grouping.clone(),
            control_flow: field.control_flow.as_ref().map(Self::serialize_control_flow),
        }
    }

    fn serialize_control_flow(config: &ControlFlowConfig) -> ControlFlowDocument {
        let mut document = ControlFlowDocument::default();

        if let Some(block) = &config.conditional {
            document.conditional = Some(IfBranchDocument {
                condition: ConditionEvaluator::serialize_condition(&block.condition),
                then: Self::serialize_actions(&block.then),
            });
            document.else_if = block.else_if.as_ref().map(|branches| {
                branches
                    .iter()
                    .map(|branch| IfBranchDocument {
                        condition: ConditionEvaluator::serialize_condition(&branch.condition),
                        then: Self::serialize_actions(&branch.then),
                    })
                    .collect()
            });
            document.else_branch = block
                .else_actions
                .as_ref()
                .map(|actions| ElseDocument::Actions(Self::serialize_actions(actions)));
        }

        if let Some(for_each) = &config.for_each {
            document.for_each = Some(ForEachDocument {
                array: match &for_each.array {
                    ArraySource::Name(name) => name.clone(),
                    ArraySource::Literal(items) => Value::Array(items.clone()).to_string(),
                },
                variable: for_each.variable.clone(),
                body: Self::serialize_actions(&for_each.body),
            });
        }

        if let Some(repeat) = &config.repeat {
            document.repeat = Some(RepeatDocument {
                count: match &repeat.count {
                    CountSource::Literal(count) => CountDocument::Literal(*count),
                    CountSource::Expression(expression) => {
                        CountDocument::Expression(expression.clone())
                    }
                },
                variable: repeat.variable.clone(),
                body: Self::serialize_actions(&repeat.body),
            });
        }

        if let Some(while_loop) = &config.while_loop {
            document.while_loop = Some(WhileDocument {
                condition: ConditionEvaluator::serialize_condition(&while_loop.condition),
                body: Self::serialize_actions(&while_loop.body),
            });
        }

        document
    }

    fn serialize_actions(actions: &[TemplateAction]) -> Vec<ActionDocument> {
        actions.iter().map(Self::serialize_action).collect()
    }

    fn serialize_action(action: &TemplateAction) -> ActionDocument {
        match action {
            TemplateAction::CreateField(field) => {
                ActionDocument::Field(Self::serialize_field(field))
            }
            TemplateAction::CreateSection(section) => {
                ActionDocument::Action(ActionPayload::CreateSection {
                    data: Self::serialize_section(section),
                })
            }
            TemplateAction::SetVariable { name, value } => {
                ActionDocument::Action(ActionPayload::SetVariable {
                    name: name.clone(),
                    value: value.clone(),
                })
            }
            TemplateAction::CallFunction {
                name,
                args,
                return_variable,
            } => ActionDocument::Action(ActionPayload::CallFunction {
                name: name.clone(),
                args: args.clone(),
                return_variable: return_variable.clone(),
            }),
            TemplateAction::Conditional(block) => {
                let config = ControlFlowConfig {
                    conditional: Some(block.clone()),
                    ..ControlFlowConfig::default()
                };
                ActionDocument::ControlFlow(Box::new(Self::serialize_control_flow(&config)))
            }
            TemplateAction::Loop(block) => {
                let mut config = ControlFlowConfig::default();
                match block.kind {
                    LoopKind::ForEach => {
                        config.for_each = Some(ForEachClause {
                            array: block.array.clone().unwrap_or(ArraySource::Name(String::new())),
                            variable: block.variable.clone().unwrap_or_default(),
                            body: block.body.clone(),
                        });
                    }
                    LoopKind::Repeat => {
                        config.repeat = Some(RepeatClause {
                            count: block.count.clone().unwrap_or(CountSource::Literal(0)),
                            variable: block.variable.clone(),
                            body: block.body.clone(),
                        });
                    }
                    LoopKind::While => {
                        config.while_loop = Some(WhileClause {
                            condition: block
                                .condition
                                .clone()
                                .unwrap_or(crate::template::Condition::Expression(String::new())),
                            body: block.body.clone(),
                        });
                    }
                }
                ActionDocument::ControlFlow(Box::new(Self::serialize_control_flow(&config)))
            }
        }
    }
}
