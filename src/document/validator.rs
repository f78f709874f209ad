use ahash::AHashSet;
use itertools::Itertools;

use crate::engine::ControlFlowEngine;
use crate::error::{TemplateIssue, ValidationReport};
use crate::template::{FieldType, Template};

use super::types::{ControlFlowDocument, CountDocument, TemplateDocument};

/// Structural validation for documents and parsed templates.
///
/// Always returns a report; a malformed document is a list of issues, never
/// a panic or an `Err`.
pub struct TdlValidator;

impl TdlValidator {
    pub fn validate_document(document: &TemplateDocument) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if document.metadata.name.is_empty() {
            errors.push(
                TemplateIssue::validation("Metadata.name is required").at("metadata.name"),
            );
        }
        if document.metadata.version.is_none() {
            warnings.push(
                TemplateIssue::validation("Metadata.version should be specified")
                    .at("metadata.version"),
            );
        }
        if document.metadata.description.is_none() {
            warnings.push(
                TemplateIssue::validation("Metadata.description should be provided")
                    .at("metadata.description"),
            );
        }
        if document.metadata.author.is_none() {
            warnings.push(
                TemplateIssue::validation("Metadata.author should be specified")
                    .at("metadata.author"),
            );
        }

        if document.sections.is_empty() {
            warnings.push(TemplateIssue::validation("Template has no sections").at("sections"));
        }

        for id in document
            .sections
            .iter()
            .map(|s| s.id.as_str())
            .duplicates()
        {
            errors.push(TemplateIssue::validation(format!("Duplicate section ID: {}", id)));
        }

        let known_ids: AHashSet<&str> = document
            .sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .map(|f| f.id.as_str())
            .collect();

        for (s, section) in document.sections.iter().enumerate() {
            let section_path = format!("sections[{}]", s);

            for id in section.fields.iter().map(|f| f.id.as_str()).duplicates() {
                errors.push(
                    TemplateIssue::validation(format!("Duplicate field ID: {}", id))
                        .at(section_path.clone()),
                );
            }

            if let Some(conditional) = &section.conditional {
                for dependency in conditional.dependencies() {
                    if !known_ids.contains(dependency) {
                        warnings.push(
                            TemplateIssue::validation(format!(
                                "Conditional depends on unknown field: {}",
                                dependency
                            ))
                            .at(format!("{}.conditional", section_path)),
                        );
                    }
                }
            }
            if let Some(control_flow) = &section.control_flow {
                Self::check_control_flow_document(
                    control_flow,
                    &format!("{}.controlFlow", section_path),
                    &mut errors,
                );
            }

            for (f, field) in section.fields.iter().enumerate() {
                let field_path = format!("{}.fields[{}]", section_path, f);

                if field.id.is_empty() {
                    errors.push(
                        TemplateIssue::validation("Field id is required")
                            .at(format!("{}.id", field_path)),
                    );
                }
                match FieldType::from_tag(&field.field_type) {
                    Some(field_type) => {
                        if field_type.is_choice() && field.options.is_empty() {
                            warnings.push(
                                TemplateIssue::validation(format!(
                                    "{} field should have options",
                                    field.field_type
                                ))
                                .at(format!("{}.options", field_path)),
                            );
                        }
                    }
                    None => {
                        warnings.push(
                            TemplateIssue::validation(format!(
                                "Unknown field type: {}",
                                field.field_type
                            ))
                            .at(format!("{}.type", field_path)),
                        );
                    }
                }
                if let Some(conditional) = &field.conditional {
                    for dependency in conditional.dependencies() {
                        if !known_ids.contains(dependency) {
                            warnings.push(
                                TemplateIssue::validation(format!(
                                    "Conditional depends on unknown field: {}",
                                    dependency
                                ))
                                .at(format!("{}.conditional", field_path)),
                            );
                        }
                    }
                }
                if let Some(control_flow) = &field.control_flow {
                    Self::check_control_flow_document(
                        control_flow,
                        &format!("{}.controlFlow", field_path),
                        &mut errors,
                    );
                }
            }
        }

        ValidationReport::new(errors, warnings)
    }

    fn check_control_flow_document(
        document: &ControlFlowDocument,
        path: &str,
        errors: &mut Vec<TemplateIssue>,
    ) {
        if let Some(branch) = &document.conditional {
            if branch.condition.is_empty() {
                errors.push(
                    TemplateIssue::validation("if.condition is required")
                        .at(format!("{}.if", path)),
                );
            }
        }
        if document.conditional.is_none()
            && (document.else_if.is_some() || document.else_branch.is_some())
        {
            errors.push(
                TemplateIssue::validation("elseIf/else require an if branch").at(path.to_string()),
            );
        }
        if let Some(for_each) = &document.for_each {
            if for_each.array.is_empty() {
                errors.push(
                    TemplateIssue::validation("forEach.array is required")
                        .at(format!("{}.forEach", path)),
                );
            }
            if for_each.variable.is_empty() {
                errors.push(
                    TemplateIssue::validation("forEach.variable is required")
                        .at(format!("{}.forEach", path)),
                );
            }
            if for_each.body.is_empty() {
                errors.push(
                    TemplateIssue::validation("forEach.do is required")
                        .at(format!("{}.forEach", path)),
                );
            }
        }
        if let Some(repeat) = &document.repeat {
            if let CountDocument::Expression(expression) = &repeat.count {
                if expression.is_empty() {
                    errors.push(
                        TemplateIssue::validation("repeat.count is required")
                            .at(format!("{}.repeat", path)),
                    );
                }
            }
            if repeat.body.is_empty() {
                errors.push(
                    TemplateIssue::validation("repeat.do is required")
                        .at(format!("{}.repeat", path)),
                );
            }
        }
        if let Some(while_loop) = &document.while_loop {
            if while_loop.condition.is_empty() {
                errors.push(
                    TemplateIssue::validation("while.condition is required")
                        .at(format!("{}.while", path)),
                );
            }
            if while_loop.body.is_empty() {
                errors.push(
                    TemplateIssue::validation("while.do is required")
                        .at(format!("{}.while", path)),
                );
            }
        }
    }

    pub fn validate_template(template: &Template) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if template.metadata.name.is_empty() {
            errors.push(TemplateIssue::validation("Template must have a name"));
        }
        if template.sections.is_empty() {
            warnings.push(TemplateIssue::validation("Template has no sections"));
        }

        for id in template
            .sections
            .iter()
            .map(|s| s.id.as_str())
            .duplicates()
        {
            errors.push(TemplateIssue::validation(format!("Duplicate section ID: {}", id)));
        }

        let known_ids: AHashSet<&str> = template.fields().map(|f| f.id.as_str()).collect();

        for (s, section) in template.sections.iter().enumerate() {
            let section_path = format!("sections[{}]", s);

            for id in section.fields.iter().map(|f| f.id.as_str()).duplicates() {
                errors.push(
                    TemplateIssue::validation(format!("Duplicate field ID: {}", id))
                        .at(section_path.clone()),
                );
            }
            if let Some(conditional) = &section.conditional {
                for dependency in conditional.dependencies() {
                    if !known_ids.contains(dependency) {
                        warnings.push(
                            TemplateIssue::validation(format!(
                                "Conditional depends on unknown field: {}",
                                dependency
                            ))
                            .at(format!("{}.conditional", section_path)),
                        );
                    }
                }
            }
            if let Some(control_flow) = &section.control_flow {
                for mut issue in ControlFlowEngine::validate_control_flow(control_flow) {
                    issue.path = Some(format!("{}.controlFlow", section_path));
                    errors.push(issue);
                }
            }

            for (f, field) in section.fields.iter().enumerate() {
                let field_path = format!("{}.fields[{}]", section_path, f);

                if field.id.is_empty() {
                    errors.push(
                        TemplateIssue::validation("Field must have an id").at(field_path.clone()),
                    );
                }
                if field.field_type.is_choice() && field.options.is_empty() {
                    warnings.push(
                        TemplateIssue::validation(format!(
                            "{} field should have options",
                            field.field_type
                        ))
                        .at(format!("{}.options", field_path)),
                    );
                }
                if let Some(conditional) = &field.conditional {
                    for dependency in conditional.dependencies() {
                        if !known_ids.contains(dependency) {
                            warnings.push(
                                TemplateIssue::validation(format!(
                                    "Conditional depends on unknown field: {}",
                                    dependency
                                ))
                                .at(format!("{}.conditional", field_path)),
                            );
                        }
                    }
                }
                if let Some(control_flow) = &field.control_flow {
                    for mut issue in ControlFlowEngine::validate_control_flow(control_flow) {
                        issue.path = Some(format!("{}.controlFlow", field_path));
                        errors.push(issue);
                    }
                }
            }
        }

        ValidationReport::new(errors, warnings)
    }
}
