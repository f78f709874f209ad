//! Lossy conversion between templates and the flat GUI render model.
//!
//! The GUI model carries no variables, functions, or control flow, so
//! conversion in that direction drops them and says so through warnings.
//! Conversion never fails hard; a problem is an entry in the result's error
//! list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::ValidationDocument;
use crate::error::TemplateIssue;
use crate::template::{
    Field, FieldOption, FieldType, Section, Template, TemplateMetadata, TemplateSchema,
    ValidationMode, ValidationRules, VisibilityCondition,
};

/// Field types the GUI can render. `Range` has no counterpart and maps to
/// `Number` on the way out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuiFieldType {
    #[default]
    Text,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Number,
    Date,
    File,
    Email,
    Tel,
}

impl GuiFieldType {
    fn from_field_type(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Text => GuiFieldType::Text,
            FieldType::Textarea => GuiFieldType::Textarea,
            FieldType::Select => GuiFieldType::Select,
            FieldType::Radio => GuiFieldType::Radio,
            FieldType::Checkbox => GuiFieldType::Checkbox,
            FieldType::Number | FieldType::Range => GuiFieldType::Number,
            FieldType::Date => GuiFieldType::Date,
            FieldType::File => GuiFieldType::File,
            FieldType::Email => GuiFieldType::Email,
            FieldType::Tel => GuiFieldType::Tel,
        }
    }

    fn to_field_type(self) -> FieldType {
        match self {
            GuiFieldType::Text => FieldType::Text,
            GuiFieldType::Textarea => FieldType::Textarea,
            GuiFieldType::Select => FieldType::Select,
            GuiFieldType::Radio => FieldType::Radio,
            GuiFieldType::Checkbox => FieldType::Checkbox,
            GuiFieldType::Number => FieldType::Number,
            GuiFieldType::Date => FieldType::Date,
            GuiFieldType::File => FieldType::File,
            GuiFieldType::Email => FieldType::Email,
            GuiFieldType::Tel => FieldType::Tel,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuiField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: GuiFieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<VisibilityCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuiSection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub fields: Vec<GuiField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<VisibilityCondition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuiTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sections: Vec<GuiSection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Options shared by both conversion directions. Unknown keys in a document
/// are ignored.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionOptions {
    /// Keep existing ids instead of generating fresh ones.
    pub preserve_ids: bool,
    /// Infer descriptive tags from the GUI structure.
    pub generate_metadata: bool,
    /// Converted templates get strict schema validation.
    pub strict: bool,
    /// Keep control-flow-bearing sections and fields instead of skipping
    /// them.
    pub include_control_flow: bool,
}

/// Outcome of a conversion: the value when it succeeded, plus everything
/// noteworthy that happened on the way.
#[derive(Debug, Clone)]
pub struct ConversionResult<T> {
    pub success: bool,
    pub result: Option<T>,
    pub errors: Vec<TemplateIssue>,
    pub warnings: Vec<TemplateIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompatibilityReport {
    pub compatible: bool,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionStats {
    pub sections: usize,
    pub fields: usize,
    pub conditional_fields: usize,
    pub conditional_sections: usize,
    pub complexity: Complexity,
}

/// Converts between [`Template`]s and the GUI render model. Generated ids
/// come from a per-converter counter, so repeated conversions with one
/// converter never collide.
#[derive(Default)]
pub struct RenderConverter {
    next_id: usize,
}

impl RenderConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn convert_to_gui(
        &mut self,
        template: &Template,
        options: &ConversionOptions,
    ) -> ConversionResult<GuiTemplate> {
        let mut warnings = Vec::new();

        let mut sections = Vec::new();
        for section in &template.sections {
            if section.control_flow.is_some() && !options.include_control_flow {
                warnings.push(TemplateIssue::validation(format!(
                    "Section '{}' has control flow logic that will be skipped",
                    section.title
                )));
                continue;
            }
            sections.push(self.section_to_gui(section, options, &mut warnings));
        }

        if !template.variables.is_empty() {
            warnings.push(TemplateIssue::validation(
                "Template variables will be lost in GUI conversion",
            ));
        }
        if template.sections.iter().any(|s| s.control_flow.is_some()) {
            warnings.push(TemplateIssue::validation(
                "Control flow logic will be lost in GUI conversion",
            ));
        }

        let gui = GuiTemplate {
            id: if options.preserve_ids {
                template.metadata.name.clone()
            } else {
                self.generate_id("template")
            },
            name: template.metadata.name.clone(),
            description: template.metadata.description.clone(),
            sections,
            created_at: template.metadata.created,
            updated_at: template.metadata.updated,
        };

        ConversionResult {
            success: true,
            result: Some(gui),
            errors: Vec::new(),
            warnings,
        }
    }

    pub fn convert_from_gui(
        &mut self,
        gui: &GuiTemplate,
        options: &ConversionOptions,
    ) -> ConversionResult<Template> {
        let mut metadata = TemplateMetadata {
            name: gui.name.clone(),
            version: "1.0.0".to_string(),
            description: gui.description.clone(),
            author: "gui-converter".to_string(),
            tags: vec!["converted".to_string(), "gui".to_string()],
            extends: None,
            created: gui.created_at,
            updated: gui.updated_at,
        };
        if options.generate_metadata {
            metadata.tags.extend(Self::generate_tags(gui));
        }

        let template = Template {
            metadata,
            schema: TemplateSchema {
                validation: if options.strict {
                    ValidationMode::Strict
                } else {
                    ValidationMode::Loose
                },
                required_fields: Self::required_field_ids(gui),
            },
            sections: gui
                .sections
                .iter()
                .map(|section| self.section_from_gui(section, options))
                .collect(),
            styling: Default::default(),
            behavior: Default::default(),
            variables: Default::default(),
        };

        ConversionResult {
            success: true,
            result: Some(template),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Flags GUI features that convert poorly: outsized validation patterns
    /// and very long option lists.
    pub fn check_compatibility(gui: &GuiTemplate) -> CompatibilityReport {
        let mut issues = Vec::new();

        for field in gui.sections.iter().flat_map(|s| s.fields.iter()) {
            if let Some(validation) = &field.validation {
                if validation.pattern.as_ref().is_some_and(|p| p.len() > 50) {
                    issues.push(format!("Field '{}' has complex validation pattern", field.label));
                }
            }
            if field.options.len() > 20 {
                issues.push(format!(
                    "Field '{}' has many options ({})",
                    field.label,
                    field.options.len()
                ));
            }
        }

        CompatibilityReport {
            compatible: issues.is_empty(),
            issues,
        }
    }

    pub fn conversion_stats(gui: &GuiTemplate) -> ConversionStats {
        let fields = gui.sections.iter().map(|s| s.fields.len()).sum::<usize>();
        ConversionStats {
            sections: gui.sections.len(),
            fields,
            conditional_fields: gui
                .sections
                .iter()
                .flat_map(|s| s.fields.iter())
                .filter(|f| f.conditional.is_some())
                .count(),
            conditional_sections: gui
                .sections
                .iter()
                .filter(|s| s.conditional.is_some())
                .count(),
            complexity: if fields > 10 {
                Complexity::High
            } else if fields > 5 {
                Complexity::Medium
            } else {
                Complexity::Low
            },
        }
    }

    fn section_to_gui(
        &mut self,
        section: &Section,
        options: &ConversionOptions,
        warnings: &mut Vec<TemplateIssue>,
    ) -> GuiSection {
        let mut fields = Vec::new();
        for field in &section.fields {
            if field.control_flow.is_some() && !options.include_control_flow {
                warnings.push(TemplateIssue::validation(format!(
                    "Field '{}' has control flow logic that will be skipped",
                    field.label
                )));
                continue;
            }
            fields.push(self.field_to_gui(field, options));
        }

        GuiSection {
            id: if options.preserve_ids {
                section.id.clone()
            } else {
                self.generate_id("section")
            },
            title: section.title.clone(),
            fields,
            conditional: section.conditional.clone(),
        }
    }

    fn field_to_gui(&mut self, field: &Field, options: &ConversionOptions) -> GuiField {
        GuiField {
            id: if options.preserve_ids {
                field.id.clone()
            } else {
                self.generate_id("field")
            },
            field_type: GuiFieldType::from_field_type(field.field_type),
            label: field.label.clone(),
            placeholder: field.placeholder.clone(),
            required: field.required,
            options: field.options.clone(),
            multiple: field.multiple,
            validation: field.validation.as_ref().and_then(Self::validation_to_document),
            conditional: field.conditional.clone(),
            default_value: field.default_value.clone(),
        }
    }

    fn section_from_gui(&mut self, section: &GuiSection, options: &ConversionOptions) -> Section {
        Section {
            id: if options.preserve_ids {
                section.id.clone()
            } else {
                self.generate_id("section")
            },
            title: section.title.clone(),
            fields: section
                .fields
                .iter()
                .map(|field| self.field_from_gui(field, options))
                .collect(),
            conditional: section.conditional.clone(),
            control_flow: None,
            naable: false,
        }
    }

    fn field_from_gui(&mut self, field: &GuiField, options: &ConversionOptions) -> Field {
        Field {
            id: if options.preserve_ids {
                field.id.clone()
            } else {
                self.generate_id("field")
            },
            field_type: field.field_type.to_field_type(),
            label: field.label.clone(),
            placeholder: field.placeholder.clone(),
            required: field.required,
            options: field.options.clone(),
            multiple: field.multiple,
            validation: field.validation.as_ref().map(|rules| ValidationRules {
                min: rules.min,
                max: rules.max,
                min_length: rules.min_length,
                max_length: rules.max_length,
                pattern: rules.pattern.clone(),
                custom: None,
            }),
            conditional: field.conditional.clone(),
            default_value: field.default_value.clone(),
            layout: None,
            grouping: None,
            control_flow: None,
        }
    }

    fn validation_to_document(rules: &ValidationRules) -> Option<ValidationDocument> {
        let document = ValidationDocument {
            min: rules.min,
            max: rules.max,
            min_length: rules.min_length,
            max_length: rules.max_length,
            pattern: rules.pattern.clone(),
        };
        if document.is_empty() { None } else { Some(document) }
    }

    /// Ids of required GUI fields, in document order.
    fn required_field_ids(gui: &GuiTemplate) -> Vec<String> {
        gui.sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .filter(|f| f.required)
            .map(|f| f.id.clone())
            .collect()
    }

    /// Descriptive tags inferred from the GUI structure.
    fn generate_tags(gui: &GuiTemplate) -> Vec<String> {
        let mut tags = Vec::new();

        let types: Vec<GuiFieldType> = gui
            .sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .map(|f| f.field_type)
            .collect();

        if types.contains(&GuiFieldType::File) {
            tags.push("file-upload".to_string());
        }
        if types.contains(&GuiFieldType::Date) {
            tags.push("date-input".to_string());
        }
        if types.iter().any(|t| {
            matches!(
                t,
                GuiFieldType::Select | GuiFieldType::Radio | GuiFieldType::Checkbox
            )
        }) {
            tags.push("multiple-choice".to_string());
        }

        if gui.sections.len() > 1 {
            tags.push("multi-section".to_string());
        }

        let has_conditionals = gui.sections.iter().any(|s| {
            s.conditional.is_some() || s.fields.iter().any(|f| f.conditional.is_some())
        });
        if has_conditionals {
            tags.push("conditional".to_string());
        }

        let total_fields = gui.sections.iter().map(|s| s.fields.len()).sum::<usize>();
        if total_fields > 10 {
            tags.push("complex".to_string());
        } else if total_fields <= 3 {
            tags.push("simple".to_string());
        }

        tags
    }

    fn generate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{}", prefix, self.next_id)
    }
}
