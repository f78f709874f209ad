use std::fmt;
use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::condition::VisibilityCondition;
use super::control_flow::ControlFlowConfig;

/// The fixed field-type vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
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
    Range,
}

impl FieldType {
    /// Parses a type tag, tolerating unknown tags with a fallback to `Text`
    /// and a logged warning.
    pub fn parse(tag: &str) -> Self {
        match Self::from_tag(tag) {
            Some(field_type) => field_type,
            None => {
                warn!("Unknown field type '{}', defaulting to 'text'", tag);
                FieldType::Text
            }
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "text" => Some(FieldType::Text),
            "textarea" => Some(FieldType::Textarea),
            "select" => Some(FieldType::Select),
            "radio" => Some(FieldType::Radio),
            "checkbox" => Some(FieldType::Checkbox),
            "number" => Some(FieldType::Number),
            "date" => Some(FieldType::Date),
            "file" => Some(FieldType::File),
            "email" => Some(FieldType::Email),
            "tel" => Some(FieldType::Tel),
            "range" => Some(FieldType::Range),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::File => "file",
            FieldType::Email => "email",
            FieldType::Tel => "tel",
            FieldType::Range => "range",
        }
    }

    /// Choice fields are expected to carry options.
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio | FieldType::Checkbox)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A selectable option: either a bare value or a value with a display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldOption {
    Plain(String),
    Labeled { value: String, label: String },
}

impl FieldOption {
    pub fn value(&self) -> &str {
        match self {
            FieldOption::Plain(value) => value,
            FieldOption::Labeled { value, .. } => value,
        }
    }
}

impl From<&str> for FieldOption {
    fn from(value: &str) -> Self {
        FieldOption::Plain(value.to_string())
    }
}

impl From<String> for FieldOption {
    fn from(value: String) -> Self {
        FieldOption::Plain(value)
    }
}

/// A named, caller-supplied validation predicate. Predicates never survive
/// serialization to the portable document format.
#[derive(Clone)]
pub struct CustomRule {
    pub name: String,
    predicate: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl CustomRule {
    pub fn new(name: impl Into<String>, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn check(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomRule({})", self.name)
    }
}

/// Validation constraints for a single field.
#[derive(Debug, Clone, Default)]
pub struct ValidationRules {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub custom: Option<CustomRule>,
}

impl ValidationRules {
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
            && self.max.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.custom.is_none()
    }
}

/// Display orientation for option-bearing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// Groups related fields under a shared key in the rendered form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A leaf node of the template tree.
#[derive(Debug, Clone, Default)]
pub struct Field {
    /// Unique within the owning section.
    pub id: String,
    pub field_type: FieldType,
    pub label: String,
    pub placeholder: Option<String>,
    pub required: bool,
    pub options: Vec<FieldOption>,
    pub multiple: bool,
    pub validation: Option<ValidationRules>,
    pub conditional: Option<VisibilityCondition>,
    pub default_value: Option<Value>,
    pub layout: Option<Orientation>,
    pub grouping: Option<GroupingConfig>,
    pub control_flow: Option<ControlFlowConfig>,
}

impl Field {
    pub fn new(id: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type,
            label: label.into(),
            ..Self::default()
        }
    }
}
