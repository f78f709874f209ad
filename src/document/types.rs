use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::template::{
    FieldOption, GroupingConfig, LayoutMode, Orientation, SpacingMode, ValidationMode,
    VisibilityCondition,
};

fn is_false(b: &bool) -> bool {
    !*b
}

// serde path expressions cannot reach `is_empty` through AHashMap's Deref.
fn map_is_empty(map: &AHashMap<String, Value>) -> bool {
    map.is_empty()
}

/// Root of a portable template document. Only `metadata.name` and the
/// section/field identity fields are mandatory; everything else defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDocument {
    pub metadata: MetadataDocument,
    #[serde(default, skip_serializing_if = "map_is_empty")]
    pub variables: AHashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaDocument>,
    #[serde(default)]
    pub sections: Vec<SectionDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<BehaviorDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styling: Option<StylingDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    #[serde(default)]
    pub validation: ValidationMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDocument {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<VisibilityCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_flow: Option<ControlFlowDocument>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub naable: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDocument {
    pub id: String,
    /// Kept as a raw string so unknown tags degrade instead of failing.
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<VisibilityCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping: Option<GroupingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_flow: Option<ControlFlowDocument>,
}

/// Serializable subset of the validation rules. Custom predicates have no
/// document form and are dropped on serialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl ValidationDocument {
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
            && self.max.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorDocument {
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_save: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_save_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub show_progress: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylingDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<SpacingMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub animations: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_styling: Vec<Value>,
}

/// Control flow as it appears in documents: conditions are strings in the
/// condition grammar, loop bodies are `do` arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlFlowDocument {
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub conditional: Option<IfBranchDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub else_if: Option<Vec<IfBranchDocument>>,
    #[serde(default, rename = "else", skip_serializing_if = "Option::is_none")]
    pub else_branch: Option<ElseDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_each: Option<ForEachDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatDocument>,
    #[serde(default, rename = "while", skip_serializing_if = "Option::is_none")]
    pub while_loop: Option<WhileDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfBranchDocument {
    pub condition: String,
    #[serde(default)]
    pub then: Vec<ActionDocument>,
}

/// The `else` branch accepts either a bare action array or an object with a
/// `fields` key. Both shapes exist in documents in the wild.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElseDocument {
    Wrapped { fields: Vec<ActionDocument> },
    Actions(Vec<ActionDocument>),
}

impl ElseDocument {
    pub fn actions(&self) -> &[ActionDocument] {
        match self {
            ElseDocument::Wrapped { fields } => fields,
            ElseDocument::Actions(actions) => actions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForEachDocument {
    pub array: String,
    pub variable: String,
    #[serde(default, rename = "do")]
    pub body: Vec<ActionDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatDocument {
    pub count: CountDocument,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default, rename = "do")]
    pub body: Vec<ActionDocument>,
}

/// A repeat count: a number, or an expression string evaluated at run time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountDocument {
    Literal(i64),
    Expression(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhileDocument {
    pub condition: String,
    #[serde(default, rename = "do")]
    pub body: Vec<ActionDocument>,
}

/// One entry of an action array: a tagged action, an inline field
/// definition, or a nested control-flow block. Variant order matters for
/// untagged matching: tagged actions first, then fields (which require
/// `id`/`type`/`label`), then control flow (all keys optional).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionDocument {
    Action(ActionPayload),
    Field(FieldDocument),
    ControlFlow(Box<ControlFlowDocument>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionPayload {
    #[serde(rename_all = "camelCase")]
    SetVariable { name: String, value: Value },
    #[serde(rename_all = "camelCase")]
    CallFunction {
        name: String,
        #[serde(default)]
        args: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        return_variable: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    CreateField { data: FieldDocument },
    #[serde(rename_all = "camelCase")]
    CreateSection { data: SectionDocument },
}
