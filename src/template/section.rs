use super::condition::VisibilityCondition;
use super::control_flow::ControlFlowConfig;
use super::field::Field;

/// A structural node of the template tree, owning an ordered run of fields.
#[derive(Debug, Clone, Default)]
pub struct Section {
    /// Unique across the template.
    pub id: String,
    pub title: String,
    pub fields: Vec<Field>,
    pub conditional: Option<VisibilityCondition>,
    pub control_flow: Option<ControlFlowConfig>,
    /// Whether the rendered section offers a "not applicable" opt-out.
    pub naable: bool,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }
}
