use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Descriptive template metadata. `name` is the only piece the validator
/// treats as required.
#[derive(Debug, Clone)]
pub struct TemplateMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub tags: Vec<String>,
    /// Id of a parent template this one extends, if any.
    pub extends: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Default for TemplateMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            name: String::new(),
            version: "1.0.0".to_string(),
            description: String::new(),
            author: "system".to_string(),
            tags: Vec::new(),
            extends: None,
            created: now,
            updated: now,
        }
    }
}

/// How strictly the template wants its answers validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    Strict,
    #[default]
    Loose,
    None,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateSchema {
    pub validation: ValidationMode,
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Fixed,
    #[default]
    Fluid,
    Adaptive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpacingMode {
    Compact,
    #[default]
    Normal,
    Comfortable,
}

/// Presentation hints. Carried verbatim; the engine itself never interprets
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct StylingConfig {
    pub theme: String,
    pub layout: LayoutMode,
    pub spacing: SpacingMode,
    pub colors: Vec<String>,
    pub animations: bool,
    /// Free-form conditional styling rules, passed through untouched.
    pub conditional_styling: Vec<Value>,
}

impl Default for StylingConfig {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            layout: LayoutMode::default(),
            spacing: SpacingMode::default(),
            colors: Vec::new(),
            animations: false,
            conditional_styling: Vec::new(),
        }
    }
}

/// Partial styling update applied by the builder's `styling()` call.
#[derive(Debug, Clone, Default)]
pub struct StylingPatch {
    pub theme: Option<String>,
    pub layout: Option<LayoutMode>,
    pub spacing: Option<SpacingMode>,
    pub colors: Option<Vec<String>>,
    pub animations: Option<bool>,
}

impl StylingConfig {
    pub fn apply(&mut self, patch: StylingPatch) {
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(layout) = patch.layout {
            self.layout = layout;
        }
        if let Some(spacing) = patch.spacing {
            self.spacing = spacing;
        }
        if let Some(colors) = patch.colors {
            self.colors = colors;
        }
        if let Some(animations) = patch.animations {
            self.animations = animations;
        }
    }
}

/// Runtime behavior toggles for the consuming form renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BehaviorConfig {
    pub auto_save: bool,
    pub auto_save_interval: Option<u64>,
    pub show_progress: bool,
}
