//! Editor hints attached to an attribute.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Optional presentation metadata for an attribute.
///
/// Shared between all instances of a component type, so attributes hold it
/// behind an `Rc`. None of it affects storage or serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMetadata {
    pub description: String,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub step: Option<f64>,
    /// Integer value to label, for attributes edited as a drop-down.
    pub enums: BTreeMap<i32, String>,
    /// Whether editors should show the attribute at all.
    pub designable: bool,
}

impl Default for AttributeMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            minimum: None,
            maximum: None,
            step: None,
            enums: BTreeMap::new(),
            designable: true,
        }
    }
}

impl AttributeMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    #[must_use]
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    #[must_use]
    pub fn with_enum(mut self, value: i32, label: impl Into<String>) -> Self {
        self.enums.insert(value, label.into());
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.designable = false;
        self
    }

    /// Label for an enum value, if one is declared.
    #[must_use]
    pub fn enum_label(&self, value: i32) -> Option<&str> {
        self.enums.get(&value).map(String::as_str)
    }
}
