//! Component descriptors.
//!
//! A [`ComponentDesc`] is both the schema a loader or network receiver
//! produces for a component type it has no compiled support for, and the
//! persisted form of any component instance.

use serde::{Deserialize, Serialize};

use crate::type_id::ComponentTypeId;

/// One attribute of a [`ComponentDesc`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDesc {
    pub id: String,
    /// Display name; the id is used when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub type_name: String,
    /// Value in the attribute text encoding.
    #[serde(default)]
    pub value: String,
}

impl AttributeDesc {
    #[must_use]
    pub fn new(id: impl Into<String>, type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            type_name: type_name.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }
}

/// Type, identity and ordered attributes of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDesc {
    pub type_name: String,
    /// [`ComponentTypeId::NONE`] when not known; the registry derives one.
    #[serde(default)]
    pub type_id: ComponentTypeId,
    /// Instance name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Whether the component is replicated.
    #[serde(default = "default_sync")]
    pub sync: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub temporary: bool,
    #[serde(default)]
    pub attributes: Vec<AttributeDesc>,
}

fn default_sync() -> bool {
    true
}

impl ComponentDesc {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            type_id: ComponentTypeId::NONE,
            name: String::new(),
            sync: true,
            temporary: false,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_type_id(mut self, type_id: ComponentTypeId) -> Self {
        self.type_id = type_id;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: AttributeDesc) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Whether this descriptor describes the given type. Names compare
    /// ignoring ASCII case; ids only when both are set.
    #[must_use]
    pub fn matches_type(&self, type_name: &str, type_id: ComponentTypeId) -> bool {
        if self.type_name.eq_ignore_ascii_case(type_name) {
            return true;
        }
        !self.type_id.is_none() && self.type_id == type_id
    }

    /// Attribute descriptor by id or display name, ignoring ASCII case.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&AttributeDesc> {
        self.attributes
            .iter()
            .find(|a| a.id.eq_ignore_ascii_case(key) || a.display_name().eq_ignore_ascii_case(key))
    }
}
