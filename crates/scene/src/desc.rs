//! Entity and scene documents.

use serde::{Deserialize, Serialize};

use scene_component::{ComponentDesc, EntityId};

/// The persisted form of an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDesc {
    /// `0` when the document carries no id.
    #[serde(default)]
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Allocate from the local range when the id is not used.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub local: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub temporary: bool,
    #[serde(default)]
    pub components: Vec<ComponentDesc>,
}

impl EntityDesc {
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_component(mut self, component: ComponentDesc) -> Self {
        self.components.push(component);
        self
    }
}

/// The persisted form of a scene.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDesc {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub entities: Vec<EntityDesc>,
}

impl SceneDesc {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_entity(mut self, entity: EntityDesc) -> Self {
        self.entities.push(entity);
        self
    }

    /// Every component descriptor in the document, in order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentDesc> {
        self.entities.iter().flat_map(|e| e.components.iter())
    }
}
