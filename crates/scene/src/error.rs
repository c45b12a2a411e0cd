//! Scene-level error types.

use scene_component::{ComponentError, ComponentId, EntityId};

/// Errors from entity, scene and document operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),

    /// Components can only be added to an entity that belongs to a scene.
    #[error("entity {0} is not attached to a scene")]
    EntityNotAttached(EntityId),

    #[error("entity {0} has already been attached to a scene")]
    EntityAlreadyAttached(EntityId),

    #[error("entity id {0} is already in use")]
    DuplicateEntityId(EntityId),

    #[error("component {component} not found on entity {entity}")]
    ComponentNotFound { entity: EntityId, component: String },

    #[error("component id {component} is already in use on entity {entity}")]
    DuplicateComponentId { entity: EntityId, component: ComponentId },

    /// The component already belongs to an entity.
    #[error("component '{0}' already has a parent entity")]
    ComponentInUse(String),

    #[error("scene '{0}' not found")]
    SceneNotFound(String),

    #[error("scene '{0}' already exists")]
    DuplicateScene(String),

    #[error("no default scene")]
    NoDefaultScene,

    #[error("cannot interpolate attribute '{attribute}': {reason}")]
    Interpolation { attribute: String, reason: &'static str },

    #[error("malformed scene binary: {0}")]
    MalformedBinary(String),

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error("failed to encode scene document: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode scene document: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("invalid scene JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<scene_attribute::AttributeError> for SceneError {
    fn from(e: scene_attribute::AttributeError) -> Self {
        Self::Component(ComponentError::Attribute(e))
    }
}
