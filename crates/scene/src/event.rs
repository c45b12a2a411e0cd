//! Scene events.
//!
//! Each scene owns one [`SceneEvents`] channel. Components reach it through
//! a weak [`ChangeSink`] handle installed when they are added to an entity;
//! entities and the scene emit into it directly. Subscribers run
//! synchronously, in subscription order.

use scene_attribute::{Attribute, ChangeMode};
use scene_component::{AttributeChanged, ChangeSink, ComponentInfo, EntityId, ObserverId, Observers};

/// Something that happened in a scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    AttributeChanged(AttributeChanged),
    AttributeAdded {
        component: ComponentInfo,
        attribute_id: String,
        index: u8,
        mode: ChangeMode,
    },
    AttributeRemoved {
        component: ComponentInfo,
        attribute_id: String,
        index: u8,
        mode: ChangeMode,
    },
    ComponentAdded {
        entity: EntityId,
        component: ComponentInfo,
        mode: ChangeMode,
    },
    ComponentRemoved {
        entity: EntityId,
        component: ComponentInfo,
        mode: ChangeMode,
    },
    ComponentRenamed {
        component: ComponentInfo,
        old_name: String,
    },
    EntityCreated {
        entity: EntityId,
        mode: ChangeMode,
    },
    EntityRemoved {
        entity: EntityId,
        mode: ChangeMode,
    },
    SceneCleared,
}

impl SceneEvent {
    /// The entity the event concerns, if any.
    #[must_use]
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::AttributeChanged(e) => e.component.entity,
            Self::AttributeAdded { component, .. }
            | Self::AttributeRemoved { component, .. }
            | Self::ComponentRenamed { component, .. } => component.entity,
            Self::ComponentAdded { entity, .. }
            | Self::ComponentRemoved { entity, .. }
            | Self::EntityCreated { entity, .. }
            | Self::EntityRemoved { entity, .. } => Some(*entity),
            Self::SceneCleared => None,
        }
    }
}

/// Event channel of one scene.
#[derive(Debug, Default)]
pub struct SceneEvents {
    observers: Observers<SceneEvent>,
}

impl SceneEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: impl FnMut(&SceneEvent) + 'static) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Deliver `event` to every subscriber. Nothing is delivered for
    /// [`ChangeMode::Disconnected`] mutations; callers check that before
    /// building the event.
    pub fn emit(&self, event: SceneEvent) {
        tracing::trace!(?event, "scene event");
        self.observers.dispatch(&event);
    }
}

impl ChangeSink for SceneEvents {
    fn attribute_changed(&self, event: &AttributeChanged) {
        self.emit(SceneEvent::AttributeChanged(event.clone()));
    }

    fn attribute_added(&self, component: &ComponentInfo, attribute: &Attribute, mode: ChangeMode) {
        self.emit(SceneEvent::AttributeAdded {
            component: component.clone(),
            attribute_id: attribute.id().to_string(),
            index: attribute.index(),
            mode,
        });
    }

    fn attribute_removed(&self, component: &ComponentInfo, attribute: &Attribute, mode: ChangeMode) {
        self.emit(SceneEvent::AttributeRemoved {
            component: component.clone(),
            attribute_id: attribute.id().to_string(),
            index: attribute.index(),
            mode,
        });
    }

    fn component_renamed(&self, component: &ComponentInfo, old_name: &str) {
        self.emit(SceneEvent::ComponentRenamed {
            component: component.clone(),
            old_name: old_name.to_string(),
        });
    }
}
