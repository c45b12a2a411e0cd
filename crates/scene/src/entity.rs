//! Entities: id-addressed bags of components.

use std::fmt;
use std::rc::{Rc, Weak};

use scene_attribute::{Attribute, ChangeMode};
use scene_component::{ChangeSink, Component, ComponentId, ComponentTypeId, EntityId};

use crate::desc::EntityDesc;
use crate::error::SceneError;
use crate::event::SceneEvent;
use crate::ids::{IdGenerator, IdRange};
use crate::scene::SceneContext;

/// Lifecycle of an [`Entity`].
///
/// `Unattached -> Attached -> Removed`. Components can be added and removed
/// only while attached; removal from the scene destroys them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Unattached,
    Attached,
    Removed,
}

/// A named, id-addressed container of components.
///
/// Components keep their insertion order. Each has an id that is unique
/// within the entity: replicated components are numbered from the
/// replicated (or, on a non-authoritative scene, unacked) range, local ones
/// from the local range.
pub struct Entity {
    id: EntityId,
    name: String,
    description: String,
    temporary: bool,
    state: EntityState,
    context: Option<Rc<SceneContext>>,
    components: Vec<Box<dyn Component>>,
    component_ids: IdGenerator,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let components: Vec<(ComponentId, &str)> = self
            .components
            .iter()
            .map(|c| (c.core().id(), c.core().type_name()))
            .collect();
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("components", &components)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.trim().is_empty() {
            write!(f, "Entity ID {}", self.id)
        } else {
            write!(f, "Entity \"{}\" (ID: {})", self.name, self.id)
        }
    }
}

impl Entity {
    /// A new, unattached entity. Add it to a scene with
    /// [`Scene::add_entity`](crate::Scene::add_entity).
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            name: String::new(),
            description: String::new(),
            temporary: false,
            state: EntityState::Unattached,
            context: None,
            components: Vec::new(),
            component_ids: IdGenerator::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> EntityState {
        self.state
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Temporary entities are skipped when saving unless asked for.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn set_temporary(&mut self, temporary: bool) {
        self.temporary = temporary;
    }

    /// Whether the id is in the local range.
    #[must_use]
    pub fn is_local(&self) -> bool {
        IdRange::of(self.id) == IdRange::Local
    }

    /// Whether the id is in the unacked range.
    #[must_use]
    pub fn is_unacked(&self) -> bool {
        IdRange::of(self.id) == IdRange::Unacked
    }

    // -- lifecycle --

    pub(crate) fn attach(&mut self, context: Rc<SceneContext>) -> Result<(), SceneError> {
        if self.state != EntityState::Unattached {
            return Err(SceneError::EntityAlreadyAttached(self.id));
        }
        self.context = Some(context);
        self.state = EntityState::Attached;
        Ok(())
    }

    /// Destroy all components and detach from the scene.
    pub(crate) fn destroy(&mut self) {
        for mut component in self.components.drain(..) {
            release(component.as_mut());
        }
        self.context = None;
        self.state = EntityState::Removed;
    }

    pub(crate) fn set_id(&mut self, id: EntityId) {
        self.id = id;
        for component in &mut self.components {
            let cid = component.core().id();
            component.core_mut().set_parent(cid, Some(id));
        }
    }

    fn context(&self) -> Result<Rc<SceneContext>, SceneError> {
        match (&self.context, self.state) {
            (Some(context), EntityState::Attached) => Ok(Rc::clone(context)),
            _ => Err(SceneError::EntityNotAttached(self.id)),
        }
    }

    fn emit(&self, event: SceneEvent) {
        if let Some(context) = &self.context {
            context.events.emit(event);
        }
    }

    // -- adding and removing components --

    /// Create a component by type name and add it.
    ///
    /// # Errors
    ///
    /// Fails if the entity is not attached or the type is unknown.
    pub fn create_component(
        &mut self,
        type_name: &str,
        name: &str,
        mode: ChangeMode,
        replicated: bool,
    ) -> Result<&mut dyn Component, SceneError> {
        let context = self.context()?;
        let component = context
            .registry
            .borrow()
            .create_component_by_name(type_name)
            .inspect_err(|_| tracing::error!(type_name, entity = %self, "failed to create component"))?;
        self.add_new_component(component, name, mode, replicated)
    }

    /// Create a component by type id and add it.
    ///
    /// # Errors
    ///
    /// Fails if the entity is not attached or the type id is unknown.
    pub fn create_component_by_type_id(
        &mut self,
        type_id: ComponentTypeId,
        name: &str,
        mode: ChangeMode,
        replicated: bool,
    ) -> Result<&mut dyn Component, SceneError> {
        let context = self.context()?;
        let component = context
            .registry
            .borrow()
            .create_component_by_id(type_id)
            .inspect_err(|_| tracing::error!(%type_id, entity = %self, "failed to create component"))?;
        self.add_new_component(component, name, mode, replicated)
    }

    fn add_new_component(
        &mut self,
        mut component: Box<dyn Component>,
        name: &str,
        mode: ChangeMode,
        replicated: bool,
    ) -> Result<&mut dyn Component, SceneError> {
        component.core_mut().set_name(name);
        component.core_mut().set_replicated(replicated)?;
        let id = self.add_component(component, mode)?;
        let entity = self.id;
        self.component_by_id_mut(id).ok_or_else(|| SceneError::ComponentNotFound {
            entity,
            component: id.to_string(),
        })
    }

    /// The first component of `type_name` named `name`, created if absent.
    ///
    /// # Errors
    ///
    /// As [`Entity::create_component`].
    pub fn get_or_create_component(
        &mut self,
        type_name: &str,
        name: &str,
        mode: ChangeMode,
        replicated: bool,
    ) -> Result<&mut dyn Component, SceneError> {
        if let Some(pos) = self.position(|c| is_type(c, type_name) && c.core().name() == name) {
            return Ok(self.components[pos].as_mut());
        }
        self.create_component(type_name, name, mode, replicated)
    }

    /// Add a free-standing component, allocating its id.
    ///
    /// A replicated component added to a local entity is made local.
    ///
    /// # Errors
    ///
    /// Fails if the entity is not attached or the component already belongs
    /// to an entity.
    pub fn add_component(&mut self, mut component: Box<dyn Component>, mode: ChangeMode) -> Result<ComponentId, SceneError> {
        let context = self.context()?;
        check_free(component.as_ref())?;
        if self.is_local() && component.core().is_replicated() {
            tracing::debug!(entity = %self, component = %component.core().type_name(), "local entity: making component local");
            component.core_mut().force_replicated(false);
        }
        let range = if !component.core().is_replicated() {
            IdRange::Local
        } else if context.authority.get() {
            IdRange::Replicated
        } else {
            IdRange::Unacked
        };
        let id = loop {
            let id = self.component_ids.allocate(range);
            if self.component_by_id(id).is_none() {
                break id;
            }
        };
        self.adopt(component, id, &context, mode);
        Ok(id)
    }

    /// Add a component under an id chosen elsewhere, as when mirroring a
    /// remote entity. The id's range decides whether it is replicated.
    ///
    /// # Errors
    ///
    /// Fails if the entity is not attached, the id is taken, or the
    /// component already belongs to an entity.
    pub fn add_component_with_id(
        &mut self,
        mut component: Box<dyn Component>,
        id: ComponentId,
        mode: ChangeMode,
    ) -> Result<(), SceneError> {
        if id == 0 {
            return self.add_component(component, mode).map(|_| ());
        }
        let context = self.context()?;
        check_free(component.as_ref())?;
        if self.component_by_id(id).is_some() {
            return Err(SceneError::DuplicateComponentId {
                entity: self.id,
                component: id,
            });
        }
        component
            .core_mut()
            .force_replicated(IdRange::of(id) != IdRange::Local);
        self.component_ids.observe(id);
        self.adopt(component, id, &context, mode);
        Ok(())
    }

    fn adopt(&mut self, mut component: Box<dyn Component>, id: ComponentId, context: &SceneContext, mode: ChangeMode) {
        component.core_mut().set_parent(id, Some(self.id));
        let hub = component.core().hub();
        hub.set_policy(Rc::clone(&context.policy.borrow()));
        let events: Rc<dyn ChangeSink> = Rc::clone(&context.events) as Rc<dyn ChangeSink>;
        let sink: Weak<dyn ChangeSink> = Rc::downgrade(&events);
        hub.set_sink(Some(sink));
        let info = component.core().info().clone();
        self.components.push(component);
        if mode != ChangeMode::Disconnected {
            self.emit(SceneEvent::ComponentAdded {
                entity: self.id,
                component: info,
                mode,
            });
        }
    }

    /// Remove a component and hand it back, detached.
    ///
    /// # Errors
    ///
    /// Fails if the entity is not attached or has no component `id`.
    pub fn remove_component(&mut self, id: ComponentId, mode: ChangeMode) -> Result<Box<dyn Component>, SceneError> {
        self.context()?;
        let Some(pos) = self.position(|c| c.core().id() == id) else {
            tracing::warn!(entity = %self, component = id, "failed to remove component");
            return Err(SceneError::ComponentNotFound {
                entity: self.id,
                component: id.to_string(),
            });
        };
        if mode != ChangeMode::Disconnected {
            self.emit(SceneEvent::ComponentRemoved {
                entity: self.id,
                component: self.components[pos].core().info().clone(),
                mode,
            });
        }
        let mut component = self.components.remove(pos);
        release(component.as_mut());
        Ok(component)
    }

    /// Remove every component, in reverse order of addition.
    pub fn remove_all_components(&mut self, mode: ChangeMode) {
        while let Some(id) = self.components.last().map(|c| c.core().id()) {
            if self.remove_component(id, mode).is_err() {
                break;
            }
        }
    }

    // -- lookup --

    fn position(&self, pred: impl Fn(&dyn Component) -> bool) -> Option<usize> {
        self.components.iter().position(|c| pred(c.as_ref()))
    }

    /// Components in insertion order.
    pub fn components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.iter().map(|c| c.as_ref())
    }

    pub fn components_mut(&mut self) -> impl Iterator<Item = &mut dyn Component> {
        self.components.iter_mut().map(|c| c.as_mut())
    }

    #[must_use]
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn component_by_id(&self, id: ComponentId) -> Option<&dyn Component> {
        self.position(|c| c.core().id() == id)
            .map(|pos| self.components[pos].as_ref())
    }

    pub fn component_by_id_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        self.position(|c| c.core().id() == id)
            .map(|pos| self.components[pos].as_mut())
    }

    /// The first component of a type. Type names compare ignoring ASCII
    /// case.
    #[must_use]
    pub fn component(&self, type_name: &str) -> Option<&dyn Component> {
        self.position(|c| is_type(c, type_name))
            .map(|pos| self.components[pos].as_ref())
    }

    pub fn component_mut(&mut self, type_name: &str) -> Option<&mut dyn Component> {
        self.position(|c| is_type(c, type_name))
            .map(|pos| self.components[pos].as_mut())
    }

    /// The first component of a type with the given instance name.
    #[must_use]
    pub fn component_named(&self, type_name: &str, name: &str) -> Option<&dyn Component> {
        self.position(|c| is_type(c, type_name) && c.core().name() == name)
            .map(|pos| self.components[pos].as_ref())
    }

    pub fn component_named_mut(&mut self, type_name: &str, name: &str) -> Option<&mut dyn Component> {
        self.position(|c| is_type(c, type_name) && c.core().name() == name)
            .map(|pos| self.components[pos].as_mut())
    }

    #[must_use]
    pub fn component_by_type_id(&self, type_id: ComponentTypeId) -> Option<&dyn Component> {
        self.position(|c| c.core().type_id() == type_id)
            .map(|pos| self.components[pos].as_ref())
    }

    #[must_use]
    pub fn components_of_type(&self, type_name: &str) -> Vec<&dyn Component> {
        self.components().filter(|c| is_type(*c, type_name)).collect()
    }

    #[must_use]
    pub fn has_component(&self, type_name: &str) -> bool {
        self.component(type_name).is_some()
    }

    /// The first component of concrete type `T`.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.components().find_map(|c| c.downcast_ref::<T>())
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components_mut().find_map(|c| c.downcast_mut::<T>())
    }

    /// The first attribute with this id or name, searching components in
    /// order.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.components().find_map(|c| c.core().attribute(key))
    }

    /// Every attribute with this id or name, one per component at most.
    #[must_use]
    pub fn attributes(&self, key: &str) -> Vec<&Attribute> {
        self.components().filter_map(|c| c.core().attribute(key)).collect()
    }

    /// Notify every attribute of every component as changed.
    pub fn components_changed(&self, mode: ChangeMode) {
        for component in self.components() {
            component.core().component_changed(mode);
        }
    }

    // -- documents --

    /// The persisted form of this entity. Temporary components are
    /// included only when asked for.
    #[must_use]
    pub fn to_desc(&self, include_temporary: bool) -> EntityDesc {
        EntityDesc {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            local: self.is_local(),
            temporary: self.temporary,
            components: self
                .components()
                .filter(|c| include_temporary || !c.core().is_temporary())
                .map(|c| c.to_desc())
                .collect(),
        }
    }
}

fn is_type(component: &dyn Component, type_name: &str) -> bool {
    component.core().type_name().eq_ignore_ascii_case(type_name)
}

fn check_free(component: &dyn Component) -> Result<(), SceneError> {
    if component.core().entity().is_some() || component.core().id() != 0 {
        return Err(SceneError::ComponentInUse(component.core().type_name().to_string()));
    }
    Ok(())
}

fn release(component: &mut dyn Component) {
    component.core_mut().set_parent(0, None);
    component.core().hub().set_sink(None);
}

#[cfg(test)]
mod tests {
    use scene_attribute::Vec3;

    use super::*;
    use crate::ids::{FIRST_LOCAL_ID, FIRST_UNACKED_ID};
    use crate::testing::{QUIET, record, scene};

    #[test]
    fn test_unattached_entity_rejects_components() {
        let mut entity = Entity::new(5);
        assert_eq!(entity.state(), EntityState::Unattached);
        assert!(matches!(
            entity.create_component("Placeable", "", QUIET, true),
            Err(SceneError::EntityNotAttached(5))
        ));
    }

    #[test]
    fn test_component_ids_by_range() {
        let mut scene = scene(true);
        let entity = scene.create_entity(0, &[], QUIET, true).unwrap();
        let a = entity.create_component("Placeable", "a", QUIET, true).unwrap().core().id();
        let b = entity.create_component("Placeable", "b", QUIET, true).unwrap().core().id();
        let c = entity.create_component("Placeable", "c", QUIET, false).unwrap().core().id();
        assert_eq!((a, b, c), (1, 2, FIRST_LOCAL_ID));

        let mut client = crate::testing::scene(false);
        let entity = client.create_entity(0, &[], QUIET, true).unwrap();
        assert!(entity.is_unacked());
        let id = entity.create_component("Placeable", "", QUIET, true).unwrap().core().id();
        assert_eq!(id, FIRST_UNACKED_ID);
    }

    #[test]
    fn test_local_entity_makes_components_local() {
        let mut scene = scene(true);
        let entity = scene.create_local_entity(&["Placeable"], QUIET).unwrap();
        assert!(entity.is_local());
        let comp = entity.component("placeable").unwrap();
        assert!(!comp.core().is_replicated());
        assert_eq!(comp.core().id(), FIRST_LOCAL_ID);
    }

    #[test]
    fn test_add_component_with_id() {
        let mut scene = scene(true);
        let registry = Rc::clone(scene.registry());
        let entity = scene.create_entity(0, &[], QUIET, true).unwrap();
        let comp = registry.borrow().create_component_by_name("Placeable").unwrap();
        entity.add_component_with_id(comp, 7, QUIET).unwrap();
        let dup = registry.borrow().create_component_by_name("Placeable").unwrap();
        assert!(matches!(
            entity.add_component_with_id(dup, 7, QUIET),
            Err(SceneError::DuplicateComponentId { component: 7, .. })
        ));
        let local = registry.borrow().create_component_by_name("Placeable").unwrap();
        entity.add_component_with_id(local, FIRST_LOCAL_ID + 3, QUIET).unwrap();
        assert!(!entity.component_by_id(FIRST_LOCAL_ID + 3).unwrap().core().is_replicated());
        // Allocation continues above the observed id.
        let next = entity.create_component("Placeable", "x", QUIET, true).unwrap().core().id();
        assert_eq!(next, 8);
    }

    #[test]
    fn test_component_in_use_rejected() {
        let mut scene = scene(true);
        let id = scene.create_entity(0, &["Placeable"], QUIET, true).unwrap().id();
        let entity = scene.entity_mut(id).unwrap();
        let comp_id = entity.component("Placeable").unwrap().core().id();
        let mut comp = entity.remove_component(comp_id, QUIET).unwrap();
        assert!(comp.core().entity().is_none());
        comp.core_mut().set_parent(3, Some(99));
        assert!(matches!(entity.add_component(comp, QUIET), Err(SceneError::ComponentInUse(_))));
    }

    #[test]
    fn test_get_or_create_reuses() {
        let mut scene = scene(true);
        let entity = scene.create_entity(0, &[], QUIET, true).unwrap();
        let first = entity.get_or_create_component("Placeable", "p", QUIET, true).unwrap().core().id();
        let again = entity.get_or_create_component("placeable", "p", QUIET, true).unwrap().core().id();
        let other = entity.get_or_create_component("Placeable", "q", QUIET, true).unwrap().core().id();
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(entity.components_of_type("Placeable").len(), 2);
        assert!(entity.component_named("Placeable", "q").is_some());
    }

    #[test]
    fn test_component_events() {
        let mut scene = scene(true);
        let log = record(&scene);
        let entity = scene.create_entity(0, &[], ChangeMode::Disconnected, true).unwrap();
        let eid = entity.id();
        let cid = entity
            .create_component("Placeable", "", ChangeMode::Default, true)
            .unwrap()
            .core()
            .id();
        entity.remove_component(cid, ChangeMode::LocalOnly).unwrap();
        let events = log.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], SceneEvent::ComponentAdded { entity, mode: ChangeMode::Default, .. } if *entity == eid));
        assert!(matches!(&events[1], SceneEvent::ComponentRemoved { component, mode: ChangeMode::LocalOnly, .. } if component.id == cid));
    }

    #[test]
    fn test_removed_component_is_silent() {
        let mut scene = scene(true);
        let log = record(&scene);
        let entity = scene.create_entity(0, &["Placeable"], QUIET, true).unwrap();
        let cid = entity.component("Placeable").unwrap().core().id();
        let mut comp = entity.remove_component(cid, QUIET).unwrap();
        comp.core_mut()
            .set_attribute("pos", Vec3::ONE, ChangeMode::Default)
            .unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_attribute_across_components() {
        let mut scene = scene(true);
        let entity = scene
            .create_entity(0, &["DynamicComponent", "Placeable"], QUIET, true)
            .unwrap();
        assert_eq!(entity.attribute("Position").unwrap().id(), "pos");
        assert_eq!(entity.attributes("visible").len(), 1);
        assert!(entity.attribute("nope").is_none());
        assert!(entity.get::<scene_component::DynamicComponent>().is_some());
        assert!(entity.get::<scene_component::PlaceholderComponent>().is_some());
    }

    #[test]
    fn test_to_desc_skips_temporary_components() {
        let mut scene = scene(true);
        let entity = scene.create_entity(0, &["Placeable"], QUIET, true).unwrap();
        entity.set_name("door");
        entity
            .create_component("Placeable", "tmp", QUIET, true)
            .unwrap()
            .core_mut()
            .set_temporary(true);
        assert_eq!(entity.to_desc(false).components.len(), 1);
        let full = entity.to_desc(true);
        assert_eq!(full.components.len(), 2);
        assert_eq!(full.name, "door");
        assert_eq!(full.components[0].attributes[0].value, "0 0 0");
    }

    #[test]
    fn test_display() {
        let mut entity = Entity::new(4);
        assert_eq!(entity.to_string(), "Entity ID 4");
        entity.set_name("door");
        assert_eq!(entity.to_string(), "Entity \"door\" (ID: 4)");
    }
}
