//! The entity registry.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use scene_attribute::ChangeMode;
use scene_component::{
    ComponentTypeRegistry, EntityId, ObserverId, ReplicatedFlagPolicy, ReplicationPolicy,
};

use crate::desc::{EntityDesc, SceneDesc};
use crate::entity::Entity;
use crate::error::SceneError;
use crate::event::{SceneEvent, SceneEvents};
use crate::ids::{IdGenerator, IdRange};
use crate::interpolation::AttributeInterpolation;

/// What every entity of a scene shares with it.
pub(crate) struct SceneContext {
    pub(crate) registry: Rc<RefCell<ComponentTypeRegistry>>,
    pub(crate) events: Rc<SceneEvents>,
    pub(crate) policy: RefCell<Rc<dyn ReplicationPolicy>>,
    pub(crate) authority: Cell<bool>,
}

/// A named set of entities keyed by id.
///
/// Entity events are delivered with [`ChangeMode::Default`] resolved to
/// [`ChangeMode::Replicate`]; nothing is delivered for
/// [`ChangeMode::Disconnected`].
pub struct Scene {
    name: String,
    context: Rc<SceneContext>,
    pub(crate) entities: BTreeMap<EntityId, Entity>,
    ids: IdGenerator,
    pub(crate) interpolations: Vec<AttributeInterpolation>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("authority", &self.is_authority())
            .field("entities", &self.entities.len())
            .field("interpolations", &self.interpolations.len())
            .finish_non_exhaustive()
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.interpolations.clear();
        self.remove_all_entities(false, ChangeMode::Disconnected);
    }
}

impl Scene {
    /// An empty scene creating components through `registry`.
    ///
    /// An authoritative scene allocates replicated ids; a non-authoritative
    /// one allocates unacked ids until the authority assigns real ones.
    #[must_use]
    pub fn new(name: impl Into<String>, registry: Rc<RefCell<ComponentTypeRegistry>>, authority: bool) -> Self {
        let context = SceneContext {
            registry,
            events: Rc::new(SceneEvents::new()),
            policy: RefCell::new(Rc::new(ReplicatedFlagPolicy)),
            authority: Cell::new(authority),
        };
        Self {
            name: name.into(),
            context: Rc::new(context),
            entities: BTreeMap::new(),
            ids: IdGenerator::new(),
            interpolations: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_authority(&self) -> bool {
        self.context.authority.get()
    }

    pub fn set_authority(&mut self, authority: bool) {
        self.context.authority.set(authority);
    }

    #[must_use]
    pub fn registry(&self) -> &Rc<RefCell<ComponentTypeRegistry>> {
        &self.context.registry
    }

    #[must_use]
    pub fn events(&self) -> &Rc<SceneEvents> {
        &self.context.events
    }

    /// Subscribe to every event of this scene.
    pub fn subscribe(&self, observer: impl FnMut(&SceneEvent) + 'static) -> ObserverId {
        self.context.events.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.context.events.unsubscribe(id)
    }

    /// Install the authority decision for [`ChangeMode::Default`] writes on
    /// every current and future component.
    pub fn set_replication_policy(&mut self, policy: Rc<dyn ReplicationPolicy>) {
        for entity in self.entities.values() {
            for component in entity.components() {
                component.core().hub().set_policy(Rc::clone(&policy));
            }
        }
        *self.context.policy.borrow_mut() = policy;
    }

    // -- ids --

    /// A free id for a replicated entity: from the replicated range on an
    /// authoritative scene, from the unacked range otherwise.
    pub fn next_free_id(&mut self) -> EntityId {
        let range = if self.is_authority() {
            IdRange::Replicated
        } else {
            IdRange::Unacked
        };
        self.next_free_in(range)
    }

    /// A free id from the local range.
    pub fn next_free_id_local(&mut self) -> EntityId {
        self.next_free_in(IdRange::Local)
    }

    fn next_free_in(&mut self, range: IdRange) -> EntityId {
        loop {
            let id = self.ids.allocate(range);
            if !self.entities.contains_key(&id) {
                return id;
            }
        }
    }

    // -- lifecycle --

    /// Create an entity with the given components.
    ///
    /// `id == 0` allocates the next free replicated id. Unknown component
    /// types are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DuplicateEntityId`] if `id` is in use.
    pub fn create_entity(
        &mut self,
        id: EntityId,
        components: &[&str],
        mode: ChangeMode,
        replicated: bool,
    ) -> Result<&mut Entity, SceneError> {
        let id = if id == 0 { self.next_free_id() } else { id };
        self.insert_entity(Entity::new(id))?;
        let entity = self.entity_mut(id).ok_or(SceneError::EntityNotFound(id))?;
        for type_name in components {
            if let Err(e) = entity.create_component(type_name, "", mode, replicated) {
                tracing::warn!(error = %e, type_name, entity = id, "skipping component");
            }
        }
        self.emit_entity_created(id, mode);
        self.entity_mut(id).ok_or(SceneError::EntityNotFound(id))
    }

    /// Create an entity in the local range.
    ///
    /// # Errors
    ///
    /// As [`Scene::create_entity`].
    pub fn create_local_entity(&mut self, components: &[&str], mode: ChangeMode) -> Result<&mut Entity, SceneError> {
        let id = self.next_free_id_local();
        self.create_entity(id, components, mode, false)
    }

    /// Attach an unattached entity.
    ///
    /// # Errors
    ///
    /// Fails if the id is in use or the entity was attached before.
    pub fn add_entity(&mut self, entity: Entity, mode: ChangeMode) -> Result<EntityId, SceneError> {
        let id = if entity.id() == 0 {
            let mut entity = entity;
            let id = self.next_free_id();
            entity.set_id(id);
            self.insert_entity(entity)?;
            id
        } else {
            let id = entity.id();
            self.insert_entity(entity)?;
            id
        };
        self.emit_entity_created(id, mode);
        Ok(id)
    }

    fn insert_entity(&mut self, mut entity: Entity) -> Result<(), SceneError> {
        let id = entity.id();
        if self.entities.contains_key(&id) {
            tracing::error!(id, "can't create entity with given id because it's already used");
            return Err(SceneError::DuplicateEntityId(id));
        }
        entity.attach(Rc::clone(&self.context))?;
        self.ids.observe(id);
        self.entities.insert(id, entity);
        Ok(())
    }

    fn emit_entity_created(&self, entity: EntityId, mode: ChangeMode) {
        if let Some(mode) = entity_event_mode(mode) {
            self.context.events.emit(SceneEvent::EntityCreated { entity, mode });
        }
    }

    /// Remove an entity, destroying its components.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EntityNotFound`].
    pub fn remove_entity(&mut self, id: EntityId, mode: ChangeMode) -> Result<(), SceneError> {
        let mut entity = self.entities.remove(&id).ok_or(SceneError::EntityNotFound(id))?;
        if let Some(mode) = entity_event_mode(mode) {
            self.context.events.emit(SceneEvent::EntityRemoved { entity: id, mode });
        }
        entity.destroy();
        Ok(())
    }

    /// Remove every entity, optionally announcing each removal and a final
    /// [`SceneEvent::SceneCleared`].
    pub fn remove_all_entities(&mut self, send_events: bool, mode: ChangeMode) {
        let entities = std::mem::take(&mut self.entities);
        for (id, mut entity) in entities {
            if send_events && let Some(mode) = entity_event_mode(mode) {
                self.context.events.emit(SceneEvent::EntityRemoved { entity: id, mode });
            }
            entity.destroy();
        }
        self.ids.reset();
        if send_events {
            self.context.events.emit(SceneEvent::SceneCleared);
        }
    }

    /// Move an entity to a new id. An entity already at `new_id` is removed.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EntityNotFound`] if `old_id` does not exist.
    pub fn change_entity_id(&mut self, old_id: EntityId, new_id: EntityId) -> Result<(), SceneError> {
        if old_id == new_id {
            return Ok(());
        }
        let mut entity = self.entities.remove(&old_id).ok_or(SceneError::EntityNotFound(old_id))?;
        if self.entities.contains_key(&new_id) {
            tracing::warn!(new_id, "purged entity to make room for an id change");
            self.remove_entity(new_id, ChangeMode::LocalOnly)?;
        }
        entity.set_id(new_id);
        self.ids.observe(new_id);
        self.entities.insert(new_id, entity);
        for interp in &mut self.interpolations {
            if interp.entity == old_id {
                interp.entity = new_id;
            }
        }
        Ok(())
    }

    // -- lookup --

    #[must_use]
    pub fn has_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    #[must_use]
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The first entity, in id order, with this name.
    #[must_use]
    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.values().find(|e| e.name() == name)
    }

    pub fn entity_by_name_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.values_mut().find(|e| e.name() == name)
    }

    /// Whether at most one entity has this name.
    #[must_use]
    pub fn is_unique_name(&self, name: &str) -> bool {
        self.entities.values().filter(|e| e.name() == name).take(2).count() < 2
    }

    /// Entities with a component of `type_name`, optionally also matching
    /// the instance name.
    #[must_use]
    pub fn entities_with_component(&self, type_name: &str, name: Option<&str>) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| match name {
                Some(name) => e.component_named(type_name, name).is_some(),
                None => e.has_component(type_name),
            })
            .map(Entity::id)
            .collect()
    }

    /// Entities whose name contains `substring`.
    #[must_use]
    pub fn find_entities_containing(&self, substring: &str, case_sensitive: bool) -> Vec<EntityId> {
        let needle = substring.to_lowercase();
        self.entities
            .values()
            .filter(|e| {
                if case_sensitive {
                    e.name().contains(substring)
                } else {
                    e.name().to_lowercase().contains(&needle)
                }
            })
            .map(Entity::id)
            .collect()
    }

    // -- documents --

    /// The persisted form of the scene. Temporary and local entities (and
    /// temporary components) are included only when asked for.
    #[must_use]
    pub fn to_desc(&self, include_temporary: bool, include_local: bool) -> SceneDesc {
        SceneDesc {
            name: self.name.clone(),
            entities: self
                .entities
                .values()
                .filter(|e| include_local || !e.is_local())
                .filter(|e| include_temporary || !e.is_temporary())
                .map(|e| e.to_desc(include_temporary))
                .collect(),
        }
    }

    /// Instantiate the entities of a document.
    ///
    /// With `use_ids` the document's entity ids are kept and an existing
    /// entity with the same id is replaced; otherwise (and for entities
    /// without an id) fresh ids are allocated. Component types not in the
    /// registry are registered as placeholders from their descriptors.
    /// Attribute values are applied silently; once everything is in place
    /// `EntityCreated` and a change of every attribute are announced with
    /// `mode`.
    ///
    /// # Errors
    ///
    /// Fails only if an entity cannot be created; bad components are logged
    /// and skipped.
    pub fn create_content_from_desc(
        &mut self,
        desc: &SceneDesc,
        use_ids: bool,
        mode: ChangeMode,
    ) -> Result<Vec<EntityId>, SceneError> {
        if desc.entities.is_empty() {
            tracing::warn!(scene = %self.name, "empty scene description");
        }
        let mut created = Vec::with_capacity(desc.entities.len());
        for entity_desc in &desc.entities {
            let id = self.resolve_document_id(entity_desc.id, entity_desc.local, use_ids)?;
            self.insert_entity(Entity::new(id))?;
            let entity = self.entity_mut(id).ok_or(SceneError::EntityNotFound(id))?;
            entity.set_name(entity_desc.name.clone());
            entity.set_description(entity_desc.description.clone());
            entity.set_temporary(entity_desc.temporary);
            self.fill_entity(id, entity_desc)?;
            created.push(id);
        }
        self.announce_created(&created, mode);
        Ok(created)
    }

    /// The id a document entity is created under, making room for it if it
    /// is taken.
    pub(crate) fn resolve_document_id(&mut self, id: EntityId, local: bool, use_ids: bool) -> Result<EntityId, SceneError> {
        if !use_ids || id == 0 {
            let local = local || IdRange::of(id) == IdRange::Local;
            return Ok(if local {
                self.next_free_id_local()
            } else {
                self.next_free_id()
            });
        }
        if self.has_entity(id) {
            tracing::warn!(id, "destroying previous entity to avoid an id conflict with a loaded entity");
            self.remove_entity(id, ChangeMode::Replicate)?;
        }
        Ok(id)
    }

    fn fill_entity(&mut self, id: EntityId, desc: &EntityDesc) -> Result<(), SceneError> {
        let registry = Rc::clone(&self.context.registry);
        let entity = self.entity_mut(id).ok_or(SceneError::EntityNotFound(id))?;
        for comp_desc in &desc.components {
            if comp_desc.type_name.is_empty() {
                continue;
            }
            ensure_type_known(&registry, comp_desc);
            if let Some(existing) = entity.component_named_mut(&comp_desc.type_name, &comp_desc.name) {
                existing.apply_desc(comp_desc, ChangeMode::Disconnected)?;
                continue;
            }
            let created = registry.borrow().create_component_by_name(&comp_desc.type_name);
            let mut component = match created {
                Ok(component) => component,
                Err(e) => {
                    tracing::error!(error = %e, entity = id, "failed to load component");
                    continue;
                }
            };
            component.core_mut().set_replicated(comp_desc.sync)?;
            component.core_mut().set_temporary(comp_desc.temporary);
            if let Err(e) = component.apply_desc(comp_desc, ChangeMode::Disconnected) {
                tracing::error!(error = %e, entity = id, "failed to load component");
                continue;
            }
            entity.add_component(component, ChangeMode::Disconnected)?;
        }
        Ok(())
    }

    pub(crate) fn announce_created(&self, created: &[EntityId], mode: ChangeMode) {
        for id in created {
            self.emit_entity_created(*id, mode);
            if let Some(entity) = self.entity(*id) {
                entity.components_changed(mode);
            }
        }
    }

    /// Copy an entity under a new replicated or local id.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EntityNotFound`].
    pub fn clone_entity(&mut self, id: EntityId, local: bool, temporary: bool) -> Result<EntityId, SceneError> {
        let source = self.entity(id).ok_or(SceneError::EntityNotFound(id))?;
        let mut desc = source.to_desc(true);
        desc.id = 0;
        desc.local = local;
        let doc = SceneDesc {
            name: String::new(),
            entities: vec![desc],
        };
        let created = self.create_content_from_desc(&doc, false, ChangeMode::Default)?;
        let new_id = created.first().copied().ok_or(SceneError::EntityNotFound(id))?;
        if let Some(entity) = self.entity_mut(new_id) {
            entity.set_temporary(temporary);
        }
        Ok(new_id)
    }
}

/// Register a placeholder for a component type the registry does not know.
pub(crate) fn ensure_type_known(registry: &RefCell<ComponentTypeRegistry>, desc: &scene_component::ComponentDesc) {
    let known = {
        let registry = registry.borrow();
        registry.is_component_type_registered(&desc.type_name) || registry.is_placeholder_type(&desc.type_name)
    };
    if known {
        return;
    }
    match registry.borrow_mut().register_placeholder_type(desc) {
        Ok(type_id) => tracing::info!(type_name = %desc.type_name, %type_id, "registered placeholder for unknown component type"),
        Err(e) => tracing::error!(error = %e, "failed to register placeholder component type"),
    }
}

fn entity_event_mode(mode: ChangeMode) -> Option<ChangeMode> {
    match mode {
        ChangeMode::Disconnected => None,
        ChangeMode::Default => Some(ChangeMode::Replicate),
        other => Some(other),
    }
}
