//! The runtime root: component type registry plus named scenes.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::Rc;

use scene_component::{
    Component, ComponentDesc, ComponentFactory, ComponentTypeId, ComponentTypeRegistry, ReplicatedFlagPolicy,
    ReplicationPolicy,
};

use crate::error::SceneError;
use crate::scene::Scene;

/// Owns the component type registry and the scenes created through it.
///
/// Scenes are keyed by name. The first scene created becomes the default
/// until another is chosen with [`SceneManager::set_default_scene`].
pub struct SceneManager {
    registry: Rc<RefCell<ComponentTypeRegistry>>,
    scenes: BTreeMap<String, Scene>,
    default_scene: Option<String>,
    policy: Rc<dyn ReplicationPolicy>,
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneManager")
            .field("scenes", &self.scenes.keys().collect::<Vec<_>>())
            .field("default_scene", &self.default_scene)
            .finish_non_exhaustive()
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneManager {
    /// A manager with the built-in component types registered.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(ComponentTypeRegistry::with_builtins())
    }

    #[must_use]
    pub fn with_registry(registry: ComponentTypeRegistry) -> Self {
        Self {
            registry: Rc::new(RefCell::new(registry)),
            scenes: BTreeMap::new(),
            default_scene: None,
            policy: Rc::new(ReplicatedFlagPolicy),
        }
    }

    // -- registry --

    #[must_use]
    pub fn registry(&self) -> Ref<'_, ComponentTypeRegistry> {
        self.registry.borrow()
    }

    pub fn registry_mut(&self) -> RefMut<'_, ComponentTypeRegistry> {
        self.registry.borrow_mut()
    }

    /// # Errors
    ///
    /// See [`ComponentTypeRegistry::register_factory`].
    pub fn register_component_factory(&self, factory: Rc<dyn ComponentFactory>) -> Result<(), SceneError> {
        Ok(self.registry.borrow_mut().register_factory(factory)?)
    }

    /// # Errors
    ///
    /// See [`ComponentTypeRegistry::register_placeholder_type`].
    pub fn register_placeholder_component_type(&self, desc: &ComponentDesc) -> Result<ComponentTypeId, SceneError> {
        Ok(self.registry.borrow_mut().register_placeholder_type(desc)?)
    }

    /// A free-standing component with the given instance name.
    ///
    /// # Errors
    ///
    /// Fails if the type is unknown.
    pub fn create_component_by_name(&self, type_name: &str, name: &str) -> Result<Box<dyn Component>, SceneError> {
        let mut component = self.registry.borrow().create_component_by_name(type_name)?;
        component.core_mut().set_name(name);
        Ok(component)
    }

    /// # Errors
    ///
    /// Fails if the type id is unknown.
    pub fn create_component_by_id(&self, type_id: ComponentTypeId, name: &str) -> Result<Box<dyn Component>, SceneError> {
        let mut component = self.registry.borrow().create_component_by_id(type_id)?;
        component.core_mut().set_name(name);
        Ok(component)
    }

    /// Install the authority decision for [`ChangeMode::Default`](scene_attribute::ChangeMode::Default)
    /// writes in every scene, current and future.
    pub fn set_replication_policy(&mut self, policy: Rc<dyn ReplicationPolicy>) {
        for scene in self.scenes.values_mut() {
            scene.set_replication_policy(Rc::clone(&policy));
        }
        self.policy = policy;
    }

    // -- scenes --

    /// Create a scene.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DuplicateScene`] if the name is taken.
    pub fn create_scene(&mut self, name: &str, authority: bool) -> Result<&mut Scene, SceneError> {
        if self.scenes.contains_key(name) {
            tracing::error!(scene = name, "scene already exists");
            return Err(SceneError::DuplicateScene(name.to_string()));
        }
        let mut scene = Scene::new(name, Rc::clone(&self.registry), authority);
        scene.set_replication_policy(Rc::clone(&self.policy));
        tracing::info!(scene = name, authority, "created scene");
        if self.default_scene.is_none() {
            self.default_scene = Some(name.to_string());
        }
        Ok(self.scenes.entry(name.to_string()).or_insert(scene))
    }

    /// Remove a scene and every entity in it.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::SceneNotFound`].
    pub fn remove_scene(&mut self, name: &str) -> Result<(), SceneError> {
        let mut scene = self
            .scenes
            .remove(name)
            .ok_or_else(|| SceneError::SceneNotFound(name.to_string()))?;
        scene.end_all_attribute_interpolations();
        scene.remove_all_entities(false, scene_attribute::ChangeMode::Disconnected);
        if self.default_scene.as_deref() == Some(name) {
            self.default_scene = None;
        }
        tracing::info!(scene = name, "removed scene");
        Ok(())
    }

    #[must_use]
    pub fn has_scene(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    #[must_use]
    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(name)
    }

    /// Scene names in order.
    #[must_use]
    pub fn scene_names(&self) -> Vec<&str> {
        self.scenes.keys().map(String::as_str).collect()
    }

    /// # Errors
    ///
    /// Returns [`SceneError::SceneNotFound`].
    pub fn set_default_scene(&mut self, name: &str) -> Result<(), SceneError> {
        if !self.scenes.contains_key(name) {
            return Err(SceneError::SceneNotFound(name.to_string()));
        }
        self.default_scene = Some(name.to_string());
        Ok(())
    }

    #[must_use]
    pub fn default_scene(&self) -> Option<&Scene> {
        self.default_scene.as_deref().and_then(|n| self.scenes.get(n))
    }

    /// # Errors
    ///
    /// Returns [`SceneError::NoDefaultScene`].
    pub fn default_scene_mut(&mut self) -> Result<&mut Scene, SceneError> {
        let name = self.default_scene.as_deref().ok_or(SceneError::NoDefaultScene)?;
        self.scenes.get_mut(name).ok_or(SceneError::NoDefaultScene)
    }
}
