//! Component type registry.
//!
//! Maps type names and ids to compiled factories, and falls back to
//! placeholder descriptors for types this build does not know. Names compare
//! ignoring ASCII case. The registry is an ordinary value owned by the
//! runtime root; there is no process-wide instance.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use scene_attribute::{Attribute, AttributeKind, kind};

use crate::component::Component;
use crate::desc::ComponentDesc;
use crate::dynamic::DynamicComponent;
use crate::error::ComponentError;
use crate::placeholder::PlaceholderComponent;
use crate::type_id::ComponentTypeId;

/// Creates instances of one compiled component type.
pub trait ComponentFactory {
    fn type_name(&self) -> &str;

    fn type_id(&self) -> ComponentTypeId;

    fn create(&self) -> Box<dyn Component>;
}

/// A [`ComponentFactory`] backed by a constructor function.
pub struct FnFactory {
    type_name: String,
    type_id: ComponentTypeId,
    create: Box<dyn Fn() -> Box<dyn Component>>,
}

impl FnFactory {
    #[must_use]
    pub fn new(
        type_name: impl Into<String>,
        type_id: ComponentTypeId,
        create: impl Fn() -> Box<dyn Component> + 'static,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            type_id,
            create: Box::new(create),
        }
    }

    /// Factory for a component type with a `Default` constructor.
    #[must_use]
    pub fn of<T: Component + Default>(type_name: impl Into<String>, type_id: ComponentTypeId) -> Self {
        Self::new(type_name, type_id, || Box::new(T::default()))
    }
}

impl fmt::Debug for FnFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory")
            .field("type_name", &self.type_name)
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

impl ComponentFactory for FnFactory {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn type_id(&self) -> ComponentTypeId {
        self.type_id
    }

    fn create(&self) -> Box<dyn Component> {
        (self.create)()
    }
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Type name / id to factory or placeholder descriptor.
#[derive(Default)]
pub struct ComponentTypeRegistry {
    factories: HashMap<String, Rc<dyn ComponentFactory>>,
    factory_ids: HashMap<ComponentTypeId, Rc<dyn ComponentFactory>>,
    placeholders: HashMap<String, ComponentDesc>,
    placeholder_ids: HashMap<ComponentTypeId, String>,
}

impl fmt::Debug for ComponentTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTypeRegistry")
            .field("factories", &self.component_types())
            .field("placeholders", &self.placeholder_types())
            .finish()
    }
}

impl ComponentTypeRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in component types registered.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let dynamic = FnFactory::of::<DynamicComponent>(DynamicComponent::TYPE_NAME, DynamicComponent::TYPE_ID);
        if let Err(e) = registry.register_factory(Rc::new(dynamic)) {
            tracing::error!(error = %e, "failed to register built-in component");
        }
        registry
    }

    /// Register a compiled factory.
    ///
    /// Registering the same factory twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::RegistryConflict`] if the name or id is
    /// already taken by a different factory or by a placeholder type. The
    /// existing registration is kept.
    pub fn register_factory(&mut self, factory: Rc<dyn ComponentFactory>) -> Result<(), ComponentError> {
        let name = factory.type_name().to_string();
        let type_id = factory.type_id();
        let conflict = || {
            tracing::error!(
                type_name = %name,
                %type_id,
                "component type already registered by a different factory"
            );
            ComponentError::RegistryConflict {
                type_name: name.clone(),
                type_id,
            }
        };

        let by_name = self.factories.get(&key(&name));
        let by_id = self.factory_ids.get(&type_id);
        if let (Some(a), Some(b)) = (by_name, by_id)
            && Rc::ptr_eq(a, &factory)
            && Rc::ptr_eq(b, &factory)
        {
            return Ok(());
        }
        if by_name.is_some()
            || by_id.is_some()
            || self.placeholders.contains_key(&key(&name))
            || self.placeholder_ids.contains_key(&type_id)
        {
            return Err(conflict());
        }

        tracing::debug!(type_name = %name, %type_id, "registered component factory");
        self.factories.insert(key(&name), Rc::clone(&factory));
        self.factory_ids.insert(type_id, factory);
        Ok(())
    }

    /// Register a descriptor for a type with no compiled factory.
    ///
    /// Without a type id in `desc`, one is derived from the name. A
    /// placeholder already registered under the same name and id is
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::RegistryConflict`] if the name or id
    /// belongs to a compiled factory or to a placeholder of another name.
    pub fn register_placeholder_type(&mut self, desc: &ComponentDesc) -> Result<ComponentTypeId, ComponentError> {
        let name = key(&desc.type_name);
        let type_id = if desc.type_id.is_none() {
            ComponentTypeId::placeholder_for_name(&desc.type_name)
        } else {
            desc.type_id
        };
        let taken_by_other = self
            .placeholder_ids
            .get(&type_id)
            .is_some_and(|existing| *existing != name);
        let renumbered = self
            .placeholders
            .get(&name)
            .is_some_and(|existing| existing.type_id != type_id);
        if self.factories.contains_key(&name)
            || self.factory_ids.contains_key(&type_id)
            || taken_by_other
            || renumbered
        {
            tracing::error!(
                type_name = %desc.type_name,
                %type_id,
                "placeholder type conflicts with an existing registration"
            );
            return Err(ComponentError::RegistryConflict {
                type_name: desc.type_name.clone(),
                type_id,
            });
        }

        let mut stored = desc.clone();
        stored.type_id = type_id;
        tracing::debug!(type_name = %desc.type_name, %type_id, "registered placeholder component type");
        self.placeholder_ids.insert(type_id, name.clone());
        self.placeholders.insert(name, stored);
        Ok(type_id)
    }

    /// Create a component by type name: compiled factory first, then
    /// placeholder descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::UnknownTypeName`] if neither exists.
    pub fn create_component_by_name(&self, type_name: &str) -> Result<Box<dyn Component>, ComponentError> {
        let name = key(type_name);
        if let Some(factory) = self.factories.get(&name) {
            return Ok(factory.create());
        }
        if let Some(desc) = self.placeholders.get(&name) {
            return Ok(Box::new(PlaceholderComponent::from_desc(desc)?));
        }
        tracing::error!(type_name, "unknown component type");
        Err(ComponentError::UnknownTypeName(type_name.to_string()))
    }

    /// Create a component by type id.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::UnknownTypeId`] if neither a factory nor a
    /// placeholder has this id.
    pub fn create_component_by_id(&self, type_id: ComponentTypeId) -> Result<Box<dyn Component>, ComponentError> {
        if let Some(factory) = self.factory_ids.get(&type_id) {
            return Ok(factory.create());
        }
        if let Some(desc) = self.placeholder_ids.get(&type_id).and_then(|n| self.placeholders.get(n)) {
            return Ok(Box::new(PlaceholderComponent::from_desc(desc)?));
        }
        tracing::error!(%type_id, "unknown component type id");
        Err(ComponentError::UnknownTypeId(type_id))
    }

    /// Create a new component of the same type as `component` and copy its
    /// attribute values and name.
    ///
    /// # Errors
    ///
    /// Fails if the type is not registered.
    pub fn clone_component(&self, component: &dyn Component) -> Result<Box<dyn Component>, ComponentError> {
        let mut copy = self.create_component_by_name(component.core().type_name())?;
        copy.apply_desc(&component.to_desc(), scene_attribute::ChangeMode::Disconnected)?;
        Ok(copy)
    }

    /// Create a dynamic attribute of the named attribute type.
    ///
    /// # Errors
    ///
    /// Fails if the attribute type name is unknown.
    pub fn create_attribute(&self, type_name: &str, id: &str, name: &str) -> Result<Attribute, ComponentError> {
        let kind = AttributeKind::from_type_name(type_name).inspect_err(|e| {
            tracing::error!(error = %e, attribute = %id, "cannot create attribute");
        })?;
        Ok(Attribute::new_dynamic(kind, id, name))
    }

    /// Create a dynamic attribute by attribute type id.
    ///
    /// # Errors
    ///
    /// Fails if the attribute type id is unknown.
    pub fn create_attribute_by_type_id(&self, type_id: u32, id: &str) -> Result<Attribute, ComponentError> {
        let kind = AttributeKind::from_type_id(type_id)?;
        Ok(Attribute::new_dynamic(kind, id, id))
    }

    #[must_use]
    pub fn is_component_type_registered(&self, type_name: &str) -> bool {
        self.factories.contains_key(&key(type_name))
    }

    #[must_use]
    pub fn is_placeholder_type(&self, type_name: &str) -> bool {
        self.placeholders.contains_key(&key(type_name))
    }

    #[must_use]
    pub fn placeholder_desc(&self, type_name: &str) -> Option<&ComponentDesc> {
        self.placeholders.get(&key(type_name))
    }

    /// Type id for a name, from either map.
    #[must_use]
    pub fn component_type_id_for_name(&self, type_name: &str) -> Option<ComponentTypeId> {
        let name = key(type_name);
        self.factories
            .get(&name)
            .map(|f| f.type_id())
            .or_else(|| self.placeholders.get(&name).map(|d| d.type_id))
    }

    /// Canonical type name for an id, from either map.
    #[must_use]
    pub fn component_type_name_for_id(&self, type_id: ComponentTypeId) -> Option<&str> {
        self.factory_ids
            .get(&type_id)
            .map(|f| f.type_name())
            .or_else(|| {
                self.placeholder_ids
                    .get(&type_id)
                    .and_then(|n| self.placeholders.get(n))
                    .map(|d| d.type_name.as_str())
            })
    }

    /// Names of the compiled component types, sorted.
    #[must_use]
    pub fn component_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.values().map(|f| f.type_name()).collect();
        names.sort_unstable();
        names
    }

    /// Names of the placeholder component types, sorted.
    #[must_use]
    pub fn placeholder_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.placeholders.values().map(|d| d.type_name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// See [`kind::type_id_for_type_name`].
    #[must_use]
    pub fn attribute_type_id_for_type_name(&self, type_name: &str) -> u32 {
        kind::type_id_for_type_name(type_name)
    }

    /// See [`kind::type_name_for_type_id`].
    #[must_use]
    pub fn attribute_type_name_for_type_id(&self, type_id: u32) -> &'static str {
        kind::type_name_for_type_id(type_id)
    }

    /// All attribute type names, in type id order.
    #[must_use]
    pub fn attribute_types(&self) -> Vec<&'static str> {
        AttributeKind::ALL.iter().map(|k| k.type_name()).collect()
    }
}
