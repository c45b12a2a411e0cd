//! The [`Component`] trait.

use std::any::Any;

use scene_attribute::{Attribute, AttributeKind, ChangeMode, WireReader, WireWriter};

use crate::base::ComponentCore;
use crate::desc::ComponentDesc;
use crate::error::ComponentError;

/// A component: a [`ComponentCore`] plus type-specific behaviour.
///
/// Implementors only need to expose their core and the `Any` accessors;
/// serialization and dynamic attribute management have default
/// implementations that types such as
/// [`DynamicComponent`](crate::DynamicComponent) override.
pub trait Component: Any {
    fn core(&self) -> &ComponentCore;

    fn core_mut(&mut self) -> &mut ComponentCore;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Whether attributes may be created and removed at runtime.
    fn supports_dynamic_attributes(&self) -> bool {
        false
    }

    fn serialize_to_binary(&self, writer: &mut WireWriter) {
        self.core().serialize_to_binary(writer);
    }

    /// # Errors
    ///
    /// See [`ComponentCore::deserialize_from_binary`].
    fn deserialize_from_binary(
        &mut self,
        reader: &mut WireReader<'_>,
        mode: ChangeMode,
    ) -> Result<(), ComponentError> {
        self.core_mut().deserialize_from_binary(reader, mode)
    }

    fn to_desc(&self) -> ComponentDesc {
        self.core().to_desc()
    }

    /// # Errors
    ///
    /// See [`ComponentCore::apply_desc`].
    fn apply_desc(&mut self, desc: &ComponentDesc, mode: ChangeMode) -> Result<(), ComponentError> {
        self.core_mut().apply_desc(desc, mode)
    }

    /// Create a dynamic attribute of the named attribute type.
    ///
    /// # Errors
    ///
    /// Fails if the component does not support dynamic attributes, the type
    /// name is unknown, or the id is taken.
    fn create_attribute(
        &mut self,
        type_name: &str,
        id: &str,
        name: &str,
        mode: ChangeMode,
    ) -> Result<u8, ComponentError> {
        self.check_dynamic()?;
        let kind = AttributeKind::from_type_name(type_name).inspect_err(|e| {
            tracing::error!(error = %e, attribute = %id, "cannot create attribute");
        })?;
        self.core_mut()
            .insert_dynamic(Attribute::new_dynamic(kind, id, name), mode)
    }

    /// Create a dynamic attribute at a fixed index, by attribute type id.
    /// Used when mirroring a remote component's attribute layout.
    ///
    /// # Errors
    ///
    /// As [`Component::create_attribute`], and fails for static slots.
    fn create_attribute_at(
        &mut self,
        index: u8,
        type_id: u32,
        id: &str,
        mode: ChangeMode,
    ) -> Result<(), ComponentError> {
        self.check_dynamic()?;
        let kind = AttributeKind::from_type_id(type_id)?;
        self.core_mut()
            .insert_dynamic_at(index, Attribute::new_dynamic(kind, id, id), mode)
    }

    /// Remove the dynamic attribute at `index`.
    ///
    /// # Errors
    ///
    /// Fails if the component does not support dynamic attributes or the slot
    /// is static or empty.
    fn remove_attribute(&mut self, index: u8, mode: ChangeMode) -> Result<Attribute, ComponentError> {
        self.check_dynamic()?;
        self.core_mut().remove_at(index, mode)
    }

    #[doc(hidden)]
    fn check_dynamic(&self) -> Result<(), ComponentError> {
        if self.supports_dynamic_attributes() {
            return Ok(());
        }
        let type_name = self.core().type_name().to_string();
        tracing::error!(component = %type_name, "component does not support dynamic attributes");
        Err(ComponentError::DynamicAttributesUnsupported(type_name))
    }
}

impl dyn Component {
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.core().type_name()
    }

    #[must_use]
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

#[cfg(test)]
mod tests {
    use scene_attribute::Vec3;

    use super::*;
    use crate::type_id::ComponentTypeId;

    struct Placeable {
        core: ComponentCore,
    }

    impl Placeable {
        fn new() -> Self {
            let mut core = ComponentCore::new("Placeable", ComponentTypeId(20));
            core.add_static(Attribute::with_name("pos", "Position", Vec3::ZERO))
                .unwrap();
            Self { core }
        }
    }

    impl Component for Placeable {
        fn core(&self) -> &ComponentCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut ComponentCore {
            &mut self.core
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_static_component_rejects_dynamic_attributes() {
        let mut comp = Placeable::new();
        assert_eq!(
            comp.create_attribute("int", "n", "n", ChangeMode::LocalOnly),
            Err(ComponentError::DynamicAttributesUnsupported("Placeable".into()))
        );
        assert!(comp.remove_attribute(0, ChangeMode::LocalOnly).is_err());
    }

    #[test]
    fn test_downcast() {
        let mut boxed: Box<dyn Component> = Box::new(Placeable::new());
        assert_eq!(boxed.type_name(), "Placeable");
        assert!(boxed.downcast_ref::<Placeable>().is_some());
        let placeable = boxed.downcast_mut::<Placeable>().unwrap();
        placeable
            .core
            .set_attribute("position", Vec3::X, ChangeMode::LocalOnly)
            .unwrap();
        assert_eq!(boxed.core().attribute_as::<Vec3>("pos"), Some(&Vec3::X));
    }
}
