//! Components assembled from a descriptor.

use std::any::Any;

use scene_attribute::{Attribute, AttributeKind, ChangeMode};

use crate::base::ComponentCore;
use crate::component::Component;
use crate::desc::ComponentDesc;
use crate::error::ComponentError;
use crate::type_id::ComponentTypeId;

/// Stand-in for a component type this build has no compiled support for.
///
/// One dynamic attribute is created per [`AttributeDesc`](crate::AttributeDesc),
/// in order, holding the descriptor's value. Text and binary round trips
/// reproduce the values exactly, so unknown data is stored and re-emitted
/// instead of being dropped.
#[derive(Debug)]
pub struct PlaceholderComponent {
    core: ComponentCore,
    desc: ComponentDesc,
}

impl PlaceholderComponent {
    /// Build from a registered descriptor.
    ///
    /// If the descriptor has no type id, the name-derived one is used.
    ///
    /// # Errors
    ///
    /// Fails if an attribute descriptor names an unknown attribute type or
    /// two attribute descriptors share an id.
    pub fn from_desc(desc: &ComponentDesc) -> Result<Self, ComponentError> {
        let type_id = if desc.type_id.is_none() {
            ComponentTypeId::placeholder_for_name(&desc.type_name)
        } else {
            desc.type_id
        };
        let mut core = ComponentCore::new(desc.type_name.clone(), type_id);
        for attr_desc in &desc.attributes {
            let kind = AttributeKind::from_type_name(&attr_desc.type_name)?;
            let mut attr = Attribute::new_dynamic(kind, attr_desc.id.clone(), attr_desc.display_name());
            attr.from_text_or_default(&attr_desc.value, ChangeMode::Disconnected);
            attr.clear_changed_flag();
            core.insert_dynamic(attr, ChangeMode::Disconnected)?;
        }
        core.set_name(desc.name.clone());
        let mut desc = desc.clone();
        desc.type_id = type_id;
        Ok(Self { core, desc })
    }

    /// The descriptor this placeholder was built from.
    #[must_use]
    pub fn desc(&self) -> &ComponentDesc {
        &self.desc
    }
}

impl Component for PlaceholderComponent {
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

#[cfg(test)]
mod tests {
    use scene_attribute::{AssetReferenceList, Vec3, WireReader, WireWriter};

    use super::*;
    use crate::desc::AttributeDesc;

    fn sparkles() -> ComponentDesc {
        ComponentDesc::new("Sparkles")
            .with_attribute(AttributeDesc::new("rate", "real", "2.5").with_name("Emission rate"))
            .with_attribute(AttributeDesc::new("color", "float3", "1 0.5 0"))
            .with_attribute(AttributeDesc::new("textures", "assetreferencelist", "a.png;b.png"))
    }

    #[test]
    fn test_attributes_follow_descriptor() {
        let comp = PlaceholderComponent::from_desc(&sparkles()).unwrap();
        let core = comp.core();
        assert_eq!(core.attribute_ids(), vec!["rate", "color", "textures"]);
        assert_eq!(core.attribute("Emission rate").unwrap().id(), "rate");
        assert_eq!(core.attribute_as::<f32>("rate"), Some(&2.5));
        assert_eq!(core.attribute_as::<Vec3>("color"), Some(&Vec3::new(1.0, 0.5, 0.0)));
        assert_eq!(core.attribute_as::<AssetReferenceList>("textures").map(AssetReferenceList::len), Some(2));
        assert!(core.attributes().all(Attribute::is_dynamic));
        assert!(comp.core().type_id().is_placeholder_range());
        assert_eq!(comp.desc().type_id, comp.core().type_id());
    }

    #[test]
    fn test_text_reemission_is_exact() {
        let desc = sparkles();
        let comp = PlaceholderComponent::from_desc(&desc).unwrap();
        let out = comp.to_desc();
        for (a, b) in desc.attributes.iter().zip(&out.attributes) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.value, b.value);
            assert_eq!(a.type_name, b.type_name);
        }
    }

    #[test]
    fn test_binary_reemission_is_exact() {
        let desc = sparkles();
        let src = PlaceholderComponent::from_desc(&desc).unwrap();
        let mut w = WireWriter::new();
        src.serialize_to_binary(&mut w);

        let mut blank = desc.clone();
        for a in &mut blank.attributes {
            a.value.clear();
        }
        let mut dst = PlaceholderComponent::from_desc(&blank).unwrap();
        dst.deserialize_from_binary(&mut WireReader::new(w.as_bytes()), ChangeMode::LocalOnly)
            .unwrap();
        assert_eq!(dst.to_desc().attributes, src.to_desc().attributes);
    }

    #[test]
    fn test_unknown_attribute_type() {
        let desc = ComponentDesc::new("Odd").with_attribute(AttributeDesc::new("x", "matrix9", ""));
        assert!(matches!(
            PlaceholderComponent::from_desc(&desc),
            Err(ComponentError::Attribute(_))
        ));
    }

    #[test]
    fn test_explicit_type_id_is_kept() {
        let desc = sparkles().with_type_id(ComponentTypeId(4242));
        let comp = PlaceholderComponent::from_desc(&desc).unwrap();
        assert_eq!(comp.core().type_id(), ComponentTypeId(4242));
    }
}
