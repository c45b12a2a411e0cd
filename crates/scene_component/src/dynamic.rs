//! A component whose attributes are all created at runtime.
//!
//! Scripts and editors use it to attach arbitrary data to an entity. Its
//! binary form is self-describing (`count, {id, type name, value text}*`),
//! so the receiving side can reconstruct the attribute set without any
//! prior schema.

use std::any::Any;
use std::cmp::Ordering;

use scene_attribute::{Attribute, AttributeKind, ChangeMode, WireReader, WireWriter};

use crate::base::ComponentCore;
use crate::component::Component;
use crate::desc::ComponentDesc;
use crate::error::ComponentError;
use crate::type_id::ComponentTypeId;

/// One attribute of a self-describing payload.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    id: String,
    type_name: String,
    value: String,
}

fn cmp_ids(a: &str, b: &str) -> Ordering {
    a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase())
}

#[derive(Debug)]
pub struct DynamicComponent {
    core: ComponentCore,
}

impl Default for DynamicComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicComponent {
    pub const TYPE_NAME: &'static str = "DynamicComponent";
    pub const TYPE_ID: ComponentTypeId = ComponentTypeId(25);

    #[must_use]
    pub fn new() -> Self {
        Self {
            core: ComponentCore::new(Self::TYPE_NAME, Self::TYPE_ID),
        }
    }

    /// Create an attribute, or return the index of the existing attribute
    /// with the same id.
    ///
    /// # Errors
    ///
    /// Fails if `type_name` is not an attribute type.
    pub fn add_attribute(&mut self, type_name: &str, id: &str, mode: ChangeMode) -> Result<u8, ComponentError> {
        if let Some(existing) = self.core.attribute_by_id(id) {
            return Ok(existing.index());
        }
        self.create_attribute(type_name, id, id, mode)
    }

    #[must_use]
    pub fn contains_attribute(&self, id: &str) -> bool {
        self.core.attribute_by_id(id).is_some()
    }

    /// Remove an attribute by id, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::NoSuchAttribute`] if there is none.
    pub fn remove_attribute_by_id(&mut self, id: &str, mode: ChangeMode) -> Result<Attribute, ComponentError> {
        let index = self
            .core
            .attribute_by_id(id)
            .map(Attribute::index)
            .ok_or_else(|| ComponentError::NoSuchAttribute(id.to_string()))?;
        self.core.remove_at(index, mode)
    }

    pub fn remove_all_attributes(&mut self, mode: ChangeMode) {
        let indices: Vec<u8> = self.core.attributes().map(Attribute::index).collect();
        for index in indices.into_iter().rev() {
            if let Err(e) = self.core.remove_at(index, mode) {
                tracing::warn!(index, error = %e, "failed to remove attribute");
            }
        }
    }

    /// Parse a text value into an existing attribute.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::NoSuchAttribute`] or a parse error; the value
    /// is left unchanged on error.
    pub fn set_attribute_from_text(&mut self, id: &str, text: &str, mode: ChangeMode) -> Result<(), ComponentError> {
        let attr = self
            .core
            .attribute_mut(id)
            .ok_or_else(|| ComponentError::NoSuchAttribute(id.to_string()))?;
        attr.from_text(text, mode)?;
        Ok(())
    }

    /// Whether both components hold attributes with the same ids and types,
    /// regardless of order and values.
    #[must_use]
    pub fn contains_same_attributes(&self, other: &DynamicComponent) -> bool {
        let signature = |c: &DynamicComponent| {
            let mut sig: Vec<(String, AttributeKind)> = c
                .core
                .attributes()
                .map(|a| (a.id().to_ascii_lowercase(), a.kind()))
                .collect();
            sig.sort();
            sig
        };
        signature(self) == signature(other)
    }

    /// Make the attribute set equal to `entries`: update the attributes that
    /// exist, create the missing ones, remove the rest.
    fn merge(&mut self, mut entries: Vec<Entry>, mode: ChangeMode) {
        entries.sort_by(|a, b| cmp_ids(&a.id, &b.id));
        let mut existing: Vec<(String, u8)> = self
            .core
            .attributes()
            .map(|a| (a.id().to_string(), a.index()))
            .collect();
        existing.sort_by(|a, b| cmp_ids(&a.0, &b.0));

        let mut to_add = Vec::new();
        let mut to_remove = Vec::new();
        let mut old = existing.into_iter().peekable();
        let mut new = entries.into_iter().peekable();
        loop {
            let order = match (old.peek(), new.peek()) {
                (None, None) => break,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some((id, _)), Some(entry)) => cmp_ids(id, &entry.id),
            };
            match order {
                Ordering::Less => {
                    if let Some((_, index)) = old.next() {
                        to_remove.push(index);
                    }
                }
                Ordering::Greater => {
                    if let Some(entry) = new.next() {
                        to_add.push(entry);
                    }
                }
                Ordering::Equal => {
                    if let (Some((_, index)), Some(entry)) = (old.next(), new.next()) {
                        if let Some(attr) = self.core.attribute_at_mut(index) {
                            attr.from_text_or_default(&entry.value, mode);
                        }
                    }
                }
            }
        }

        for index in to_remove.into_iter().rev() {
            if let Err(e) = self.core.remove_at(index, mode) {
                tracing::warn!(index, error = %e, "failed to remove attribute");
            }
        }
        for entry in to_add {
            let created = AttributeKind::from_type_name(&entry.type_name)
                .map_err(ComponentError::from)
                .and_then(|kind| {
                    let mut attr = Attribute::new_dynamic(kind, entry.id.clone(), entry.id.clone());
                    attr.from_text_or_default(&entry.value, ChangeMode::Disconnected);
                    self.core.insert_dynamic(attr, mode)
                });
            if let Err(e) = created {
                tracing::error!(
                    attribute = %entry.id,
                    type_name = %entry.type_name,
                    error = %e,
                    "failed to create attribute"
                );
            }
        }
    }
}

impl Component for DynamicComponent {
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

    fn supports_dynamic_attributes(&self) -> bool {
        true
    }

    fn serialize_to_binary(&self, writer: &mut WireWriter) {
        let count = writer.write_count(self.core.num_attributes());
        for attr in self.core.attributes().take(count) {
            writer.write_string(attr.id());
            writer.write_string(attr.type_name());
            writer.write_string(&attr.to_text());
        }
    }

    fn deserialize_from_binary(
        &mut self,
        reader: &mut WireReader<'_>,
        mode: ChangeMode,
    ) -> Result<(), ComponentError> {
        let count = reader.read_u8()?;
        let mut entries = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            entries.push(Entry {
                id: reader.read_string()?,
                type_name: reader.read_string()?,
                value: reader.read_string()?,
            });
        }
        self.merge(entries, mode);
        Ok(())
    }

    /// Descriptors carry the full attribute set, so applying one merges like
    /// the binary form does.
    fn apply_desc(&mut self, desc: &ComponentDesc, mode: ChangeMode) -> Result<(), ComponentError> {
        if !desc.matches_type(Self::TYPE_NAME, Self::TYPE_ID) {
            return Err(ComponentError::DescriptorTypeMismatch {
                expected: Self::TYPE_NAME.to_string(),
                found: desc.type_name.clone(),
            });
        }
        self.core.set_name(desc.name.clone());
        let entries = desc
            .attributes
            .iter()
            .map(|a| Entry {
                id: a.id.clone(),
                type_name: a.type_name.clone(),
                value: a.value.clone(),
            })
            .collect();
        self.merge(entries, mode);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use scene_attribute::Vec3;

    use super::*;
    use crate::desc::AttributeDesc;

    fn sample() -> DynamicComponent {
        let mut comp = DynamicComponent::new();
        comp.add_attribute("int", "hits", ChangeMode::LocalOnly).unwrap();
        comp.add_attribute("float3", "target", ChangeMode::LocalOnly).unwrap();
        comp.set_attribute_from_text("hits", "12", ChangeMode::LocalOnly).unwrap();
        comp.set_attribute_from_text("target", "1 2 3", ChangeMode::LocalOnly).unwrap();
        comp
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut comp = sample();
        let again = comp.add_attribute("int", "HITS", ChangeMode::LocalOnly).unwrap();
        assert_eq!(again, 0);
        assert_eq!(comp.core().num_attributes(), 2);
        assert!(comp.contains_attribute("Target"));
        assert!(comp.add_attribute("nosuchtype", "z", ChangeMode::LocalOnly).is_err());
    }

    #[test]
    fn test_remove_by_id() {
        let mut comp = sample();
        let removed = comp.remove_attribute_by_id("hits", ChangeMode::LocalOnly).unwrap();
        assert_eq!(removed.get::<i32>(), Some(&12));
        assert!(!comp.contains_attribute("hits"));
        assert!(comp.remove_attribute_by_id("hits", ChangeMode::LocalOnly).is_err());
        comp.remove_all_attributes(ChangeMode::LocalOnly);
        assert_eq!(comp.core().num_attributes(), 0);
    }

    #[test]
    fn test_self_describing_binary() {
        let src = sample();
        let mut w = WireWriter::new();
        src.serialize_to_binary(&mut w);
        assert_eq!(w.as_bytes()[0], 2);

        let mut dst = DynamicComponent::new();
        dst.deserialize_from_binary(&mut WireReader::new(w.as_bytes()), ChangeMode::LocalOnly)
            .unwrap();
        assert!(dst.contains_same_attributes(&src));
        assert_eq!(dst.core().attribute_as::<i32>("hits"), Some(&12));
        assert_eq!(dst.core().attribute_as::<Vec3>("target"), Some(&Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_merge_adds_updates_and_removes() {
        let mut comp = sample();
        let desc = ComponentDesc::new(DynamicComponent::TYPE_NAME)
            .with_attribute(AttributeDesc::new("HITS", "int", "13"))
            .with_attribute(AttributeDesc::new("label", "string", "boss"));
        comp.apply_desc(&desc, ChangeMode::LocalOnly).unwrap();
        assert_eq!(comp.core().attribute_as::<i32>("hits"), Some(&13));
        assert_eq!(comp.core().attribute_as::<String>("label").map(String::as_str), Some("boss"));
        assert!(!comp.contains_attribute("target"));
    }

    #[test]
    fn test_truncated_payload_leaves_component_unchanged() {
        let src = sample();
        let mut w = WireWriter::new();
        src.serialize_to_binary(&mut w);
        let bytes = w.into_bytes();

        let mut dst = DynamicComponent::new();
        dst.add_attribute("bool", "flag", ChangeMode::LocalOnly).unwrap();
        let err = dst
            .deserialize_from_binary(&mut WireReader::new(&bytes[..bytes.len() - 1]), ChangeMode::LocalOnly)
            .unwrap_err();
        assert!(matches!(err, ComponentError::Attribute(_)));
        assert!(dst.contains_attribute("flag"));
        assert_eq!(dst.core().num_attributes(), 1);
    }

    #[test]
    fn test_contains_same_attributes_ignores_values_and_order() {
        let a = sample();
        let mut b = DynamicComponent::new();
        b.add_attribute("float3", "TARGET", ChangeMode::LocalOnly).unwrap();
        b.add_attribute("int", "hits", ChangeMode::LocalOnly).unwrap();
        assert!(a.contains_same_attributes(&b));
        b.add_attribute("int", "extra", ChangeMode::LocalOnly).unwrap();
        assert!(!a.contains_same_attributes(&b));
    }
}
