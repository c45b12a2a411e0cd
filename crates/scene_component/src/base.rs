//! State shared by every component type.

use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use scene_attribute::{Attribute, AttributeType, ChangeMode, WireReader, WireWriter};

use crate::desc::{AttributeDesc, ComponentDesc};
use crate::error::ComponentError;
use crate::hub::{AttributeChanged, ChangeHub, ComponentInfo, ObserverId};
use crate::type_id::{ComponentId, ComponentTypeId, EntityId};

/// Typed handle to a static attribute slot.
///
/// Compiled components declare one constant per attribute so native code
/// reads and writes fields without name lookups or type checks at the call
/// site:
///
/// ```
/// # use scene_component::AttributeKey;
/// const COUNT: AttributeKey<i32> = AttributeKey::new(0);
/// ```
pub struct AttributeKey<T> {
    index: u8,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AttributeKey<T> {
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self.index
    }
}

impl<T> Clone for AttributeKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AttributeKey<T> {}

impl<T> fmt::Debug for AttributeKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeKey({})", self.index)
    }
}

/// The attribute list and identity of a component.
///
/// The list may contain holes left by removed dynamic attributes. Static
/// attributes occupy the leading indices and are never removed or replaced.
#[derive(Debug)]
pub struct ComponentCore {
    info: ComponentInfo,
    attributes: Vec<Option<Attribute>>,
    hub: Rc<ChangeHub>,
}

impl ComponentCore {
    #[must_use]
    pub fn new(type_name: impl Into<String>, type_id: ComponentTypeId) -> Self {
        let info = ComponentInfo::new(type_name, type_id);
        let hub = Rc::new(ChangeHub::new(info.clone()));
        Self {
            info,
            attributes: Vec::new(),
            hub,
        }
    }

    fn sync_hub(&self) {
        self.hub.set_info(self.info.clone());
    }

    fn owner_handle(&self) -> Weak<ChangeHub> {
        Rc::downgrade(&self.hub)
    }

    // --- identity --------------------------------------------------------

    #[must_use]
    pub fn info(&self) -> &ComponentInfo {
        &self.info
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.info.type_name
    }

    #[must_use]
    pub fn type_id(&self) -> ComponentTypeId {
        self.info.type_id
    }

    /// Id within the owning entity, `0` if not yet added to one.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.info.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Rename the instance. Emits a rename event to the scene if the name
    /// actually changes.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name == self.info.name {
            return;
        }
        let old = std::mem::replace(&mut self.info.name, name);
        self.sync_hub();
        self.hub.renamed(&old);
    }

    #[must_use]
    pub fn entity(&self) -> Option<EntityId> {
        self.info.entity
    }

    #[must_use]
    pub fn is_replicated(&self) -> bool {
        self.info.replicated
    }

    /// # Errors
    ///
    /// Returns [`ComponentError::ReplicationLocked`] once the component has
    /// been given an id by its entity.
    pub fn set_replicated(&mut self, replicated: bool) -> Result<(), ComponentError> {
        if self.info.id != 0 {
            tracing::error!(
                component = %self.info.type_name,
                id = self.info.id,
                "replication mode cannot change after an id has been assigned"
            );
            return Err(ComponentError::ReplicationLocked(self.info.id));
        }
        self.info.replicated = replicated;
        self.sync_hub();
        Ok(())
    }

    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.info.temporary
    }

    /// Temporary components are skipped when saving unless asked for.
    pub fn set_temporary(&mut self, temporary: bool) {
        self.info.temporary = temporary;
        self.sync_hub();
    }

    /// Called by the owning entity when the component is added or removed.
    pub fn set_parent(&mut self, id: ComponentId, entity: Option<EntityId>) {
        self.info.id = id;
        self.info.entity = entity;
        self.sync_hub();
    }

    /// Force the replicated flag without the id lock. Used by the entity when
    /// adopting a component under an explicit id.
    pub fn force_replicated(&mut self, replicated: bool) {
        self.info.replicated = replicated;
        self.sync_hub();
    }

    // --- notification ----------------------------------------------------

    #[must_use]
    pub fn hub(&self) -> &Rc<ChangeHub> {
        &self.hub
    }

    /// Register a local observer on this component's attribute changes.
    pub fn subscribe(&self, observer: impl FnMut(&AttributeChanged) + 'static) -> ObserverId {
        self.hub.subscribe(observer)
    }

    /// Notify every attribute as changed.
    pub fn component_changed(&self, mode: ChangeMode) {
        if mode == ChangeMode::Disconnected {
            return;
        }
        for attr in self.attributes() {
            scene_attribute::AttributeOwner::attribute_changed(&*self.hub, attr, mode);
        }
    }

    /// Indices marked for replication since the last call.
    pub fn take_pending_replication(&self) -> Vec<u8> {
        self.hub.take_pending()
    }

    /// Attributes changed since the last [`ComponentCore::clear_changed_flags`].
    pub fn changed_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes().filter(|a| a.value_changed())
    }

    pub fn clear_changed_flags(&mut self) {
        for attr in self.attributes.iter_mut().flatten() {
            attr.clear_changed_flag();
        }
    }

    // --- attribute list --------------------------------------------------

    /// Append a static attribute. Intended for component constructors.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::DuplicateAttribute`] if the id or name is
    /// already used, or [`ComponentError::TooManyAttributes`].
    pub fn add_static(&mut self, attribute: Attribute) -> Result<u8, ComponentError> {
        self.check_unique(&attribute)?;
        let index = self.next_index(self.attributes.len())?;
        self.place(index, attribute);
        Ok(index)
    }

    /// Builder form of [`ComponentCore::add_static`] for constructors whose
    /// attribute set is fixed.
    ///
    /// # Errors
    ///
    /// As [`ComponentCore::add_static`].
    pub fn with_static(mut self, attribute: Attribute) -> Result<Self, ComponentError> {
        self.add_static(attribute)?;
        Ok(self)
    }

    /// Insert a dynamic attribute into the first hole, or append.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::DuplicateAttribute`] if the id or name is
    /// already used, or [`ComponentError::TooManyAttributes`].
    pub fn insert_dynamic(&mut self, attribute: Attribute, mode: ChangeMode) -> Result<u8, ComponentError> {
        self.check_unique(&attribute)?;
        let hole = self.attributes.iter().position(Option::is_none);
        let index = self.next_index(hole.unwrap_or(self.attributes.len()))?;
        self.place(index, attribute);
        self.announce_added(index, mode);
        Ok(index)
    }

    /// Place a dynamic attribute at a fixed index, replacing any dynamic
    /// attribute already there. Used when mirroring a remote component.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::StaticAttribute`] if the slot holds a static
    /// attribute, or [`ComponentError::DuplicateAttribute`] if another slot
    /// already uses the id or name.
    pub fn insert_dynamic_at(
        &mut self,
        index: u8,
        attribute: Attribute,
        mode: ChangeMode,
    ) -> Result<(), ComponentError> {
        let slot = usize::from(index);
        self.next_index(slot)?;
        let replacing = match self.attributes.get(slot) {
            Some(Some(existing)) if !existing.is_dynamic() => {
                tracing::error!(index, "cannot overwrite static attribute");
                return Err(ComponentError::StaticAttribute(index));
            }
            Some(Some(_)) => true,
            _ => false,
        };
        self.check_unique_except(&attribute, Some(index))?;
        if replacing {
            tracing::warn!(index, "replacing existing attribute");
            self.remove_at(index, ChangeMode::LocalOnly)?;
        }
        self.place(index, attribute);
        self.announce_added(index, mode);
        Ok(())
    }

    /// Remove the dynamic attribute at `index`, leaving a hole.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::StaticAttribute`] for static slots and
    /// [`ComponentError::NoSuchAttribute`] for holes.
    pub fn remove_at(&mut self, index: u8, mode: ChangeMode) -> Result<Attribute, ComponentError> {
        let slot = usize::from(index);
        match self.attributes.get(slot) {
            Some(Some(attr)) if !attr.is_dynamic() => {
                tracing::error!(index, "cannot remove static attribute");
                return Err(ComponentError::StaticAttribute(index));
            }
            Some(Some(_)) => {}
            _ => {
                tracing::error!(index, "cannot remove nonexisting attribute");
                return Err(ComponentError::NoSuchAttribute(format!("#{index}")));
            }
        }
        let Some(mut attr) = self.attributes[slot].take() else {
            return Err(ComponentError::NoSuchAttribute(format!("#{index}")));
        };
        self.hub.attribute_removed(&attr, mode);
        attr.detach();
        while matches!(self.attributes.last(), Some(None)) {
            self.attributes.pop();
        }
        Ok(attr)
    }

    fn check_unique(&self, attribute: &Attribute) -> Result<(), ComponentError> {
        self.check_unique_except(attribute, None)
    }

    /// As [`ComponentCore::check_unique`], ignoring the slot about to be
    /// replaced.
    fn check_unique_except(&self, attribute: &Attribute, skip: Option<u8>) -> Result<(), ComponentError> {
        let clash = self
            .attributes()
            .filter(|a| Some(a.index()) != skip)
            .any(|a| a.matches(attribute.id()) || a.matches(attribute.name()));
        if clash {
            return Err(ComponentError::DuplicateAttribute(attribute.id().to_string()));
        }
        Ok(())
    }

    /// Slots stop at 254 so the attribute count always fits its one-byte
    /// wire prefix.
    fn next_index(&self, slot: usize) -> Result<u8, ComponentError> {
        match u8::try_from(slot) {
            Ok(index) if index < u8::MAX => Ok(index),
            _ => Err(ComponentError::TooManyAttributes),
        }
    }

    fn place(&mut self, index: u8, mut attribute: Attribute) {
        let slot = usize::from(index);
        if self.attributes.len() <= slot {
            self.attributes.resize_with(slot + 1, || None);
        }
        attribute.attach(self.owner_handle(), index);
        self.attributes[slot] = Some(attribute);
    }

    fn announce_added(&self, index: u8, mode: ChangeMode) {
        if let Some(Some(attr)) = self.attributes.get(usize::from(index)) {
            self.hub.attribute_added(attr, mode);
            scene_attribute::AttributeOwner::attribute_changed(&*self.hub, attr, mode);
        }
    }

    /// Non-empty attributes in index order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().flatten()
    }

    pub fn attributes_mut(&mut self) -> impl Iterator<Item = &mut Attribute> {
        self.attributes.iter_mut().flatten()
    }

    /// The raw slot list, holes included.
    #[must_use]
    pub fn slots(&self) -> &[Option<Attribute>] {
        &self.attributes
    }

    /// Number of non-empty attributes.
    #[must_use]
    pub fn num_attributes(&self) -> usize {
        self.attributes().count()
    }

    /// Number of leading static attributes.
    #[must_use]
    pub fn num_static_attributes(&self) -> usize {
        self.attributes
            .iter()
            .take_while(|slot| slot.as_ref().is_some_and(|a| !a.is_dynamic()))
            .count()
    }

    /// Display names of the non-empty attributes.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes().map(|a| a.name().to_string()).collect()
    }

    /// Ids of the non-empty attributes.
    #[must_use]
    pub fn attribute_ids(&self) -> Vec<String> {
        self.attributes().map(|a| a.id().to_string()).collect()
    }

    #[must_use]
    pub fn attribute_at(&self, index: u8) -> Option<&Attribute> {
        self.attributes.get(usize::from(index))?.as_ref()
    }

    pub fn attribute_at_mut(&mut self, index: u8) -> Option<&mut Attribute> {
        self.attributes.get_mut(usize::from(index))?.as_mut()
    }

    #[must_use]
    pub fn attribute_by_id(&self, id: &str) -> Option<&Attribute> {
        self.attributes().find(|a| a.id().eq_ignore_ascii_case(id))
    }

    #[must_use]
    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.attributes().find(|a| a.name().eq_ignore_ascii_case(name))
    }

    /// Look up by id, then by display name, ignoring ASCII case.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.attribute_by_id(key).or_else(|| self.attribute_by_name(key))
    }

    pub fn attribute_mut(&mut self, key: &str) -> Option<&mut Attribute> {
        let index = self.attribute(key)?.index();
        self.attribute_at_mut(index)
    }

    /// Type-checked view: `None` if there is no such attribute or it does not
    /// store a `T`.
    #[must_use]
    pub fn attribute_as<T: AttributeType>(&self, key: &str) -> Option<&T> {
        self.attribute(key)?.get::<T>()
    }

    /// Typed read through a static key.
    #[must_use]
    pub fn get<T: AttributeType>(&self, key: AttributeKey<T>) -> Option<&T> {
        self.attribute_at(key.index)?.get::<T>()
    }

    /// Typed write through a static key.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::NoSuchAttribute`] if the slot is empty, or
    /// a type mismatch if the key does not match the slot's type.
    pub fn set<T: AttributeType>(
        &mut self,
        key: AttributeKey<T>,
        value: T,
        mode: ChangeMode,
    ) -> Result<(), ComponentError> {
        let attr = self
            .attribute_at_mut(key.index)
            .ok_or_else(|| ComponentError::NoSuchAttribute(format!("#{}", key.index)))?;
        attr.set(value, mode)?;
        Ok(())
    }

    /// Typed write by id or name.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::NoSuchAttribute`] or a type mismatch; the
    /// value is left unchanged on error.
    pub fn set_attribute<T: AttributeType>(
        &mut self,
        key: &str,
        value: T,
        mode: ChangeMode,
    ) -> Result<(), ComponentError> {
        let attr = self
            .attribute_mut(key)
            .ok_or_else(|| ComponentError::NoSuchAttribute(key.to_string()))?;
        attr.set(value, mode)?;
        Ok(())
    }

    // --- serialization ---------------------------------------------------

    /// Attribute count as one byte, then each attribute's wire encoding in
    /// index order.
    pub fn serialize_to_binary(&self, writer: &mut WireWriter) {
        let count = writer.write_count(self.num_attributes());
        for attr in self.attributes().take(count) {
            attr.to_binary(writer);
        }
    }

    /// Inverse of [`ComponentCore::serialize_to_binary`].
    ///
    /// All values are decoded before any is applied, so a short buffer leaves
    /// the component untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::AttributeCountMismatch`] if the payload was
    /// written for a different attribute set, or a buffer underrun.
    pub fn deserialize_from_binary(
        &mut self,
        reader: &mut WireReader<'_>,
        mode: ChangeMode,
    ) -> Result<(), ComponentError> {
        let found = usize::from(reader.read_u8()?);
        let expected = self.num_attributes();
        if found != expected {
            tracing::error!(
                component = %self.info.type_name,
                expected,
                found,
                "wrong number of attributes in binary payload"
            );
            return Err(ComponentError::AttributeCountMismatch { expected, found });
        }
        let values = self
            .attributes()
            .map(|a| scene_attribute::wire::decode(a.kind(), reader))
            .collect::<Result<Vec<_>, _>>()?;
        for (attr, value) in self.attributes_mut().zip(values) {
            attr.set_value(value, mode)?;
        }
        Ok(())
    }

    /// The persisted form of this component.
    #[must_use]
    pub fn to_desc(&self) -> ComponentDesc {
        ComponentDesc {
            type_name: self.info.type_name.clone(),
            type_id: self.info.type_id,
            name: self.info.name.clone(),
            sync: self.info.replicated,
            temporary: self.info.temporary,
            attributes: self
                .attributes()
                .map(|a| AttributeDesc {
                    id: a.id().to_string(),
                    name: a.name().to_string(),
                    type_name: a.type_name().to_string(),
                    value: a.to_text(),
                })
                .collect(),
        }
    }

    /// Apply a persisted form: the instance name and the values of the
    /// attributes present in `desc`, matched by id or name. Attributes not in
    /// `desc` keep their current value. Malformed values fall back to the
    /// type default with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::DescriptorTypeMismatch`] if `desc` is for a
    /// different component type.
    pub fn apply_desc(&mut self, desc: &ComponentDesc, mode: ChangeMode) -> Result<(), ComponentError> {
        if !desc.matches_type(&self.info.type_name, self.info.type_id) {
            return Err(ComponentError::DescriptorTypeMismatch {
                expected: self.info.type_name.clone(),
                found: desc.type_name.clone(),
            });
        }
        self.set_name(desc.name.clone());
        for attr_desc in &desc.attributes {
            let target = self
                .attribute_by_id(&attr_desc.id)
                .or_else(|| self.attribute_by_name(attr_desc.display_name()))
                .map(Attribute::index);
            let Some(index) = target else {
                tracing::debug!(
                    component = %self.info.type_name,
                    attribute = %attr_desc.id,
                    "ignoring unknown attribute in descriptor"
                );
                continue;
            };
            if let Some(attr) = self.attribute_at_mut(index) {
                attr.from_text_or_default(&attr_desc.value, mode);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use scene_attribute::{AttributeKind, AttributeValue, Vec3};

    use super::*;

    const COUNT: AttributeKey<i32> = AttributeKey::new(0);
    const OFFSET: AttributeKey<Vec3> = AttributeKey::new(1);

    fn counter() -> ComponentCore {
        let mut core = ComponentCore::new("Counter", ComponentTypeId(100));
        core.add_static(Attribute::new("Count", 0i32)).unwrap();
        core.add_static(Attribute::new("Offset", Vec3::ZERO)).unwrap();
        core
    }

    #[test]
    fn test_count_scenario() {
        let mut core = counter();
        core.set_attribute("Count", 5i32, ChangeMode::Default).unwrap();
        let mut w = WireWriter::new();
        core.attribute("Count").unwrap().to_binary(&mut w);
        assert_eq!(w.as_bytes(), &[0x05, 0x00, 0x00, 0x00]);
        assert_eq!(core.attribute("Count").unwrap().to_text(), "5");

        core.attribute_mut("Count")
            .unwrap()
            .from_text("7", ChangeMode::Default)
            .unwrap();
        let mut w = WireWriter::new();
        core.attribute("Count").unwrap().to_binary(&mut w);
        assert_eq!(w.into_bytes(), vec![0x07, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_typed_keys() {
        let mut core = counter();
        core.set(OFFSET, Vec3::new(1.0, 2.0, 3.0), ChangeMode::LocalOnly)
            .unwrap();
        assert_eq!(core.get(OFFSET), Some(&Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(core.get(COUNT), Some(&0));
        let wrong: AttributeKey<f32> = AttributeKey::new(0);
        assert_eq!(core.get(wrong), None);
        assert!(core.set(wrong, 1.0, ChangeMode::LocalOnly).is_err());
    }

    #[test]
    fn test_attribute_as_checks_type() {
        let core = counter();
        assert_eq!(core.attribute_as::<i32>("count"), Some(&0));
        assert_eq!(core.attribute_as::<f32>("Count"), None);
        assert_eq!(core.attribute_as::<i32>("Missing"), None);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut core = counter();
        assert_eq!(
            core.add_static(Attribute::new("COUNT", 1i32)),
            Err(ComponentError::DuplicateAttribute("COUNT".into()))
        );
    }

    #[test]
    fn test_holes_and_static_protection() {
        let mut core = counter();
        let a = core
            .insert_dynamic(Attribute::new_dynamic(AttributeKind::Real, "a", "a"), ChangeMode::LocalOnly)
            .unwrap();
        let b = core
            .insert_dynamic(Attribute::new_dynamic(AttributeKind::Real, "b", "b"), ChangeMode::LocalOnly)
            .unwrap();
        assert_eq!((a, b), (2, 3));
        assert_eq!(core.num_static_attributes(), 2);

        core.remove_at(a, ChangeMode::LocalOnly).unwrap();
        assert_eq!(core.num_attributes(), 3);
        assert_eq!(core.slots().len(), 4);
        assert!(core.attribute_at(2).is_none());

        let c = core
            .insert_dynamic(Attribute::new_dynamic(AttributeKind::Bool, "c", "c"), ChangeMode::LocalOnly)
            .unwrap();
        assert_eq!(c, 2);

        assert_eq!(core.remove_at(0, ChangeMode::LocalOnly).unwrap_err(), ComponentError::StaticAttribute(0));
        assert!(matches!(
            core.insert_dynamic_at(1, Attribute::new_dynamic(AttributeKind::Int, "x", "x"), ChangeMode::LocalOnly),
            Err(ComponentError::StaticAttribute(1))
        ));
        assert!(matches!(
            core.remove_at(9, ChangeMode::LocalOnly),
            Err(ComponentError::NoSuchAttribute(_))
        ));
    }

    #[test]
    fn test_insert_at_pads_with_holes() {
        let mut core = ComponentCore::new("Remote", ComponentTypeId(7));
        core.insert_dynamic_at(3, Attribute::new_dynamic(AttributeKind::Int, "n", "n"), ChangeMode::LocalOnly)
            .unwrap();
        assert_eq!(core.slots().len(), 4);
        assert_eq!(core.num_attributes(), 1);
        assert_eq!(core.attribute("n").unwrap().index(), 3);
    }

    #[test]
    fn test_insert_at_clash_keeps_existing_attribute() {
        let mut core = ComponentCore::new("Remote", ComponentTypeId(7));
        core.insert_dynamic_at(0, Attribute::new_dynamic(AttributeKind::Int, "a", "a"), ChangeMode::LocalOnly)
            .unwrap();
        core.insert_dynamic_at(1, Attribute::new_dynamic(AttributeKind::Int, "b", "b"), ChangeMode::LocalOnly)
            .unwrap();

        let clash = core.insert_dynamic_at(1, Attribute::new_dynamic(AttributeKind::Int, "a", "a"), ChangeMode::LocalOnly);
        assert!(matches!(clash, Err(ComponentError::DuplicateAttribute(_))));
        assert_eq!(core.attribute("b").unwrap().index(), 1);
        assert_eq!(core.num_attributes(), 2);

        // Reusing the replaced slot's own id is fine.
        core.insert_dynamic_at(1, Attribute::new_dynamic(AttributeKind::Real, "b", "b"), ChangeMode::LocalOnly)
            .unwrap();
        assert_eq!(core.attribute("b").unwrap().kind(), AttributeKind::Real);
    }

    #[test]
    fn test_attribute_count_fits_wire_prefix() {
        let mut core = ComponentCore::new("Wide", ComponentTypeId(8));
        for i in 0..255 {
            core.insert_dynamic(Attribute::new_dynamic(AttributeKind::Bool, format!("f{i}"), format!("f{i}")), ChangeMode::Disconnected)
                .unwrap();
        }
        let extra = core.insert_dynamic(Attribute::new_dynamic(AttributeKind::Bool, "over", "over"), ChangeMode::Disconnected);
        assert!(matches!(extra, Err(ComponentError::TooManyAttributes)));
        let at_end = core.insert_dynamic_at(255, Attribute::new_dynamic(AttributeKind::Bool, "over", "over"), ChangeMode::Disconnected);
        assert!(matches!(at_end, Err(ComponentError::TooManyAttributes)));

        let mut writer = WireWriter::new();
        core.serialize_to_binary(&mut writer);
        let mut copy = ComponentCore::new("Wide", ComponentTypeId(8));
        for attr in core.attributes() {
            copy.insert_dynamic(attr.clone_detached(), ChangeMode::Disconnected).unwrap();
        }
        let bytes = writer.into_bytes();
        copy.deserialize_from_binary(&mut WireReader::new(&bytes), ChangeMode::Disconnected)
            .unwrap();
        assert_eq!(copy.num_attributes(), 255);
    }

    #[test]
    fn test_binary_roundtrip_and_count_mismatch() {
        let mut src = counter();
        src.set(COUNT, 9, ChangeMode::LocalOnly).unwrap();
        src.set(OFFSET, Vec3::new(0.5, 0.0, -1.0), ChangeMode::LocalOnly)
            .unwrap();
        let mut w = WireWriter::new();
        src.serialize_to_binary(&mut w);
        assert_eq!(w.len(), 1 + 4 + 12);

        let mut dst = counter();
        dst.deserialize_from_binary(&mut WireReader::new(w.as_bytes()), ChangeMode::LocalOnly)
            .unwrap();
        assert_eq!(dst.get(COUNT), Some(&9));
        assert_eq!(dst.get(OFFSET), Some(&Vec3::new(0.5, 0.0, -1.0)));

        let mut other = ComponentCore::new("Counter", ComponentTypeId(100));
        other.add_static(Attribute::new("Count", 0i32)).unwrap();
        assert_eq!(
            other.deserialize_from_binary(&mut WireReader::new(w.as_bytes()), ChangeMode::LocalOnly),
            Err(ComponentError::AttributeCountMismatch { expected: 1, found: 2 })
        );
    }

    #[test]
    fn test_short_buffer_leaves_component_unchanged() {
        let mut src = counter();
        src.set(COUNT, 9, ChangeMode::LocalOnly).unwrap();
        let mut w = WireWriter::new();
        src.serialize_to_binary(&mut w);
        let truncated = &w.as_bytes()[..8];

        let mut dst = counter();
        let err = dst
            .deserialize_from_binary(&mut WireReader::new(truncated), ChangeMode::LocalOnly)
            .unwrap_err();
        assert!(matches!(err, ComponentError::Attribute(_)));
        assert_eq!(dst.get(COUNT), Some(&0));
    }

    #[test]
    fn test_desc_roundtrip_and_partial_apply() {
        let mut src = counter();
        src.set_name("main");
        src.set(COUNT, 3, ChangeMode::LocalOnly).unwrap();
        let desc = src.to_desc();
        assert_eq!(desc.attributes[0].value, "3");
        assert_eq!(desc.attributes[1].type_name, "float3");

        let mut dst = counter();
        dst.set(OFFSET, Vec3::ONE, ChangeMode::LocalOnly).unwrap();
        let mut partial = desc.clone();
        partial.attributes.retain(|a| a.id == "Count");
        partial.attributes[0].id = "count".into();
        dst.apply_desc(&partial, ChangeMode::LocalOnly).unwrap();
        assert_eq!(dst.name(), "main");
        assert_eq!(dst.get(COUNT), Some(&3));
        assert_eq!(dst.get(OFFSET), Some(&Vec3::ONE));
    }

    #[test]
    fn test_apply_desc_substitutes_default_for_malformed() {
        let mut dst = counter();
        dst.set(COUNT, 4, ChangeMode::LocalOnly).unwrap();
        let mut desc = dst.to_desc();
        desc.attributes[0].value = "not a number".into();
        dst.apply_desc(&desc, ChangeMode::LocalOnly).unwrap();
        assert_eq!(dst.get(COUNT), Some(&0));
    }

    #[test]
    fn test_apply_desc_wrong_type() {
        let mut dst = counter();
        let desc = ComponentDesc::new("Other");
        assert!(matches!(
            dst.apply_desc(&desc, ChangeMode::LocalOnly),
            Err(ComponentError::DescriptorTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_replication_locked_after_id() {
        let mut core = counter();
        core.set_replicated(false).unwrap();
        core.set_parent(5, Some(1));
        assert_eq!(core.set_replicated(true), Err(ComponentError::ReplicationLocked(5)));
        assert!(!core.is_replicated());
    }

    #[test]
    fn test_changed_flags_and_component_changed() {
        let mut core = counter();
        core.set(COUNT, 1, ChangeMode::Disconnected).unwrap();
        let changed: Vec<_> = core.changed_attributes().map(|a| a.id().to_string()).collect();
        assert_eq!(changed, vec!["Count".to_string()]);
        core.clear_changed_flags();
        assert_eq!(core.changed_attributes().count(), 0);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        core.subscribe(move |e| log.borrow_mut().push(e.value.clone()));
        core.component_changed(ChangeMode::Replicate);
        assert_eq!(
            *seen.borrow(),
            vec![AttributeValue::Int(1), AttributeValue::Float3(Vec3::ZERO)]
        );
        assert_eq!(core.take_pending_replication(), vec![0, 1]);
    }

    #[test]
    fn test_dropping_component_invalidates_back_references() {
        let core = counter();
        let detached = core.attribute("Count").unwrap().clone_detached();
        let hub = Rc::downgrade(core.hub());
        drop(core);
        assert!(hub.upgrade().is_none());
        assert!(!detached.is_attached());
    }
}
