//! The attribute cell: a typed value plus the bookkeeping a component needs.
//!
//! An [`Attribute`] belongs to at most one component. It reaches that
//! component through a weak [`AttributeOwner`] handle installed by
//! [`Attribute::attach`]; if the handle is missing or the owner has been
//! dropped, change notification silently does nothing.

use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::dynamic::DynamicValue;
use crate::error::AttributeError;
use crate::interpolate;
use crate::kind::AttributeKind;
use crate::metadata::AttributeMetadata;
use crate::text;
use crate::value::{AttributeType, AttributeValue};
use crate::wire::{self, WireReader, WireWriter};

/// How a mutation is announced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeMode {
    /// No notification at all.
    Disconnected,
    /// Notify local observers; never propagate to the network.
    LocalOnly,
    /// Notify local observers and always mark for propagation.
    Replicate,
    /// Notify local observers; the owner's replication policy decides about
    /// propagation.
    #[default]
    Default,
}

/// Receiver of attribute change notifications, normally the component that
/// holds the attribute.
pub trait AttributeOwner {
    /// Called after `attribute` was mutated with a mode other than
    /// [`ChangeMode::Disconnected`].
    fn attribute_changed(&self, attribute: &Attribute, mode: ChangeMode);
}

/// A single named, typed field of a component.
pub struct Attribute {
    id: String,
    name: String,
    value: AttributeValue,
    owner: Option<Weak<dyn AttributeOwner>>,
    metadata: Option<Rc<AttributeMetadata>>,
    dynamic: bool,
    index: u8,
    changed: bool,
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("value", &self.value)
            .field("dynamic", &self.dynamic)
            .field("index", &self.index)
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

impl Attribute {
    /// A static attribute whose display name equals its id.
    #[must_use]
    pub fn new(id: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        let id = id.into();
        Self::with_name(id.clone(), id, value)
    }

    /// A static attribute with a separate display name.
    #[must_use]
    pub fn with_name(
        id: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value: value.into(),
            owner: None,
            metadata: None,
            dynamic: false,
            index: 0,
            changed: false,
        }
    }

    /// A dynamically created attribute holding the default value of `kind`.
    #[must_use]
    pub fn new_dynamic(kind: AttributeKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut attr = Self::with_name(id, name, AttributeValue::default_for(kind));
        attr.dynamic = true;
        attr
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Rc<AttributeMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Wire / persistence key. Never changes.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Whether `key` matches the id or the name, ignoring ASCII case.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.id.eq_ignore_ascii_case(key) || self.name.eq_ignore_ascii_case(key)
    }

    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        self.value.kind()
    }

    #[must_use]
    pub fn type_id(&self) -> u32 {
        self.kind().type_id()
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.kind().type_name()
    }

    #[must_use]
    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// Typed read; `None` if `T` is not this attribute's type.
    #[must_use]
    pub fn get<T: AttributeType>(&self) -> Option<&T> {
        self.value.get::<T>()
    }

    #[must_use]
    pub fn metadata(&self) -> Option<&AttributeMetadata> {
        self.metadata.as_deref()
    }

    pub fn set_metadata(&mut self, metadata: Option<Rc<AttributeMetadata>>) {
        self.metadata = metadata;
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Position within the owning component's attribute list.
    #[must_use]
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Whether the value changed since the last [`Attribute::clear_changed_flag`].
    #[must_use]
    pub fn value_changed(&self) -> bool {
        self.changed
    }

    pub fn clear_changed_flag(&mut self) {
        self.changed = false;
    }

    /// Typed write.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] if `T` is not this
    /// attribute's type; the value is left unchanged.
    pub fn set<T: AttributeType>(&mut self, value: T, mode: ChangeMode) -> Result<(), AttributeError> {
        self.set_value(value.into_value(), mode)
    }

    /// Replace the value with one of the same kind.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] if `value` has a different
    /// kind; the value is left unchanged.
    pub fn set_value(&mut self, value: AttributeValue, mode: ChangeMode) -> Result<(), AttributeError> {
        if value.kind() != self.kind() {
            return Err(AttributeError::TypeMismatch {
                expected: self.type_name(),
                found: value.kind().type_name(),
            });
        }
        self.value = value;
        self.changed(mode);
        Ok(())
    }

    /// Canonical text form of the value.
    #[must_use]
    pub fn to_text(&self) -> String {
        text::to_text(&self.value)
    }

    /// Parse and store a text value.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::Parse`] on a malformed literal; the value is
    /// left unchanged.
    pub fn from_text(&mut self, input: &str, mode: ChangeMode) -> Result<(), AttributeError> {
        let value = text::from_text(self.kind(), input)?;
        self.set_value(value, mode)
    }

    /// Document-decode variant of [`Attribute::from_text`]: a malformed
    /// literal is logged and replaced by the type's default value.
    pub fn from_text_or_default(&mut self, input: &str, mode: ChangeMode) {
        let value = text::from_text(self.kind(), input).unwrap_or_else(|e| {
            tracing::warn!(attribute = %self.id, error = %e, "substituting default value");
            AttributeValue::default_for(self.kind())
        });
        self.value = value;
        self.changed(mode);
    }

    /// Append the wire encoding of the value.
    pub fn to_binary(&self, writer: &mut WireWriter) {
        wire::encode(&self.value, writer);
    }

    /// Decode and store a wire value.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::BufferUnderrun`] if the reader runs out;
    /// the value is left unchanged.
    pub fn from_binary(&mut self, reader: &mut WireReader<'_>, mode: ChangeMode) -> Result<(), AttributeError> {
        let value = wire::decode(self.kind(), reader)?;
        self.set_value(value, mode)
    }

    /// The value boxed as a [`DynamicValue`].
    #[must_use]
    pub fn to_dynamic(&self) -> DynamicValue {
        DynamicValue::from(self.value.clone())
    }

    /// Store a boxed value.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] if the dynamic value cannot
    /// be stored in this attribute's kind; the value is left unchanged.
    pub fn from_dynamic(&mut self, value: &DynamicValue, mode: ChangeMode) -> Result<(), AttributeError> {
        let value = value.to_attribute_value(self.kind())?;
        self.set_value(value, mode)
    }

    /// Set the value to the interpolation of `start` and `end` at `t`.
    ///
    /// Non-interpolable kinds are a logged no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] if either endpoint is of a
    /// different kind than this attribute.
    pub fn interpolate(
        &mut self,
        start: &AttributeValue,
        end: &AttributeValue,
        t: f32,
        mode: ChangeMode,
    ) -> Result<(), AttributeError> {
        if start.kind() != self.kind() {
            return Err(AttributeError::TypeMismatch {
                expected: self.type_name(),
                found: start.kind().type_name(),
            });
        }
        match interpolate::interpolate(start, end, t)? {
            Some(value) => self.set_value(value, mode),
            None => Ok(()),
        }
    }

    /// Copy the value of `other`, which must be of the same kind.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] on differing kinds.
    pub fn copy_value(&mut self, other: &Attribute, mode: ChangeMode) -> Result<(), AttributeError> {
        self.set_value(other.value.clone(), mode)
    }

    /// An ownerless copy: same id, name, value and metadata. Mutations of the
    /// copy never notify anything.
    #[must_use]
    pub fn clone_detached(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            value: self.value.clone(),
            owner: None,
            metadata: self.metadata.clone(),
            dynamic: self.dynamic,
            index: self.index,
            changed: false,
        }
    }

    /// Mark the value changed and notify the owner unless `mode` is
    /// [`ChangeMode::Disconnected`].
    pub fn changed(&mut self, mode: ChangeMode) {
        self.changed = true;
        if mode == ChangeMode::Disconnected {
            return;
        }
        if let Some(owner) = self.owner() {
            owner.attribute_changed(self, mode);
        }
    }

    /// Bind to an owner at the given list index.
    pub fn attach(&mut self, owner: Weak<dyn AttributeOwner>, index: u8) {
        self.owner = Some(owner);
        self.index = index;
    }

    pub fn detach(&mut self) {
        self.owner = None;
    }

    /// Whether the attribute has an owner that is still alive.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.owner.as_ref().is_some_and(|w| w.strong_count() > 0)
    }

    #[must_use]
    pub fn owner(&self) -> Option<Rc<dyn AttributeOwner>> {
        self.owner.as_ref().and_then(Weak::upgrade)
    }
}
