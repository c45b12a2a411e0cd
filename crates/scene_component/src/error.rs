//! Component-level error types.

use scene_attribute::AttributeError;

use crate::type_id::ComponentTypeId;

/// Errors produced by components and the component type registry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComponentError {
    /// A type name or id is already registered by a different factory or
    /// descriptor. The existing registration is kept.
    #[error("component type {type_name:?} (id {type_id}) conflicts with an existing registration")]
    RegistryConflict {
        type_name: String,
        type_id: ComponentTypeId,
    },

    /// No factory or placeholder descriptor has this type name.
    #[error("unknown component type {0:?}")]
    UnknownTypeName(String),

    /// No factory or placeholder descriptor has this type id.
    #[error("unknown component type id {0}")]
    UnknownTypeId(ComponentTypeId),

    /// The component already has an attribute with this id or name.
    #[error("duplicate attribute {0:?}")]
    DuplicateAttribute(String),

    /// Static attributes can be neither removed nor replaced.
    #[error("attribute at index {0} is static")]
    StaticAttribute(u8),

    /// No attribute matches the given key.
    #[error("no attribute {0:?}")]
    NoSuchAttribute(String),

    /// The attribute list is full: indices are a single byte.
    #[error("component already holds the maximum number of attributes")]
    TooManyAttributes,

    /// A binary payload declares a different attribute count than the
    /// component holds.
    #[error("attribute count mismatch: expected {expected}, found {found}")]
    AttributeCountMismatch { expected: usize, found: usize },

    /// The component type does not allow creating or removing attributes.
    #[error("component type {0:?} does not support dynamic attributes")]
    DynamicAttributesUnsupported(String),

    /// The replicated flag cannot change once the component has an id.
    #[error("replication mode of component {0} is locked after id assignment")]
    ReplicationLocked(u32),

    /// A descriptor for another component type was applied.
    #[error("descriptor of type {found:?} applied to component of type {expected:?}")]
    DescriptorTypeMismatch { expected: String, found: String },

    /// An attribute-level conversion failed.
    #[error(transparent)]
    Attribute(#[from] AttributeError),
}
