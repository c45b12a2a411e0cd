//! # scene_component
//!
//! The "C" in entity-component-attribute: a component is an ordered set of
//! [`Attribute`](scene_attribute::Attribute)s with a type name, a numeric
//! type id and an optional instance name.
//!
//! This crate provides:
//!
//! - [`ComponentCore`]: the attribute list and identity shared by every
//!   component type, and the [`Component`] trait implemented on top of it.
//! - [`ChangeHub`]: the per-component notification target that attributes
//!   reach through their weak owner handle. It fans out to local observers,
//!   tracks attributes pending replication and forwards to the scene.
//! - [`ComponentDesc`]: the descriptor / persisted form of a component.
//! - [`PlaceholderComponent`] and [`DynamicComponent`]: components whose
//!   attribute set is assembled at runtime.
//! - [`ComponentTypeRegistry`]: type name / id to factory or placeholder
//!   descriptor.

pub mod base;
pub mod component;
pub mod desc;
pub mod dynamic;
pub mod error;
pub mod hub;
pub mod placeholder;
pub mod registry;
pub mod type_id;

pub use base::{AttributeKey, ComponentCore};
pub use component::Component;
pub use desc::{AttributeDesc, ComponentDesc};
pub use dynamic::DynamicComponent;
pub use error::ComponentError;
pub use hub::{
    AttributeChanged, ChangeHub, ChangeSink, ComponentInfo, ObserverId, Observers, ReplicatedFlagPolicy,
    ReplicationPolicy,
};
pub use placeholder::PlaceholderComponent;
pub use registry::{ComponentFactory, ComponentTypeRegistry, FnFactory};
pub use type_id::{ComponentId, ComponentTypeId, EntityId};
