//! # scene_attribute
//!
//! The "A" in entity-component-attribute: a single named, typed field inside
//! a component, together with everything needed to move its value around.
//!
//! This crate provides:
//!
//! - [`AttributeKind`]: the closed set of attribute value types and their
//!   stable numeric ids / type names.
//! - [`AttributeValue`]: one tagged variant per kind, and [`AttributeType`]
//!   for strongly-typed access from native code.
//! - [`text`] and [`wire`]: the human-readable and the bit-exact binary
//!   codecs.
//! - [`DynamicValue`]: the boxed, runtime-tagged value used at the
//!   script/editor boundary.
//! - [`Attribute`]: the value cell owned by a component, with
//!   [`ChangeMode`]-driven notification of its owner through a weak
//!   back-reference.

pub mod attribute;
pub mod dynamic;
pub mod error;
pub mod interpolate;
pub mod kind;
pub mod metadata;
pub mod reference;
pub mod text;
pub mod value;
pub mod wire;

pub use attribute::{Attribute, AttributeOwner, ChangeMode};
pub use dynamic::DynamicValue;
pub use error::AttributeError;
pub use kind::AttributeKind;
pub use metadata::AttributeMetadata;
pub use reference::{AssetReference, AssetReferenceList, EntityReference};
pub use value::{AttributeType, AttributeValue};
pub use wire::{WireReader, WireWriter};

pub use scene_math::{Color, IntPoint, Quat, Transform, Vec2, Vec3, Vec4};
