//! Tagged attribute values.
//!
//! [`AttributeValue`] has exactly one variant per [`AttributeKind`], so every
//! per-type operation (codecs, interpolation, dynamic conversion) is a single
//! exhaustive `match`. Native code reaches the payload through
//! [`AttributeType`], which performs the discriminant check instead of a cast.

use scene_math::{Color, IntPoint, Quat, Transform, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::dynamic::DynamicValue;
use crate::kind::AttributeKind;
use crate::reference::{AssetReference, AssetReferenceList, EntityReference};

/// A value of one of the closed attribute kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    String(String),
    Int(i32),
    Real(f32),
    Color(Color),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Bool(bool),
    UInt(u32),
    Quat(Quat),
    AssetReference(AssetReference),
    AssetReferenceList(AssetReferenceList),
    EntityReference(EntityReference),
    Variant(DynamicValue),
    VariantList(Vec<DynamicValue>),
    Transform(Transform),
    Point(IntPoint),
}

impl AttributeValue {
    /// The documented default value of a kind: zero / empty for scalars,
    /// strings and lists, identity for quaternions and transforms, opaque
    /// black for colours.
    #[must_use]
    pub fn default_for(kind: AttributeKind) -> Self {
        match kind {
            AttributeKind::String => Self::String(String::new()),
            AttributeKind::Int => Self::Int(0),
            AttributeKind::Real => Self::Real(0.0),
            AttributeKind::Color => Self::Color(Color::default()),
            AttributeKind::Float2 => Self::Float2(Vec2::ZERO),
            AttributeKind::Float3 => Self::Float3(Vec3::ZERO),
            AttributeKind::Float4 => Self::Float4(Vec4::ZERO),
            AttributeKind::Bool => Self::Bool(false),
            AttributeKind::UInt => Self::UInt(0),
            AttributeKind::Quat => Self::Quat(Quat::IDENTITY),
            AttributeKind::AssetReference => Self::AssetReference(AssetReference::default()),
            AttributeKind::AssetReferenceList => {
                Self::AssetReferenceList(AssetReferenceList::default())
            }
            AttributeKind::EntityReference => Self::EntityReference(EntityReference::default()),
            AttributeKind::Variant => Self::Variant(DynamicValue::Null),
            AttributeKind::VariantList => Self::VariantList(Vec::new()),
            AttributeKind::Transform => Self::Transform(Transform::IDENTITY),
            AttributeKind::Point => Self::Point(IntPoint::default()),
        }
    }

    /// The kind tag of this value.
    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::String(_) => AttributeKind::String,
            Self::Int(_) => AttributeKind::Int,
            Self::Real(_) => AttributeKind::Real,
            Self::Color(_) => AttributeKind::Color,
            Self::Float2(_) => AttributeKind::Float2,
            Self::Float3(_) => AttributeKind::Float3,
            Self::Float4(_) => AttributeKind::Float4,
            Self::Bool(_) => AttributeKind::Bool,
            Self::UInt(_) => AttributeKind::UInt,
            Self::Quat(_) => AttributeKind::Quat,
            Self::AssetReference(_) => AttributeKind::AssetReference,
            Self::AssetReferenceList(_) => AttributeKind::AssetReferenceList,
            Self::EntityReference(_) => AttributeKind::EntityReference,
            Self::Variant(_) => AttributeKind::Variant,
            Self::VariantList(_) => AttributeKind::VariantList,
            Self::Transform(_) => AttributeKind::Transform,
            Self::Point(_) => AttributeKind::Point,
        }
    }

    /// Type-checked view of the payload.
    #[must_use]
    pub fn get<T: AttributeType>(&self) -> Option<&T> {
        T::from_value(self)
    }
}

/// A Rust type stored by exactly one [`AttributeKind`].
pub trait AttributeType: Clone + PartialEq + 'static {
    /// The kind that stores this type.
    const KIND: AttributeKind;

    /// Wrap a value in its variant.
    fn into_value(self) -> AttributeValue;

    /// Borrow the payload if `value` is of this type's kind.
    fn from_value(value: &AttributeValue) -> Option<&Self>;
}

macro_rules! attribute_type {
    ($ty:ty, $variant:ident) => {
        impl AttributeType for $ty {
            const KIND: AttributeKind = AttributeKind::$variant;

            fn into_value(self) -> AttributeValue {
                AttributeValue::$variant(self)
            }

            fn from_value(value: &AttributeValue) -> Option<&Self> {
                match value {
                    AttributeValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl From<$ty> for AttributeValue {
            fn from(v: $ty) -> Self {
                AttributeValue::$variant(v)
            }
        }
    };
}

attribute_type!(String, String);
attribute_type!(i32, Int);
attribute_type!(f32, Real);
attribute_type!(Color, Color);
attribute_type!(Vec2, Float2);
attribute_type!(Vec3, Float3);
attribute_type!(Vec4, Float4);
attribute_type!(bool, Bool);
attribute_type!(u32, UInt);
attribute_type!(Quat, Quat);
attribute_type!(AssetReference, AssetReference);
attribute_type!(AssetReferenceList, AssetReferenceList);
attribute_type!(EntityReference, EntityReference);
attribute_type!(DynamicValue, Variant);
attribute_type!(Vec<DynamicValue>, VariantList);
attribute_type!(Transform, Transform);
attribute_type!(IntPoint, Point);
