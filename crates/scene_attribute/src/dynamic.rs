//! Boxed, runtime-tagged values for the script / editor boundary.

use std::fmt;

use scene_math::{Color, IntPoint, Quat, Transform, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::AttributeError;
use crate::kind::AttributeKind;
use crate::reference::{AssetReference, AssetReferenceList, EntityReference};
use crate::text;
use crate::value::AttributeValue;

/// A value carrying its own type tag.
///
/// Every closed attribute kind has a variant, so converting an attribute to a
/// `DynamicValue` and back is lossless. `List` backs the variant-list kind and
/// `Opaque` carries values of a type this build does not know, keeping their
/// text form intact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum DynamicValue {
    #[default]
    Null,
    String(String),
    Bool(bool),
    Int(i32),
    UInt(u32),
    Real(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Color(Color),
    Quat(Quat),
    AssetReference(AssetReference),
    AssetReferenceList(AssetReferenceList),
    EntityReference(EntityReference),
    Transform(Transform),
    Point(IntPoint),
    List(Vec<DynamicValue>),
    Opaque { type_name: String, text: String },
}

impl DynamicValue {
    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Real(_) => "real",
            Self::Float2(_) => "float2",
            Self::Float3(_) => "float3",
            Self::Float4(_) => "float4",
            Self::Color(_) => "color",
            Self::Quat(_) => "quat",
            Self::AssetReference(_) => "assetreference",
            Self::AssetReferenceList(_) => "assetreferencelist",
            Self::EntityReference(_) => "entityreference",
            Self::Transform(_) => "transform",
            Self::Point(_) => "point",
            Self::List(_) => "list",
            Self::Opaque { .. } => "opaque",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The matching attribute value for variants that map one-to-one onto a
    /// scalar kind. `Null`, `List` and `Opaque` have no such mapping.
    fn closed_value(&self) -> Option<AttributeValue> {
        Some(match self {
            Self::String(v) => AttributeValue::String(v.clone()),
            Self::Bool(v) => AttributeValue::Bool(*v),
            Self::Int(v) => AttributeValue::Int(*v),
            Self::UInt(v) => AttributeValue::UInt(*v),
            Self::Real(v) => AttributeValue::Real(*v),
            Self::Float2(v) => AttributeValue::Float2(*v),
            Self::Float3(v) => AttributeValue::Float3(*v),
            Self::Float4(v) => AttributeValue::Float4(*v),
            Self::Color(v) => AttributeValue::Color(*v),
            Self::Quat(v) => AttributeValue::Quat(*v),
            Self::AssetReference(v) => AttributeValue::AssetReference(v.clone()),
            Self::AssetReferenceList(v) => AttributeValue::AssetReferenceList(v.clone()),
            Self::EntityReference(v) => AttributeValue::EntityReference(v.clone()),
            Self::Transform(v) => AttributeValue::Transform(*v),
            Self::Point(v) => AttributeValue::Point(*v),
            Self::Null | Self::List(_) | Self::Opaque { .. } => return None,
        })
    }

    /// Convert into a value of `kind`.
    ///
    /// The variant must match the kind, with a few lossless exceptions taken
    /// at the editor/script boundary: references accept plain strings, entity
    /// references accept numeric ids, asset-reference lists accept a list of
    /// strings, reals accept integers, and the variant kind accepts anything.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] if the variant cannot be
    /// stored in `kind`.
    pub fn to_attribute_value(&self, kind: AttributeKind) -> Result<AttributeValue, AttributeError> {
        let mismatch = || AttributeError::TypeMismatch {
            expected: kind.type_name(),
            found: self.type_name(),
        };

        match (kind, self) {
            (AttributeKind::Variant, v) => Ok(AttributeValue::Variant(v.clone())),
            (AttributeKind::VariantList, Self::List(items)) => {
                Ok(AttributeValue::VariantList(items.clone()))
            }
            (AttributeKind::AssetReference, Self::String(s)) => {
                Ok(AttributeValue::AssetReference(AssetReference::new(s.clone())))
            }
            (AttributeKind::AssetReferenceList, Self::List(items)) => {
                let mut refs = AssetReferenceList::new();
                for item in items {
                    match item {
                        Self::String(s) => refs.push(AssetReference::new(s.clone())),
                        Self::AssetReference(r) => refs.push(r.clone()),
                        _ => return Err(mismatch()),
                    }
                }
                Ok(AttributeValue::AssetReferenceList(refs))
            }
            (AttributeKind::EntityReference, Self::String(s)) => {
                Ok(AttributeValue::EntityReference(EntityReference::new(s.clone())))
            }
            (AttributeKind::EntityReference, Self::Int(id)) => {
                Ok(AttributeValue::EntityReference(EntityReference::new(id.to_string())))
            }
            (AttributeKind::EntityReference, Self::UInt(id)) => {
                Ok(AttributeValue::EntityReference(EntityReference::from_id(*id)))
            }
            (AttributeKind::Real, Self::Int(v)) => Ok(AttributeValue::Real(*v as f32)),
            (AttributeKind::Real, Self::UInt(v)) => Ok(AttributeValue::Real(*v as f32)),
            (kind, v) => match v.closed_value() {
                Some(value) if value.kind() == kind => Ok(value),
                _ => Err(mismatch()),
            },
        }
    }

    /// Text form, using the same grammar as the attribute text codec.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::String(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(DynamicValue::to_text)
                .collect::<Vec<_>>()
                .join(";"),
            Self::Opaque { text, .. } => text.clone(),
            other => other
                .closed_value()
                .map(|v| text::to_text(&v))
                .unwrap_or_default(),
        }
    }
}

impl From<AttributeValue> for DynamicValue {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::String(v) => Self::String(v),
            AttributeValue::Int(v) => Self::Int(v),
            AttributeValue::Real(v) => Self::Real(v),
            AttributeValue::Color(v) => Self::Color(v),
            AttributeValue::Float2(v) => Self::Float2(v),
            AttributeValue::Float3(v) => Self::Float3(v),
            AttributeValue::Float4(v) => Self::Float4(v),
            AttributeValue::Bool(v) => Self::Bool(v),
            AttributeValue::UInt(v) => Self::UInt(v),
            AttributeValue::Quat(v) => Self::Quat(v),
            AttributeValue::AssetReference(v) => Self::AssetReference(v),
            AttributeValue::AssetReferenceList(v) => Self::AssetReferenceList(v),
            AttributeValue::EntityReference(v) => Self::EntityReference(v),
            AttributeValue::Variant(v) => v,
            AttributeValue::VariantList(v) => Self::List(v),
            AttributeValue::Transform(v) => Self::Transform(v),
            AttributeValue::Point(v) => Self::Point(v),
        }
    }
}

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
