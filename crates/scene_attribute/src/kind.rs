//! The closed set of attribute value types.
//!
//! Attribute kinds are fixed at compile time; unlike component types they are
//! never user-extensible. Each kind has a stable numeric id (used on the wire
//! and in component descriptors) and a stable lower-case type name (used in
//! persisted documents).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AttributeError;

/// One of the supported attribute value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeKind {
    String,
    Int,
    Real,
    Color,
    Float2,
    Float3,
    Float4,
    Bool,
    UInt,
    Quat,
    AssetReference,
    AssetReferenceList,
    EntityReference,
    Variant,
    VariantList,
    Transform,
    Point,
}

impl AttributeKind {
    /// Every kind, ordered by type id.
    pub const ALL: [AttributeKind; 17] = [
        Self::String,
        Self::Int,
        Self::Real,
        Self::Color,
        Self::Float2,
        Self::Float3,
        Self::Float4,
        Self::Bool,
        Self::UInt,
        Self::Quat,
        Self::AssetReference,
        Self::AssetReferenceList,
        Self::EntityReference,
        Self::Variant,
        Self::VariantList,
        Self::Transform,
        Self::Point,
    ];

    /// Type id `0` is reserved for "no type".
    pub const NONE_ID: u32 = 0;

    /// The stable numeric type id.
    #[must_use]
    pub const fn type_id(self) -> u32 {
        match self {
            Self::String => 1,
            Self::Int => 2,
            Self::Real => 3,
            Self::Color => 4,
            Self::Float2 => 5,
            Self::Float3 => 6,
            Self::Float4 => 7,
            Self::Bool => 8,
            Self::UInt => 9,
            Self::Quat => 10,
            Self::AssetReference => 11,
            Self::AssetReferenceList => 12,
            Self::EntityReference => 13,
            Self::Variant => 14,
            Self::VariantList => 15,
            Self::Transform => 16,
            Self::Point => 17,
        }
    }

    /// The stable type name used in documents and descriptors.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Real => "real",
            Self::Color => "color",
            Self::Float2 => "float2",
            Self::Float3 => "float3",
            Self::Float4 => "float4",
            Self::Bool => "bool",
            Self::UInt => "uint",
            Self::Quat => "quat",
            Self::AssetReference => "assetreference",
            Self::AssetReferenceList => "assetreferencelist",
            Self::EntityReference => "entityreference",
            Self::Variant => "variant",
            Self::VariantList => "variantlist",
            Self::Transform => "transform",
            Self::Point => "point",
        }
    }

    /// Resolve a numeric type id.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::UnknownTypeId`] for `0` and for ids outside
    /// the closed set.
    pub fn from_type_id(id: u32) -> Result<Self, AttributeError> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.type_id() == id)
            .ok_or(AttributeError::UnknownTypeId(id))
    }

    /// Resolve a type name. Matching ignores ASCII case. The legacy names
    /// `qvariant`, `qvariantlist` and `qpoint` are accepted on input.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::UnknownTypeName`] if no kind has this name.
    pub fn from_type_name(name: &str) -> Result<Self, AttributeError> {
        let name = name.trim();
        let legacy = [
            ("qvariant", Self::Variant),
            ("qvariantlist", Self::VariantList),
            ("qpoint", Self::Point),
        ];
        if let Some((_, kind)) = legacy.iter().find(|(alias, _)| alias.eq_ignore_ascii_case(name)) {
            return Ok(*kind);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.type_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| AttributeError::UnknownTypeName(name.to_string()))
    }

    /// Whether values of this kind admit continuous interpolation.
    #[must_use]
    pub const fn is_interpolable(self) -> bool {
        !matches!(
            self,
            Self::String
                | Self::Bool
                | Self::AssetReference
                | Self::AssetReferenceList
                | Self::EntityReference
                | Self::Variant
                | Self::VariantList
        )
    }

    /// Whether the text form is a `;`-separated list.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(self, Self::AssetReferenceList | Self::VariantList)
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Map a type name to its type id, or [`AttributeKind::NONE_ID`] if unknown.
#[must_use]
pub fn type_id_for_type_name(name: &str) -> u32 {
    AttributeKind::from_type_name(name).map_or(AttributeKind::NONE_ID, AttributeKind::type_id)
}

/// Map a type id to its type name, or the empty string if unknown.
#[must_use]
pub fn type_name_for_type_id(id: u32) -> &'static str {
    AttributeKind::from_type_id(id).map_or("", AttributeKind::type_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_dense() {
        for (i, kind) in AttributeKind::ALL.iter().enumerate() {
            assert_eq!(kind.type_id(), i as u32 + 1);
        }
    }

    #[test]
    fn test_name_and_id_lookup_agree() {
        for kind in AttributeKind::ALL {
            assert_eq!(AttributeKind::from_type_id(kind.type_id()), Ok(kind));
            assert_eq!(AttributeKind::from_type_name(kind.type_name()), Ok(kind));
            assert_eq!(type_id_for_type_name(kind.type_name()), kind.type_id());
            assert_eq!(type_name_for_type_id(kind.type_id()), kind.type_name());
        }
    }

    #[test]
    fn test_name_lookup_ignores_case() {
        assert_eq!(
            AttributeKind::from_type_name("AssetReferenceList"),
            Ok(AttributeKind::AssetReferenceList)
        );
    }

    #[test]
    fn test_legacy_type_names() {
        assert_eq!(AttributeKind::from_type_name("QVariant"), Ok(AttributeKind::Variant));
        assert_eq!(AttributeKind::from_type_name("qvariantlist"), Ok(AttributeKind::VariantList));
        assert_eq!(AttributeKind::from_type_name("QPoint"), Ok(AttributeKind::Point));
        // Output keeps the current names.
        assert_eq!(AttributeKind::Point.type_name(), "point");
    }

    #[test]
    fn test_unknown_lookups() {
        assert_eq!(
            AttributeKind::from_type_id(0),
            Err(AttributeError::UnknownTypeId(0))
        );
        assert!(AttributeKind::from_type_name("matrix").is_err());
        assert_eq!(type_id_for_type_name("matrix"), AttributeKind::NONE_ID);
        assert_eq!(type_name_for_type_id(99), "");
    }

    #[test]
    fn test_interpolable_set() {
        assert!(AttributeKind::Real.is_interpolable());
        assert!(AttributeKind::Quat.is_interpolable());
        assert!(AttributeKind::Transform.is_interpolable());
        assert!(!AttributeKind::String.is_interpolable());
        assert!(!AttributeKind::VariantList.is_interpolable());
    }
}
