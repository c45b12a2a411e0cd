//! Component type identity.
//!
//! Compiled component types pick small, fixed ids. Types known only through
//! a descriptor get an id derived from their name with FNV-1a 32, folded into
//! the upper half of the id space so it can never collide with a compiled id.
//! Two processes that have never communicated agree on the id of the same
//! unknown type name.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an entity within a scene.
pub type EntityId = u32;

/// Identifier of a component within its entity.
pub type ComponentId = u32;

/// Numeric component type id. `0` means "unset".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentTypeId(pub u32);

impl ComponentTypeId {
    pub const NONE: Self = Self(0);

    /// First id of the range reserved for name-derived ids.
    pub const PLACEHOLDER_RANGE_START: u32 = 0x8000_0000;

    const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    /// Derive the id for a type known only by name.
    ///
    /// The name is hashed ASCII-lowercased, matching the case-insensitive
    /// name lookup of the registry.
    ///
    /// ```text
    /// hash = 0x811c9dc5
    /// for each byte in lowercase(name):
    ///     hash = (hash XOR byte) * 0x01000193
    /// id = 0x80000000 | (hash & 0x7fffffff)
    /// ```
    #[must_use]
    pub const fn placeholder_for_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i].to_ascii_lowercase() as u32;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(Self::PLACEHOLDER_RANGE_START | (hash & !Self::PLACEHOLDER_RANGE_START))
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Whether the id lies in the name-derived range.
    #[must_use]
    pub const fn is_placeholder_range(self) -> bool {
        self.0 >= Self::PLACEHOLDER_RANGE_START
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ComponentTypeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_id_is_deterministic() {
        let a = ComponentTypeId::placeholder_for_name("EC_Sparkles");
        let b = ComponentTypeId::placeholder_for_name("EC_Sparkles");
        assert_eq!(a, b);
        assert!(a.is_placeholder_range());
    }

    #[test]
    fn test_placeholder_id_ignores_case() {
        assert_eq!(
            ComponentTypeId::placeholder_for_name("Sparkles"),
            ComponentTypeId::placeholder_for_name("sPARKLES")
        );
    }

    #[test]
    fn test_different_names_differ() {
        assert_ne!(
            ComponentTypeId::placeholder_for_name("Sparkles"),
            ComponentTypeId::placeholder_for_name("Fireworks")
        );
    }

    #[test]
    fn test_empty_name_hashes_offset_basis() {
        let id = ComponentTypeId::placeholder_for_name("");
        assert_eq!(id.0, 0x8000_0000 | (0x811c_9dc5 & 0x7fff_ffff));
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&ComponentTypeId(25)).unwrap();
        assert_eq!(json, "25");
    }
}
