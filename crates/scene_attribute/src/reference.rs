//! Asset and entity reference value types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A reference to an asset, by its reference string (URL, file name, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetReference {
    pub reference: String,
}

impl AssetReference {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }
}

impl fmt::Display for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference)
    }
}

/// An ordered list of asset references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetReferenceList {
    pub refs: Vec<AssetReference>,
}

impl AssetReferenceList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn push(&mut self, reference: AssetReference) {
        self.refs.push(reference);
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetReference> {
        self.refs.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for AssetReferenceList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            refs: iter.into_iter().map(AssetReference::new).collect(),
        }
    }
}

/// A reference to an entity, either by its numeric id or by its name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityReference {
    pub reference: String,
}

impl EntityReference {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    /// A reference to an entity by id.
    #[must_use]
    pub fn from_id(id: u32) -> Self {
        Self::new(id.to_string())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reference.trim().is_empty()
    }

    /// The referenced entity id, if the reference text is numeric.
    #[must_use]
    pub fn entity_id(&self) -> Option<u32> {
        self.reference.trim().parse().ok()
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_reference_by_id() {
        let r = EntityReference::from_id(42);
        assert_eq!(r.entity_id(), Some(42));
        assert_eq!(EntityReference::new("door").entity_id(), None);
        assert!(EntityReference::new("  ").is_empty());
    }

    #[test]
    fn test_asset_list_from_iter() {
        let list: AssetReferenceList = ["a.png", "b.png"].into_iter().collect();
        assert_eq!(list.len(), 2);
        assert_eq!(list.refs[1].reference, "b.png");
    }
}
