//! # scene
//!
//! Entities, scenes and the runtime root that owns them.
//!
//! - [`Entity`]: an id-addressed, ordered bag of components with an
//!   unattached / attached / removed lifecycle.
//! - [`Scene`]: the entity registry. Allocates ids, creates and removes
//!   entities, fans component and entity events out to subscribers, loads
//!   and saves [`SceneDesc`] documents and runs attribute interpolations.
//! - [`SceneManager`]: owns the component type registry and the name-keyed
//!   scenes, one of which is the default.
//! - [`codec`]: JSON and MessagePack encodings of scene documents.

pub mod binary;
pub mod codec;
pub mod desc;
pub mod entity;
pub mod error;
pub mod event;
pub mod ids;
pub mod interpolation;
pub mod manager;
pub mod scene;

#[cfg(test)]
mod testing;

pub use desc::{EntityDesc, SceneDesc};
pub use entity::{Entity, EntityState};
pub use error::SceneError;
pub use event::{SceneEvent, SceneEvents};
pub use ids::{FIRST_LOCAL_ID, FIRST_UNACKED_ID, IdGenerator, IdRange};
pub use manager::SceneManager;
pub use scene::Scene;
