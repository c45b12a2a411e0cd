//! Binary scene snapshots.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! u32 entity count
//! per entity:
//!   u32 entity id
//!   u32 component count
//!   per component:
//!     u32    component type id
//!     string instance name (u16 length + UTF-8)
//!     u8     replicated flag
//!     u32    payload size
//!     bytes  payload (the component's own binary serialization)
//! ```
//!
//! Payloads are size-prefixed so a reader can skip component types it
//! cannot instantiate without losing its place in the stream.

use scene_attribute::{ChangeMode, WireReader, WireWriter};
use scene_component::{ComponentTypeId, EntityId};

use crate::entity::Entity;
use crate::error::SceneError;
use crate::scene::Scene;

struct ComponentRecord<'a> {
    type_id: ComponentTypeId,
    name: String,
    sync: bool,
    payload: &'a [u8],
}

struct EntityRecord<'a> {
    id: EntityId,
    components: Vec<ComponentRecord<'a>>,
}

fn len_u32(len: usize, what: &str) -> Result<u32, SceneError> {
    u32::try_from(len).map_err(|_| SceneError::MalformedBinary(format!("too many {what}")))
}

impl Entity {
    /// Append this entity to a binary snapshot. Temporary components are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Fails only if a count does not fit in 32 bits.
    pub fn serialize_to_binary(&self, writer: &mut WireWriter) -> Result<(), SceneError> {
        writer.write_u32(self.id());
        let components: Vec<_> = self.components().filter(|c| !c.core().is_temporary()).collect();
        writer.write_u32(len_u32(components.len(), "components")?);
        for component in components {
            writer.write_u32(component.core().type_id().0);
            writer.write_string(component.core().name());
            writer.write_bool(component.core().is_replicated());
            let mut payload = WireWriter::new();
            component.serialize_to_binary(&mut payload);
            writer.write_u32(len_u32(payload.len(), "payload bytes")?);
            writer.write_bytes(payload.as_bytes());
        }
        Ok(())
    }
}

impl Scene {
    /// A binary snapshot of the scene. Temporary and local entities are
    /// included only when asked for.
    ///
    /// # Errors
    ///
    /// Fails only if a count does not fit in 32 bits.
    pub fn to_binary(&self, include_temporary: bool, include_local: bool) -> Result<Vec<u8>, SceneError> {
        let entities: Vec<&Entity> = self
            .entities()
            .filter(|e| include_local || !e.is_local())
            .filter(|e| include_temporary || !e.is_temporary())
            .collect();
        let mut writer = WireWriter::new();
        writer.write_u32(len_u32(entities.len(), "entities")?);
        for entity in entities {
            entity.serialize_to_binary(&mut writer)?;
        }
        Ok(writer.into_bytes())
    }

    /// Instantiate the entities of a binary snapshot.
    ///
    /// The whole stream is framed before anything is created, so a
    /// truncated snapshot creates nothing. Components whose type is unknown
    /// or whose payload does not decode are logged and skipped. Id handling
    /// and announcements are as for [`Scene::create_content_from_desc`].
    ///
    /// # Errors
    ///
    /// Returns a buffer underrun for a truncated stream.
    pub fn create_content_from_binary(
        &mut self,
        bytes: &[u8],
        use_ids: bool,
        mode: ChangeMode,
    ) -> Result<Vec<EntityId>, SceneError> {
        let records = parse(bytes)?;
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            let id = self.resolve_document_id(record.id, false, use_ids)?;
            self.add_entity(Entity::new(id), ChangeMode::Disconnected)?;
            let registry = std::rc::Rc::clone(self.registry());
            let entity = self.entity_mut(id).ok_or(SceneError::EntityNotFound(id))?;
            for comp in record.components {
                let created_comp = registry.borrow().create_component_by_id(comp.type_id);
                let mut component = match created_comp {
                    Ok(component) => component,
                    Err(e) => {
                        tracing::error!(error = %e, entity = id, "failed to load component");
                        continue;
                    }
                };
                component.core_mut().set_name(comp.name);
                component.core_mut().set_replicated(comp.sync)?;
                if !comp.payload.is_empty()
                    && let Err(e) = component.deserialize_from_binary(&mut WireReader::new(comp.payload), ChangeMode::Disconnected)
                {
                    tracing::error!(error = %e, entity = id, "failed to load component");
                    continue;
                }
                entity.add_component(component, ChangeMode::Disconnected)?;
            }
            created.push(id);
        }
        self.announce_created(&created, mode);
        Ok(created)
    }
}

fn parse(bytes: &[u8]) -> Result<Vec<EntityRecord<'_>>, SceneError> {
    let mut reader = WireReader::new(bytes);
    let num_entities = reader.read_u32()?;
    let mut entities = Vec::new();
    for _ in 0..num_entities {
        let id = reader.read_u32()?;
        let num_components = reader.read_u32()?;
        let mut components = Vec::new();
        for _ in 0..num_components {
            let type_id = ComponentTypeId(reader.read_u32()?);
            let name = reader.read_string()?;
            let sync = reader.read_bool()?;
            let size = reader.read_u32()?;
            let size = usize::try_from(size).map_err(|_| SceneError::MalformedBinary(format!("payload of {size} bytes")))?;
            let payload = reader.read_bytes(size)?;
            components.push(ComponentRecord {
                type_id,
                name,
                sync,
                payload,
            });
        }
        entities.push(EntityRecord { id, components });
    }
    if reader.remaining() > 0 {
        tracing::warn!(trailing = reader.remaining(), "ignoring trailing bytes after scene snapshot");
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use scene_attribute::Vec3;
    use scene_component::DynamicComponent;

    use super::*;
    use crate::event::SceneEvent;
    use crate::testing::{QUIET, record, scene};

    fn populated() -> Scene {
        let mut scene = scene(true);
        let entity = scene
            .create_entity(0, &["Placeable", "DynamicComponent"], QUIET, true)
            .unwrap();
        entity
            .component_mut("Placeable")
            .unwrap()
            .core_mut()
            .set_attribute("pos", Vec3::new(1.0, 2.0, 3.0), QUIET)
            .unwrap();
        entity
            .get_mut::<DynamicComponent>()
            .unwrap()
            .add_attribute("int", "score", QUIET)
            .unwrap();
        entity
            .create_component("Placeable", "scratch", QUIET, true)
            .unwrap()
            .core_mut()
            .set_temporary(true);
        scene.create_local_entity(&["Placeable"], QUIET).unwrap();
        scene
    }

    #[test]
    fn test_snapshot_round_trip() {
        let source = populated();
        let bytes = source.to_binary(false, false).unwrap();

        let mut target = scene(false);
        let log = record(&target);
        let created = target.create_content_from_binary(&bytes, true, ChangeMode::Default).unwrap();
        assert_eq!(created, vec![1]);

        let entity = target.entity(1).unwrap();
        assert_eq!(entity.num_components(), 2);
        assert_eq!(entity.attribute("pos").unwrap().get::<Vec3>(), Some(&Vec3::new(1.0, 2.0, 3.0)));
        assert!(entity.get::<DynamicComponent>().unwrap().contains_attribute("score"));
        assert!(matches!(log.borrow()[0], SceneEvent::EntityCreated { entity: 1, .. }));
    }

    #[test]
    fn test_snapshot_filters() {
        let source = populated();
        let all = source.to_binary(true, true).unwrap();
        let mut target = scene(true);
        let created = target.create_content_from_binary(&all, false, QUIET).unwrap();
        assert_eq!(created.len(), 2);
        // Temporary components never go into a snapshot.
        assert_eq!(target.entity(created[0]).unwrap().num_components(), 2);
    }

    #[test]
    fn test_truncated_snapshot_creates_nothing() {
        let bytes = populated().to_binary(false, false).unwrap();
        let mut target = scene(true);
        for cut in [3, 8, bytes.len() - 1] {
            let err = target.create_content_from_binary(&bytes[..cut], true, QUIET);
            assert!(err.is_err(), "cut at {cut}");
            assert_eq!(target.entity_count(), 0);
        }
    }

    #[test]
    fn test_unknown_component_type_is_skipped() {
        let mut writer = WireWriter::new();
        writer.write_u32(1);
        writer.write_u32(5);
        writer.write_u32(1);
        writer.write_u32(0x1234);
        writer.write_string("");
        writer.write_bool(true);
        writer.write_u32(2);
        writer.write_bytes(&[0xAA, 0xBB]);

        let mut target = scene(true);
        let created = target.create_content_from_binary(writer.as_bytes(), true, QUIET).unwrap();
        assert_eq!(created, vec![5]);
        assert_eq!(target.entity(5).unwrap().num_components(), 0);
    }
}
