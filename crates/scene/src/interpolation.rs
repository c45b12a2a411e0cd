//! Attribute interpolation driven by the scene clock.
//!
//! Used for dead reckoning of replicated values: each update moves the live
//! attribute from the recorded start towards the end value with
//! [`ChangeMode::LocalOnly`], so interpolated steps are never sent back out.
//! An interpolation lingers for as long again after reaching its end so
//! that a follow-up start within that window continues smoothly instead of
//! snapping.

use scene_attribute::{Attribute, AttributeValue, ChangeMode};
use scene_component::{ComponentError, ComponentId, EntityId};

use crate::error::SceneError;
use crate::scene::Scene;

/// One running interpolation.
#[derive(Debug)]
pub(crate) struct AttributeInterpolation {
    pub(crate) entity: EntityId,
    pub(crate) component: ComponentId,
    pub(crate) attribute: u8,
    start: Attribute,
    end: Attribute,
    length: f32,
    time: f32,
}

impl Scene {
    /// Start interpolating an attribute towards `end` over `length`
    /// seconds.
    ///
    /// If the attribute is already interpolating, the new interpolation
    /// starts from its current value. Otherwise the attribute snaps to
    /// `end` immediately.
    ///
    /// # Errors
    ///
    /// Fails if `length` is not positive, the attribute cannot be found or
    /// has a non-interpolable type, the component has a dynamic structure,
    /// or `end` is of the wrong type.
    pub fn start_attribute_interpolation(
        &mut self,
        entity: EntityId,
        component: ComponentId,
        attribute: &str,
        end: AttributeValue,
        length: f32,
    ) -> Result<(), SceneError> {
        let reject = |reason| SceneError::Interpolation {
            attribute: attribute.to_string(),
            reason,
        };
        if length.is_nan() || length <= 0.0 {
            return Err(reject("length must be positive"));
        }
        let comp = self
            .entity(entity)
            .ok_or(SceneError::EntityNotFound(entity))?
            .component_by_id(component)
            .ok_or_else(|| SceneError::ComponentNotFound {
                entity,
                component: component.to_string(),
            })?;
        if comp.supports_dynamic_attributes() {
            return Err(reject("component has a dynamic structure"));
        }
        let attr = comp
            .core()
            .attribute(attribute)
            .ok_or_else(|| ComponentError::NoSuchAttribute(attribute.to_string()))?;
        if !attr.kind().is_interpolable() {
            return Err(reject("attribute type cannot be interpolated"));
        }
        let index = attr.index();

        let mut end_attr = attr.clone_detached();
        end_attr.set_value(end, ChangeMode::Disconnected)?;

        let previous = self.end_interpolation_at(entity, component, index);
        let live = self
            .entity_mut(entity)
            .and_then(|e| e.component_by_id_mut(component))
            .and_then(|c| c.core_mut().attribute_at_mut(index))
            .ok_or_else(|| ComponentError::NoSuchAttribute(attribute.to_string()))?;
        if !previous {
            live.copy_value(&end_attr, ChangeMode::LocalOnly)?;
        }
        let start = live.clone_detached();

        self.interpolations.push(AttributeInterpolation {
            entity,
            component,
            attribute: index,
            start,
            end: end_attr,
            length,
            time: 0.0,
        });
        Ok(())
    }

    /// Advance every interpolation by `dt` seconds.
    ///
    /// Interpolations whose entity, component or attribute has gone away
    /// are dropped.
    pub fn update_attribute_interpolations(&mut self, dt: f32) {
        for i in (0..self.interpolations.len()).rev() {
            let interp = &mut self.interpolations[i];
            let live = self
                .entities
                .get_mut(&interp.entity)
                .and_then(|e| e.component_by_id_mut(interp.component))
                .and_then(|c| c.core_mut().attribute_at_mut(interp.attribute));
            let finished = match live {
                None => true,
                Some(live) if interp.time <= interp.length => {
                    interp.time += dt;
                    let t = (interp.time / interp.length).min(1.0);
                    if let Err(e) = live.interpolate(interp.start.value(), interp.end.value(), t, ChangeMode::LocalOnly) {
                        tracing::warn!(error = %e, attribute = %live.id(), "interpolation step failed");
                    }
                    false
                }
                Some(_) => {
                    interp.time += dt;
                    interp.time >= interp.length * 2.0
                }
            };
            if finished {
                self.interpolations.remove(i);
            }
        }
    }

    /// Stop interpolating an attribute, leaving its current value. Returns
    /// whether an interpolation was running.
    pub fn end_attribute_interpolation(&mut self, entity: EntityId, component: ComponentId, attribute: &str) -> bool {
        let index = self
            .entity(entity)
            .and_then(|e| e.component_by_id(component))
            .and_then(|c| c.core().attribute(attribute))
            .map(Attribute::index);
        index.is_some_and(|index| self.end_interpolation_at(entity, component, index))
    }

    pub fn end_all_attribute_interpolations(&mut self) {
        self.interpolations.clear();
    }

    #[must_use]
    pub fn is_interpolating(&self, entity: EntityId, component: ComponentId, attribute: &str) -> bool {
        let index = self
            .entity(entity)
            .and_then(|e| e.component_by_id(component))
            .and_then(|c| c.core().attribute(attribute))
            .map(Attribute::index);
        index.is_some_and(|index| {
            self.interpolations
                .iter()
                .any(|i| i.entity == entity && i.component == component && i.attribute == index)
        })
    }

    #[must_use]
    pub fn interpolation_count(&self) -> usize {
        self.interpolations.len()
    }

    fn end_interpolation_at(&mut self, entity: EntityId, component: ComponentId, index: u8) -> bool {
        let pos = self
            .interpolations
            .iter()
            .position(|i| i.entity == entity && i.component == component && i.attribute == index);
        pos.map(|pos| self.interpolations.remove(pos)).is_some()
    }
}
