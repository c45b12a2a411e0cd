//! Shared fixtures for unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use scene_attribute::ChangeMode;
use scene_component::{AttributeDesc, ComponentDesc, ComponentTypeRegistry};

use crate::event::SceneEvent;
use crate::scene::Scene;

pub(crate) fn placeable_desc() -> ComponentDesc {
    ComponentDesc::new("Placeable")
        .with_attribute(AttributeDesc::new("pos", "float3", "0 0 0").with_name("Position"))
        .with_attribute(AttributeDesc::new("visible", "bool", "true"))
}

pub(crate) fn registry() -> Rc<RefCell<ComponentTypeRegistry>> {
    let mut registry = ComponentTypeRegistry::with_builtins();
    registry.register_placeholder_type(&placeable_desc()).unwrap();
    Rc::new(RefCell::new(registry))
}

pub(crate) fn scene(authority: bool) -> Scene {
    Scene::new("test", registry(), authority)
}

pub(crate) fn record(scene: &Scene) -> Rc<RefCell<Vec<SceneEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    scene.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    log
}

pub(crate) const QUIET: ChangeMode = ChangeMode::Disconnected;
