use std::any::Any;
use std::rc::Rc;

use scene::codec::{self, DocumentFormat};
use scene::{SceneDesc, SceneManager};
use scene_attribute::{Attribute, ChangeMode, Color};
use scene_component::{AttributeKey, Component, ComponentCore, ComponentTypeId, FnFactory};

struct Light {
    core: ComponentCore,
}

impl Light {
    const COLOR: AttributeKey<Color> = AttributeKey::new(0);
    const RANGE: AttributeKey<f32> = AttributeKey::new(1);
}

impl Default for Light {
    fn default() -> Self {
        let core = ComponentCore::new("Light", ComponentTypeId(60))
            .with_static(Attribute::new("color", Color::new(1.0, 1.0, 1.0, 1.0)))
            .and_then(|c| c.with_static(Attribute::new("range", 10.0f32)))
            .unwrap();
        Self { core }
    }
}

impl Component for Light {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn manager() -> SceneManager {
    let manager = SceneManager::new();
    manager
        .register_component_factory(Rc::new(FnFactory::of::<Light>("Light", ComponentTypeId(60))))
        .unwrap();
    manager
}

fn authored() -> SceneDesc {
    let mut manager = manager();
    let scene = manager.create_scene("world", true).unwrap();
    let lamp = scene.create_entity(0, &["Light", "DynamicComponent"], ChangeMode::Default, true).unwrap();
    lamp.set_name("lamp");
    lamp.get_mut::<Light>()
        .unwrap()
        .core_mut()
        .set(Light::RANGE, 25.0, ChangeMode::Default)
        .unwrap();
    let dynamic = lamp.get_mut::<scene_component::DynamicComponent>().unwrap();
    dynamic.add_attribute("string", "label", ChangeMode::Default).unwrap();
    dynamic
        .set_attribute_from_text("label", "hall", ChangeMode::Default)
        .unwrap();
    scene.to_desc(false, false)
}

fn check_loaded(desc: &SceneDesc) {
    let mut manager = manager();
    let scene = manager.create_scene("copy", false).unwrap();
    let created = scene.create_content_from_desc(desc, true, ChangeMode::Default).unwrap();
    assert_eq!(created, vec![1]);
    let lamp = scene.entity_by_name("lamp").unwrap();
    assert_eq!(lamp.get::<Light>().unwrap().core().get(Light::RANGE), Some(&25.0));
    assert_eq!(
        lamp.get::<Light>().unwrap().core().get(Light::COLOR),
        Some(&Color::new(1.0, 1.0, 1.0, 1.0))
    );
    assert_eq!(lamp.attribute("label").unwrap().to_text(), "hall");
}

#[test]
fn test_json_document_round_trip() {
    let desc = authored();
    let text = codec::to_json(&desc).unwrap();
    assert!(text.contains("\"lamp\""));
    check_loaded(&codec::from_json(&text).unwrap());
}

#[test]
fn test_msgpack_document_round_trip() {
    let desc = authored();
    let bytes = codec::encode(&desc).unwrap();
    assert_eq!(codec::decode(&bytes).unwrap(), desc);
    check_loaded(&codec::decode(&bytes).unwrap());
}

#[test]
fn test_files_by_extension() {
    let desc = authored();
    let dir = std::env::temp_dir().join(format!("scene-documents-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    for name in ["world.json", "world.msgpack"] {
        let path = dir.join(name);
        assert!(DocumentFormat::from_path(&path).is_some());
        codec::save(&desc, &path).unwrap();
        assert_eq!(codec::load(&path).unwrap(), desc);
    }
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_binary_snapshot_between_managers() {
    let desc = authored();
    let mut source = manager();
    let scene = source.create_scene("world", true).unwrap();
    scene.create_content_from_desc(&desc, true, ChangeMode::Disconnected).unwrap();
    let bytes = scene.to_binary(false, false).unwrap();

    let mut target = manager();
    let copy = target.create_scene("copy", false).unwrap();
    copy.create_content_from_binary(&bytes, true, ChangeMode::Default).unwrap();
    // Snapshots carry component state only.
    let original = &desc.entities[0].components;
    let mirrored = &copy.to_desc(false, false).entities[0].components;
    assert_eq!(mirrored, original);
}

#[test]
fn test_default_scene() {
    let mut manager = manager();
    assert!(manager.default_scene_mut().is_err());
    manager.create_scene("a", true).unwrap();
    manager.create_scene("b", true).unwrap();
    assert_eq!(manager.default_scene().unwrap().name(), "a");
    manager.set_default_scene("b").unwrap();
    manager.remove_scene("b").unwrap();
    assert!(manager.default_scene().is_none());
    assert_eq!(manager.scene_names(), vec!["a"]);
}
