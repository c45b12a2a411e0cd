use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result, bail};
use scene::codec::{self, DocumentFormat};
use scene::{Scene, SceneManager};
use scene_attribute::{ChangeMode, WireWriter};
use tracing::info;

/// Load a document into a fresh scene of `manager`.
fn load<'a>(manager: &'a mut SceneManager, path: &Path) -> Result<&'a mut Scene> {
    let desc = codec::load(path).with_context(|| format!("reading {}", path.display()))?;
    let name = if desc.name.is_empty() { "scene" } else { desc.name.as_str() };
    let scene = manager.create_scene(name, true)?;
    let created = scene.create_content_from_desc(&desc, true, ChangeMode::Disconnected)?;
    info!(path = %path.display(), entities = created.len(), "loaded scene document");
    Ok(scene)
}

pub fn inspect(path: &Path) -> Result<String> {
    let mut manager = SceneManager::new();
    let scene = load(&mut manager, path)?;
    let mut out = String::new();
    writeln!(out, "scene \"{}\": {} entities", scene.name(), scene.entity_count())?;
    for entity in scene.entities() {
        let mut flags = Vec::new();
        if entity.is_local() {
            flags.push("local");
        }
        if entity.is_temporary() {
            flags.push("temporary");
        }
        if flags.is_empty() {
            writeln!(out, "{entity}")?;
        } else {
            writeln!(out, "{entity} [{}]", flags.join(", "))?;
        }
        for component in entity.components() {
            let core = component.core();
            if core.name().is_empty() {
                writeln!(out, "  {} #{} (type {})", core.type_name(), core.id(), core.type_id())?;
            } else {
                writeln!(
                    out,
                    "  {} \"{}\" #{} (type {})",
                    core.type_name(),
                    core.name(),
                    core.id(),
                    core.type_id()
                )?;
            }
            for attr in core.attributes() {
                writeln!(out, "    {} {} = {}", attr.type_name(), attr.id(), attr.to_text())?;
            }
        }
    }
    Ok(out)
}

pub fn convert(input: &Path, output: &Path, include_temporary: bool) -> Result<String> {
    let Some(format) = DocumentFormat::from_path(output) else {
        bail!("can't tell the output format of {}", output.display());
    };
    let mut manager = SceneManager::new();
    let scene = load(&mut manager, input)?;
    let desc = scene.to_desc(include_temporary, true);
    codec::save(&desc, output).with_context(|| format!("writing {}", output.display()))?;
    Ok(format!(
        "wrote {} entities to {} as {format:?}\n",
        desc.entities.len(),
        output.display()
    ))
}

pub fn wire(path: &Path) -> Result<String> {
    let mut manager = SceneManager::new();
    let scene = load(&mut manager, path)?;
    let mut out = String::new();
    for entity in scene.entities() {
        writeln!(out, "{entity}")?;
        for component in entity.components() {
            let mut writer = WireWriter::new();
            component.serialize_to_binary(&mut writer);
            writeln!(
                out,
                "  {} #{}: {}",
                component.core().type_name(),
                component.core().id(),
                hex(writer.as_bytes())
            )?;
        }
    }
    Ok(out)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const DOCUMENT: &str = r#"{
        "name": "hall",
        "entities": [
            {
                "id": 3,
                "name": "lamp",
                "components": [
                    {
                        "type_name": "Glow",
                        "name": "fx",
                        "attributes": [
                            { "id": "strength", "type_name": "int", "value": "5" },
                            { "id": "tint", "type_name": "color", "value": "1 0 0 1" }
                        ]
                    }
                ]
            }
        ]
    }"#;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scene-tool-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_document(dir: &Path) -> PathBuf {
        let path = dir.join("hall.json");
        std::fs::write(&path, DOCUMENT).unwrap();
        path
    }

    #[test]
    fn test_inspect_lists_placeholder_attributes() {
        let dir = scratch("inspect");
        let text = inspect(&write_document(&dir)).unwrap();
        assert!(text.starts_with("scene \"hall\": 1 entities\n"));
        assert!(text.contains("Entity \"lamp\" (ID: 3)"));
        assert!(text.contains("  Glow \"fx\" #1"));
        assert!(text.contains("    int strength = 5\n"));
        assert!(text.contains("    color tint = 1 0 0 1\n"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_convert_round_trips_through_msgpack() {
        let dir = scratch("convert");
        let json = write_document(&dir);
        let packed = dir.join("hall.msgpack");
        convert(&json, &packed, false).unwrap();
        let back = dir.join("back.json");
        convert(&packed, &back, false).unwrap();

        let desc = codec::load(&back).unwrap();
        assert_eq!(desc.name, "hall");
        let glow = &desc.entities[0].components[0];
        assert_eq!(glow.type_name, "Glow");
        assert_eq!(glow.attribute("strength").unwrap().value, "5");
        assert!(convert(&json, &dir.join("hall.txt"), false).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_wire_dump() {
        let dir = scratch("wire");
        let text = wire(&write_document(&dir)).unwrap();
        // Two attributes: int 5, then four little-endian f32s.
        assert!(text.contains(
            "  Glow #1: 02 05 00 00 00 00 00 80 3f 00 00 00 00 00 00 00 00 00 00 80 3f\n"
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[0x00, 0xab, 0x10]), "00 ab 10");
        assert_eq!(hex(&[]), "");
    }
}
