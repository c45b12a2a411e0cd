//! Scene document codecs.
//!
//! JSON for human-readable files and MessagePack for compact ones. The
//! MessagePack form uses named fields (maps, not arrays) so that fields
//! omitted by `skip_serializing_if` decode correctly.

use std::path::Path;

use crate::desc::SceneDesc;
use crate::error::SceneError;

/// On-disk format of a scene document, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    MessagePack,
}

impl DocumentFormat {
    /// `.json` is JSON; `.msgpack`, `.mpk` and `.bin` are MessagePack.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "msgpack" | "mpk" | "bin" => Some(Self::MessagePack),
            _ => None,
        }
    }
}

/// Pretty-printed JSON.
///
/// # Errors
///
/// Returns [`SceneError::Json`] if serialisation fails.
pub fn to_json(desc: &SceneDesc) -> Result<String, SceneError> {
    Ok(serde_json::to_string_pretty(desc)?)
}

/// # Errors
///
/// Returns [`SceneError::Json`] for malformed input.
pub fn from_json(text: &str) -> Result<SceneDesc, SceneError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode to MessagePack.
///
/// # Errors
///
/// Returns [`SceneError::Encode`] if serialisation fails.
pub fn encode(desc: &SceneDesc) -> Result<Vec<u8>, SceneError> {
    rmp_serde::to_vec_named(desc).map_err(SceneError::Encode)
}

/// Decode from MessagePack.
///
/// # Errors
///
/// Returns [`SceneError::Decode`] for malformed input.
pub fn decode(bytes: &[u8]) -> Result<SceneDesc, SceneError> {
    rmp_serde::from_slice(bytes).map_err(SceneError::Decode)
}

/// Read a document, picking the format from the extension (JSON if
/// unrecognised).
///
/// # Errors
///
/// I/O and decoding errors.
pub fn load(path: &Path) -> Result<SceneDesc, SceneError> {
    let bytes = std::fs::read(path)?;
    match DocumentFormat::from_path(path).unwrap_or(DocumentFormat::Json) {
        DocumentFormat::Json => Ok(serde_json::from_slice(&bytes)?),
        DocumentFormat::MessagePack => decode(&bytes),
    }
}

/// Write a document, picking the format from the extension (JSON if
/// unrecognised).
///
/// # Errors
///
/// I/O and encoding errors.
pub fn save(desc: &SceneDesc, path: &Path) -> Result<(), SceneError> {
    let bytes = match DocumentFormat::from_path(path).unwrap_or(DocumentFormat::Json) {
        DocumentFormat::Json => to_json(desc)?.into_bytes(),
        DocumentFormat::MessagePack => encode(desc)?,
    };
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use scene_component::{AttributeDesc, ComponentDesc};

    use super::*;
    use crate::desc::EntityDesc;

    fn sample() -> SceneDesc {
        SceneDesc::new("demo").with_entity(
            EntityDesc::new(3).with_name("door").with_component(
                ComponentDesc::new("Sparkles")
                    .with_name("fx")
                    .with_attribute(AttributeDesc::new("rate", "real", "2.5")),
            ),
        )
    }

    #[test]
    fn test_json_roundtrip() {
        let desc = sample();
        let text = to_json(&desc).unwrap();
        assert!(text.contains("\"Sparkles\""));
        assert_eq!(from_json(&text).unwrap(), desc);
    }

    #[test]
    fn test_msgpack_roundtrip_with_skipped_fields() {
        let desc = sample();
        let bytes = encode(&desc).unwrap();
        assert_eq!(decode(&bytes).unwrap(), desc);
    }

    #[test]
    fn test_decode_invalid_bytes() {
        assert!(matches!(decode(&[0xFF, 0xFF]), Err(SceneError::Decode(_))));
        assert!(matches!(from_json("{"), Err(SceneError::Json(_))));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.JSON")), Some(DocumentFormat::Json));
        assert_eq!(DocumentFormat::from_path(Path::new("a.msgpack")), Some(DocumentFormat::MessagePack));
        assert_eq!(DocumentFormat::from_path(Path::new("a.txt")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("noext")), None);
    }
}
