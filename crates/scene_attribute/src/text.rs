//! Human-readable attribute encoding.
//!
//! Used for persisted documents and script-level round tripping:
//!
//! | Kind | Text |
//! |---|---|
//! | bool | `true` / `false` |
//! | int, uint, real | decimal |
//! | float2/3/4, quat, color, point | space-separated components (`x y z w`, `r g b a`) |
//! | transform | nine comma-separated floats: `pos.xyz, rot.xyz, scale.xyz` |
//! | asset / entity reference, string | the text itself |
//! | asset-reference list, variant list | `;`-separated elements |
//!
//! Reals are written with the shortest representation that parses back to the
//! same `f32`, so text round trips are exact. A list whose only element is
//! blank parses as the empty list.
//!
//! Parsing is tolerant of surrounding whitespace, of parentheses around
//! vectors and of `,` / `;` / whitespace as vector separators.

use scene_math::{Color, IntPoint, Quat, Transform, Vec2, Vec3, Vec4};

use crate::dynamic::DynamicValue;
use crate::error::AttributeError;
use crate::kind::AttributeKind;
use crate::reference::{AssetReference, AssetReferenceList, EntityReference};
use crate::value::AttributeValue;

const LIST_SEPARATOR: char = ';';

/// Encode a value as text.
#[must_use]
pub fn to_text(value: &AttributeValue) -> String {
    match value {
        AttributeValue::String(s) => s.clone(),
        AttributeValue::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        AttributeValue::Int(v) => v.to_string(),
        AttributeValue::UInt(v) => v.to_string(),
        AttributeValue::Real(v) => v.to_string(),
        AttributeValue::Float2(v) => join_floats(&v.to_array(), " "),
        AttributeValue::Float3(v) => join_floats(&v.to_array(), " "),
        AttributeValue::Float4(v) => join_floats(&v.to_array(), " "),
        AttributeValue::Quat(q) => join_floats(&q.to_array(), " "),
        AttributeValue::Color(c) => join_floats(&c.to_array(), " "),
        AttributeValue::Point(p) => format!("{} {}", p.x, p.y),
        AttributeValue::Transform(t) => join_floats(&t.to_array(), ","),
        AttributeValue::AssetReference(r) => r.reference.clone(),
        AttributeValue::EntityReference(r) => r.reference.clone(),
        AttributeValue::AssetReferenceList(list) => list
            .iter()
            .map(|r| r.reference.as_str())
            .collect::<Vec<_>>()
            .join(";"),
        AttributeValue::Variant(v) => v.to_text(),
        AttributeValue::VariantList(items) => items
            .iter()
            .map(DynamicValue::to_text)
            .collect::<Vec<_>>()
            .join(";"),
    }
}

/// Decode a value of `kind` from text.
///
/// # Errors
///
/// Returns [`AttributeError::Parse`] if the literal is malformed for `kind`.
/// Strings, references and lists never fail.
pub fn from_text(kind: AttributeKind, text: &str) -> Result<AttributeValue, AttributeError> {
    Ok(match kind {
        AttributeKind::String => AttributeValue::String(text.to_string()),
        AttributeKind::Bool => AttributeValue::Bool(parse_bool(text)?),
        AttributeKind::Int => AttributeValue::Int(parse_scalar(kind, text)?),
        AttributeKind::UInt => AttributeValue::UInt(parse_scalar(kind, text)?),
        AttributeKind::Real => AttributeValue::Real(parse_scalar(kind, text)?),
        AttributeKind::Float2 => AttributeValue::Float2(Vec2::from_array(parse_floats(kind, text)?)),
        AttributeKind::Float3 => AttributeValue::Float3(Vec3::from_array(parse_floats(kind, text)?)),
        AttributeKind::Float4 => AttributeValue::Float4(Vec4::from_array(parse_floats(kind, text)?)),
        AttributeKind::Quat => AttributeValue::Quat(Quat::from_array(parse_floats(kind, text)?)),
        AttributeKind::Color => AttributeValue::Color(Color::from_array(parse_floats(kind, text)?)),
        AttributeKind::Point => AttributeValue::Point(parse_point(text)?),
        AttributeKind::Transform => AttributeValue::Transform(parse_transform(text)?),
        AttributeKind::AssetReference => {
            AttributeValue::AssetReference(AssetReference::new(text))
        }
        AttributeKind::EntityReference => {
            AttributeValue::EntityReference(EntityReference::new(text))
        }
        AttributeKind::AssetReferenceList => AttributeValue::AssetReferenceList(
            AssetReferenceList {
                refs: split_list(text).map(AssetReference::new).collect(),
            },
        ),
        AttributeKind::Variant => AttributeValue::Variant(DynamicValue::String(text.to_string())),
        AttributeKind::VariantList => AttributeValue::VariantList(
            split_list(text)
                .map(|s| DynamicValue::String(s.to_string()))
                .collect(),
        ),
    })
}

fn join_floats(values: &[f32], separator: &str) -> String {
    values
        .iter()
        .map(f32::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Split a list literal. A single blank element collapses to no elements.
fn split_list(text: &str) -> impl Iterator<Item = &str> {
    let parts: Vec<&str> = text.split(LIST_SEPARATOR).collect();
    let collapse = parts.len() == 1 && parts[0].trim().is_empty();
    parts.into_iter().filter(move |_| !collapse)
}

fn parse_bool(text: &str) -> Result<bool, AttributeError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AttributeError::parse(
            AttributeKind::Bool,
            text,
            "expected true or false",
        )),
    }
}

fn parse_scalar<T>(kind: AttributeKind, text: &str) -> Result<T, AttributeError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.trim()
        .parse::<T>()
        .map_err(|e| AttributeError::parse(kind, text, e.to_string()))
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|t| !t.is_empty())
}

fn parse_float_list(kind: AttributeKind, text: &str) -> Result<Vec<f32>, AttributeError> {
    tokens(text)
        .map(|t| {
            t.parse::<f32>()
                .map_err(|e| AttributeError::parse(kind, text, format!("{t:?}: {e}")))
        })
        .collect()
}

fn parse_floats<const N: usize>(kind: AttributeKind, text: &str) -> Result<[f32; N], AttributeError> {
    let values = parse_float_list(kind, text)?;
    let found = values.len();
    values.try_into().map_err(|_| {
        AttributeError::parse(kind, text, format!("expected {N} components, found {found}"))
    })
}

fn parse_point(text: &str) -> Result<IntPoint, AttributeError> {
    let kind = AttributeKind::Point;
    let coords = tokens(text)
        .map(|t| {
            t.parse::<i32>()
                .or_else(|_| t.parse::<f32>().map(|f| f as i32))
                .map_err(|e| AttributeError::parse(kind, text, format!("{t:?}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match coords.as_slice() {
        [x, y] => Ok(IntPoint::new(*x, *y)),
        _ => Err(AttributeError::parse(
            kind,
            text,
            format!("expected 2 components, found {}", coords.len()),
        )),
    }
}

/// Accepts position only (3 values), position and rotation (6) or the full
/// nine-field form; omitted fields keep their identity values.
fn parse_transform(text: &str) -> Result<Transform, AttributeError> {
    let kind = AttributeKind::Transform;
    let values = parse_float_list(kind, text)?;
    if !matches!(values.len(), 3 | 6 | 9) {
        return Err(AttributeError::parse(
            kind,
            text,
            format!("expected 3, 6 or 9 components, found {}", values.len()),
        ));
    }
    let mut fields = Transform::IDENTITY.to_array();
    fields[..values.len()].copy_from_slice(&values);
    Ok(Transform::from_array(fields))
}
