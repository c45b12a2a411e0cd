//! Bit-exact binary encoding of single attribute values.
//!
//! Values carry no type tag; the reader must already know the attribute's
//! kind. All multi-byte fields are little-endian.
//!
//! | Kind | Encoding |
//! |---|---|
//! | bool | 1 byte, `0x01` / `0x00` |
//! | int, uint | 4 bytes |
//! | real | 4 bytes IEEE-754 |
//! | string, references, variant | `u16` byte length + UTF-8 bytes |
//! | float2/3/4, quat | 2/3/4/4 `f32` in x, y, z, w order |
//! | color | 4 `f32` r, g, b, a |
//! | transform | 9 `f32`: pos.xyz, rot.xyz (degrees), scale.xyz |
//! | point | 2 `i32` x, y |
//! | asset-reference list, variant list | `u8` count + that many strings |

use scene_math::{Color, IntPoint, Quat, Transform, Vec2, Vec3, Vec4};

use crate::dynamic::DynamicValue;
use crate::error::AttributeError;
use crate::kind::AttributeKind;
use crate::reference::{AssetReference, AssetReferenceList, EntityReference};
use crate::value::AttributeValue;

/// Append-only little-endian byte writer.
#[derive(Debug, Clone, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_f32s(&mut self, values: &[f32]) {
        for v in values {
            self.write_f32(*v);
        }
    }

    /// Write a `u16`-length-prefixed UTF-8 string.
    ///
    /// Strings longer than `u16::MAX` bytes are truncated at the last
    /// character boundary that fits.
    pub fn write_string(&mut self, s: &str) {
        let mut end = s.len().min(usize::from(u16::MAX));
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        if end < s.len() {
            tracing::warn!(len = s.len(), "string too long for wire encoding, truncating");
        }
        let bytes = &s.as_bytes()[..end];
        self.write_u16(end as u16);
        self.buf.extend_from_slice(bytes);
    }

    /// Write a `u8` element count. Counts above 255 are clamped and the
    /// number of elements actually written is returned.
    pub fn write_count(&mut self, count: usize) -> usize {
        let written = count.min(usize::from(u8::MAX));
        if written < count {
            tracing::warn!(count, "list too long for wire encoding, truncating to 255");
        }
        self.write_u8(written as u8);
        written
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a borrowed byte buffer.
///
/// Every read checks the remaining length first and fails with
/// [`AttributeError::BufferUnderrun`] without consuming anything.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Borrow the next `n` raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::BufferUnderrun`] if fewer remain.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], AttributeError> {
        self.take(n)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], AttributeError> {
        if self.remaining() < n {
            return Err(AttributeError::BufferUnderrun {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], AttributeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, AttributeError> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Any nonzero byte reads as `true`.
    pub fn read_bool(&mut self) -> Result<bool, AttributeError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, AttributeError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, AttributeError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, AttributeError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, AttributeError> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32s<const N: usize>(&mut self) -> Result<[f32; N], AttributeError> {
        let mut out = [0.0; N];
        for v in &mut out {
            *v = self.read_f32()?;
        }
        Ok(out)
    }

    /// Read a `u16`-length-prefixed string. Invalid UTF-8 is replaced
    /// rather than rejected.
    pub fn read_string(&mut self) -> Result<String, AttributeError> {
        let len = usize::from(self.read_u16()?);
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn read_strings(&mut self) -> Result<Vec<String>, AttributeError> {
        let count = usize::from(self.read_u8()?);
        (0..count).map(|_| self.read_string()).collect()
    }
}

/// Append the wire encoding of `value`.
pub fn encode(value: &AttributeValue, w: &mut WireWriter) {
    match value {
        AttributeValue::String(s) => w.write_string(s),
        AttributeValue::Bool(b) => w.write_bool(*b),
        AttributeValue::Int(v) => w.write_i32(*v),
        AttributeValue::UInt(v) => w.write_u32(*v),
        AttributeValue::Real(v) => w.write_f32(*v),
        AttributeValue::Float2(v) => w.write_f32s(&v.to_array()),
        AttributeValue::Float3(v) => w.write_f32s(&v.to_array()),
        AttributeValue::Float4(v) => w.write_f32s(&v.to_array()),
        AttributeValue::Quat(q) => w.write_f32s(&q.to_array()),
        AttributeValue::Color(c) => w.write_f32s(&c.to_array()),
        AttributeValue::Transform(t) => w.write_f32s(&t.to_array()),
        AttributeValue::Point(p) => {
            w.write_i32(p.x);
            w.write_i32(p.y);
        }
        AttributeValue::AssetReference(r) => w.write_string(&r.reference),
        AttributeValue::EntityReference(r) => w.write_string(&r.reference),
        AttributeValue::Variant(v) => w.write_string(&v.to_text()),
        AttributeValue::AssetReferenceList(list) => {
            let n = w.write_count(list.len());
            for r in list.iter().take(n) {
                w.write_string(&r.reference);
            }
        }
        AttributeValue::VariantList(items) => {
            let n = w.write_count(items.len());
            for item in items.iter().take(n) {
                w.write_string(&item.to_text());
            }
        }
    }
}

/// Decode one value of `kind` from the reader.
///
/// # Errors
///
/// Returns [`AttributeError::BufferUnderrun`] if the buffer ends before the
/// value does. The reader position is unspecified afterwards; callers should
/// discard the rest of the message.
pub fn decode(kind: AttributeKind, r: &mut WireReader<'_>) -> Result<AttributeValue, AttributeError> {
    Ok(match kind {
        AttributeKind::String => AttributeValue::String(r.read_string()?),
        AttributeKind::Bool => AttributeValue::Bool(r.read_bool()?),
        AttributeKind::Int => AttributeValue::Int(r.read_i32()?),
        AttributeKind::UInt => AttributeValue::UInt(r.read_u32()?),
        AttributeKind::Real => AttributeValue::Real(r.read_f32()?),
        AttributeKind::Float2 => AttributeValue::Float2(Vec2::from_array(r.read_f32s()?)),
        AttributeKind::Float3 => AttributeValue::Float3(Vec3::from_array(r.read_f32s()?)),
        AttributeKind::Float4 => AttributeValue::Float4(Vec4::from_array(r.read_f32s()?)),
        AttributeKind::Quat => AttributeValue::Quat(Quat::from_array(r.read_f32s()?)),
        AttributeKind::Color => AttributeValue::Color(Color::from_array(r.read_f32s()?)),
        AttributeKind::Transform => AttributeValue::Transform(Transform::from_array(r.read_f32s()?)),
        AttributeKind::Point => {
            let x = r.read_i32()?;
            let y = r.read_i32()?;
            AttributeValue::Point(IntPoint::new(x, y))
        }
        AttributeKind::AssetReference => {
            AttributeValue::AssetReference(AssetReference::new(r.read_string()?))
        }
        AttributeKind::EntityReference => {
            AttributeValue::EntityReference(EntityReference::new(r.read_string()?))
        }
        AttributeKind::Variant => AttributeValue::Variant(DynamicValue::String(r.read_string()?)),
        AttributeKind::AssetReferenceList => AttributeValue::AssetReferenceList(
            AssetReferenceList {
                refs: r.read_strings()?.into_iter().map(AssetReference::new).collect(),
            },
        ),
        AttributeKind::VariantList => AttributeValue::VariantList(
            r.read_strings()?.into_iter().map(DynamicValue::String).collect(),
        ),
    })
}

/// Convenience: the wire bytes of a single value.
#[must_use]
pub fn to_bytes(value: &AttributeValue) -> Vec<u8> {
    let mut w = WireWriter::new();
    encode(value, &mut w);
    w.into_bytes()
}
