//! Value interpolation for dead reckoning and animation.

use scene_math::lerp;

use crate::error::AttributeError;
use crate::value::AttributeValue;

/// Interpolate between `start` and `end` at `t`.
///
/// Scalars and vectors interpolate linearly (integers round to nearest),
/// quaternions spherically, transforms component-wise with a spherical
/// rotation. `t <= 0` and `t >= 1` return the endpoints exactly, so there
/// is no extrapolation.
///
/// Returns `Ok(None)` for kinds without a meaningful interpolation; this is
/// logged and is not an error.
///
/// # Errors
///
/// Returns [`AttributeError::TypeMismatch`] if `start` and `end` are of
/// different kinds.
pub fn interpolate(
    start: &AttributeValue,
    end: &AttributeValue,
    t: f32,
) -> Result<Option<AttributeValue>, AttributeError> {
    if start.kind() != end.kind() {
        return Err(AttributeError::TypeMismatch {
            expected: start.kind().type_name(),
            found: end.kind().type_name(),
        });
    }
    if !start.kind().is_interpolable() {
        tracing::warn!(kind = %start.kind(), "interpolation not supported for attribute type");
        return Ok(None);
    }
    if t <= 0.0 {
        return Ok(Some(start.clone()));
    }
    if t >= 1.0 {
        return Ok(Some(end.clone()));
    }

    let value = match (start, end) {
        (AttributeValue::Int(a), AttributeValue::Int(b)) => {
            AttributeValue::Int(lerp_f64(f64::from(*a), f64::from(*b), t) as i32)
        }
        (AttributeValue::UInt(a), AttributeValue::UInt(b)) => {
            AttributeValue::UInt(lerp_f64(f64::from(*a), f64::from(*b), t) as u32)
        }
        (AttributeValue::Real(a), AttributeValue::Real(b)) => AttributeValue::Real(lerp(*a, *b, t)),
        (AttributeValue::Float2(a), AttributeValue::Float2(b)) => AttributeValue::Float2(a.lerp(*b, t)),
        (AttributeValue::Float3(a), AttributeValue::Float3(b)) => AttributeValue::Float3(a.lerp(*b, t)),
        (AttributeValue::Float4(a), AttributeValue::Float4(b)) => AttributeValue::Float4(a.lerp(*b, t)),
        (AttributeValue::Color(a), AttributeValue::Color(b)) => AttributeValue::Color(a.lerp(*b, t)),
        (AttributeValue::Quat(a), AttributeValue::Quat(b)) => AttributeValue::Quat(a.slerp(*b, t)),
        (AttributeValue::Transform(a), AttributeValue::Transform(b)) => {
            AttributeValue::Transform(a.interpolate(b, t))
        }
        (AttributeValue::Point(a), AttributeValue::Point(b)) => AttributeValue::Point(a.lerp(*b, t)),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// Rounded lerp in double precision, saturating on conversion back.
fn lerp_f64(a: f64, b: f64, t: f32) -> f64 {
    (a + (b - a) * f64::from(t)).round()
}
