//! Attribute-level error types.

use crate::kind::AttributeKind;

/// Errors produced while converting or decoding attribute values.
///
/// None of these are fatal to the process; callers decide whether to
/// substitute a default ([`AttributeError::Parse`]), drop the enclosing
/// message ([`AttributeError::BufferUnderrun`]) or just report the failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttributeError {
    /// A text literal could not be parsed as the attribute's kind.
    #[error("cannot parse {kind} from {input:?}: {reason}")]
    Parse {
        kind: AttributeKind,
        input: String,
        reason: String,
    },

    /// A binary read needed more bytes than the buffer holds.
    #[error("buffer underrun: needed {needed} bytes, {remaining} remaining")]
    BufferUnderrun { needed: usize, remaining: usize },

    /// A value of one type was offered to an attribute of another type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// No attribute kind has this type name.
    #[error("unknown attribute type name {0:?}")]
    UnknownTypeName(String),

    /// No attribute kind has this numeric type id.
    #[error("unknown attribute type id {0}")]
    UnknownTypeId(u32),
}

impl AttributeError {
    pub(crate) fn parse(kind: AttributeKind, input: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            kind,
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
