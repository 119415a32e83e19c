use alloc::borrow::Cow;
use std::path::PathBuf;

use thiserror::Error;

// -----------------------------------------------------------------------------
// ScribeError

/// The single error channel of every save, load and registry operation.
///
/// Only [`FieldAbsent`](ScribeError::FieldAbsent) is ever recovered locally,
/// by a [`wrap_optional`](crate::wrap_optional) wrapper reading its own field.
/// Everything else ends the current operation and leaves the target partially
/// populated.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScribeError {
    #[error("no binding is registered for type tag `{tag}`")]
    UnknownType { tag: String },

    #[error("runtime type `{type_name}` has no output binding for this archive")]
    UnknownRuntimeType { type_name: &'static str },

    #[error("size mismatch: expected {expected} elements, found {found}")]
    SizeMismatch { expected: usize, found: usize },

    #[error("malformed input: {reason}")]
    MalformedInput { reason: Cow<'static, str> },

    #[error("field `{name}` is absent")]
    FieldAbsent { name: String },

    #[error("type tagged `{tag}` cannot be stored as `{declared}`")]
    IncompatibleType { tag: String, declared: &'static str },

    #[error("value cannot be encoded: {reason}")]
    Unrepresentable { reason: Cow<'static, str> },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("input file does not exist: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("path is a directory: {}", path.display())]
    IsDirectory { path: PathBuf },

    #[error("file extension is not supported: {}", path.display())]
    UnsupportedExtension { path: PathBuf },
}

impl ScribeError {
    #[inline]
    pub fn malformed(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn unrepresentable(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Unrepresentable {
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`FieldAbsent`](ScribeError::FieldAbsent).
    #[inline]
    pub fn is_field_absent(&self) -> bool {
        matches!(self, Self::FieldAbsent { .. })
    }

    /// Returns `true` if a type tag or runtime type was missing from the registry.
    #[inline]
    pub fn is_unknown_type(&self) -> bool {
        matches!(
            self,
            Self::UnknownType { .. } | Self::UnknownRuntimeType { .. }
        )
    }
}

// -----------------------------------------------------------------------------
// Tests
