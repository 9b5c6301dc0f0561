//! Module-side error types.
//!
//! Every failure the host can trigger through an entry point is a
//! [`ModuleError`]. At the C boundary each error collapses into a stable
//! [`ErrorCode`] the host reads back with `module_last_error`.

use crate::callback::CallbackKind;
use crate::catalog::ArgType;
use crate::lifecycle::Phase;

/// Errors that can occur while the host drives the module.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// An identifier was registered twice.
    #[error("identifier `{name}` is already registered")]
    Conflict { name: String },

    /// A callback slot was already filled with a different function.
    #[error("callback {0:?} is already registered")]
    CallbackConflict(CallbackKind),

    /// A system, argument, query argument or component slot index was out of bounds.
    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// A world operation was used before the host registered its callback.
    #[error("callback {0:?} has not been registered")]
    NotReady(CallbackKind),

    /// A system was invoked before the module reached [`Phase::Ready`].
    #[error("module is not ready for invocation (phase {0:?})")]
    ModuleNotReady(Phase),

    /// A raw enum value sent by the host is outside the known set.
    #[error("unknown {what} value {value}")]
    UnknownKind { what: &'static str, value: u32 },

    /// An operation was applied to an argument of the wrong kind.
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A name was not found in the registry or component table.
    #[error("`{name}` not found")]
    NotFound { name: String },

    /// The host passed a null pointer where a value was required.
    #[error("null pointer passed for {0}")]
    NullPointer(&'static str),

    /// The module built an inconsistent system catalog.
    #[error("invalid system catalog: system {system}: {reason}")]
    InvalidCatalog { system: usize, reason: String },

    /// An identifier contained an interior NUL byte.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] std::ffi::NulError),

    /// Failed to encode a payload.
    #[error("failed to encode payload: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a payload.
    #[error("failed to decode payload: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

impl ModuleError {
    /// Shorthand for an argument-kind mismatch.
    pub(crate) fn arg_mismatch(expected: &str, found: ArgType) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: format!("{found:?}"),
        }
    }

    /// The stable code reported to the host for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Conflict { .. } | Self::CallbackConflict(_) => ErrorCode::Conflict,
            Self::OutOfRange { .. } => ErrorCode::OutOfRange,
            Self::NotReady(_) | Self::ModuleNotReady(_) => ErrorCode::NotReady,
            Self::UnknownKind { .. } => ErrorCode::UnknownKind,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::NullPointer(_) => ErrorCode::NullPointer,
            Self::InvalidCatalog { .. } | Self::InvalidIdentifier(_) => ErrorCode::InvalidCatalog,
            Self::Encode(_) | Self::Decode(_) => ErrorCode::Codec,
        }
    }
}

/// Error codes visible across the C boundary. `Ok` means the last call
/// on this thread succeeded.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok = 0,
    Conflict = 1,
    OutOfRange = 2,
    NotReady = 3,
    UnknownKind = 4,
    TypeMismatch = 5,
    NotFound = 6,
    NullPointer = 7,
    InvalidCatalog = 8,
    Codec = 9,
}
