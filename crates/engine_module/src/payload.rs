//! Payload codec for events and components crossing the boundary.
//!
//! Thin wrappers around `rmp-serde`. The bridge itself never looks inside
//! an encoded buffer; it forwards `(bytes, len)` to the host as-is.

use std::ffi::CStr;

use serde::{Deserialize, Serialize};

use crate::error::ModuleError;
use crate::identifier::Identifier;

/// A typed event that can be written to or read from a host event queue.
///
/// # Examples
///
/// ```rust
/// use std::ffi::CStr;
/// use serde::{Serialize, Deserialize};
/// use engine_module::Event;
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Explosion {
///     radius: f32,
/// }
///
/// impl Event for Explosion {
///     fn type_name() -> &'static CStr { c"Fx.Explosion" }
/// }
/// ```
pub trait Event: Send + Sync + 'static + Serialize + for<'de> Deserialize<'de> {
    /// The name the host knows this event type by.
    fn type_name() -> &'static CStr;

    /// The [`Identifier`] for this event type.
    fn identifier() -> Identifier {
        Identifier::from(Self::type_name())
    }
}

/// Encode a value to payload bytes.
///
/// # Errors
///
/// Returns [`ModuleError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ModuleError> {
    rmp_serde::to_vec(value).map_err(ModuleError::Encode)
}

/// Decode a value from payload bytes.
///
/// # Errors
///
/// Returns [`ModuleError::Decode`] if deserialisation fails.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, ModuleError> {
    rmp_serde::from_slice(bytes).map_err(ModuleError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Ping {
        seq: u32,
        label: String,
    }

    impl Event for Ping {
        fn type_name() -> &'static CStr {
            c"Test.Ping"
        }
    }

    #[test]
    fn test_encoded_event_decodes() {
        let ping = Ping {
            seq: 42,
            label: "hello".to_string(),
        };
        let bytes = encode(&ping).unwrap();
        assert!(!bytes.is_empty());
        let restored: Ping = decode(&bytes).unwrap();
        assert_eq!(ping, restored);
    }

    #[test]
    fn test_decode_invalid_bytes() {
        let result: Result<Ping, _> = decode(&[0xFF, 0xFF]);
        assert!(matches!(result, Err(ModuleError::Decode(_))));
    }

    #[test]
    fn test_event_identifier() {
        assert_eq!(Ping::identifier().as_c_str(), c"Test.Ping");
    }
}
