//! Packed API versions.
//!
//! The host checks the module's target version before calling anything else.
//! Both sides pack `(major, minor, patch)` into a `u32` with the same layout:
//!
//! ```text
//! | major: 7 bits | minor: 10 bits | patch: 15 bits |
//!   31        25    24          15   14           0
//! ```

use std::fmt;

/// A semantic version in the engine's packed ABI format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// The engine version this crate speaks.
pub const ENGINE_VERSION: ApiVersion = ApiVersion::new(0, 0, 3);

impl ApiVersion {
    const MAJOR_SHIFT: u32 = 25;
    const MINOR_SHIFT: u32 = 15;
    const MAJOR_MASK: u32 = 0x7f;
    const MINOR_MASK: u32 = 0x3ff;
    const PATCH_MASK: u32 = 0x7fff;

    /// Create a version. Fields wider than their packed width are masked.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major: major & Self::MAJOR_MASK,
            minor: minor & Self::MINOR_MASK,
            patch: patch & Self::PATCH_MASK,
        }
    }

    /// Pack into `(major << 25) | (minor << 15) | patch`.
    #[must_use]
    pub const fn pack(self) -> u32 {
        (self.major << Self::MAJOR_SHIFT) | (self.minor << Self::MINOR_SHIFT) | self.patch
    }

    /// Inverse of [`ApiVersion::pack`].
    #[must_use]
    pub const fn unpack(packed: u32) -> Self {
        Self {
            major: (packed >> Self::MAJOR_SHIFT) & Self::MAJOR_MASK,
            minor: (packed >> Self::MINOR_SHIFT) & Self::MINOR_MASK,
            patch: packed & Self::PATCH_MASK,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version_packs_to_three() {
        assert_eq!(ENGINE_VERSION.pack(), 3);
        assert_eq!(ApiVersion::new(0, 0, 3).pack(), (0 << 25) | (0 << 15) | 3);
    }

    #[test]
    fn test_pack_layout() {
        assert_eq!(ApiVersion::new(1, 0, 0).pack(), 1 << 25);
        assert_eq!(ApiVersion::new(0, 1, 0).pack(), 1 << 15);
        assert_eq!(ApiVersion::new(2, 5, 9).pack(), (2 << 25) | (5 << 15) | 9);
    }

    #[test]
    fn test_unpack_inverts_pack_at_field_limits() {
        for v in [
            ApiVersion::new(0, 0, 0),
            ApiVersion::new(127, 1023, 32767),
            ApiVersion::new(1, 2, 3),
            ApiVersion::new(64, 512, 16384),
        ] {
            assert_eq!(ApiVersion::unpack(v.pack()), v);
        }
    }

    #[test]
    fn test_oversized_fields_are_masked() {
        let v = ApiVersion::new(128, 0, 0);
        assert_eq!(v.major, 0);
        assert_eq!(v.pack(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(ENGINE_VERSION.to_string(), "0.0.3");
    }
}
