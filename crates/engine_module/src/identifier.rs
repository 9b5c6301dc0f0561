//! Stable names and the host-assigned ids they map to.
//!
//! Components, resources and events are named by an [`Identifier`], a
//! NUL-terminated string the module can hand to the host without copying.
//! The host answers with an opaque [`ComponentId`] per name, recorded in the
//! [`IdentifierRegistry`].

use std::ffi::{CStr, CString};
use std::fmt;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::ModuleError;

/// A stable string identifier for a component, resource or event type.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(CString);

impl Identifier {
    /// Create an identifier from a name.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::InvalidIdentifier`] if `name` contains a NUL byte.
    pub fn new(name: impl Into<Vec<u8>>) -> Result<Self, ModuleError> {
        Ok(Self(CString::new(name)?))
    }

    /// The identifier as a C string, valid for as long as `self` lives.
    #[must_use]
    pub fn as_c_str(&self) -> &CStr {
        &self.0
    }

    /// Lossy UTF-8 rendering for logs and error messages.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }
}

impl From<&CStr> for Identifier {
    fn from(name: &CStr) -> Self {
        Self(name.to_owned())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({:?})", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_string_lossy())
    }
}

/// An opaque, pointer-sized id assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub usize);

/// Write-once map from [`Identifier`] to [`ComponentId`].
///
/// Writers on the same key are serialized and readers never block each
/// other, so the host may register names lazily while systems run.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    ids: DashMap<Identifier, ComponentId>,
}

impl IdentifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: DashMap::new(),
        }
    }

    /// Record the host id for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Conflict`] if `name` is already registered. The
    /// existing mapping is left untouched.
    pub fn register(&self, name: Identifier, id: ComponentId) -> Result<(), ModuleError> {
        match self.ids.entry(name) {
            Entry::Occupied(existing) => Err(ModuleError::Conflict {
                name: existing.key().display_name(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }

    /// Resolve `name` to its host id.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::NotFound`] if the host never registered `name`.
    pub fn lookup(&self, name: &Identifier) -> Result<ComponentId, ModuleError> {
        self.ids
            .get(name)
            .map(|id| *id)
            .ok_or_else(|| ModuleError::NotFound {
                name: name.display_name(),
            })
    }

    /// Returns the number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Identifier {
        Identifier::new(name).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = IdentifierRegistry::new();
        registry.register(ident("Health"), ComponentId(4)).unwrap();
        registry.register(ident("Velocity"), ComponentId(9)).unwrap();
        assert_eq!(registry.lookup(&ident("Health")).unwrap(), ComponentId(4));
        assert_eq!(registry.lookup(&ident("Velocity")).unwrap(), ComponentId(9));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_registration_keeps_first_mapping() {
        let registry = IdentifierRegistry::new();
        registry.register(ident("Health"), ComponentId(1)).unwrap();
        let err = registry.register(ident("Health"), ComponentId(2)).unwrap_err();
        assert!(matches!(err, ModuleError::Conflict { ref name } if name == "Health"));
        assert_eq!(registry.lookup(&ident("Health")).unwrap(), ComponentId(1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_missing_name() {
        let registry = IdentifierRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.lookup(&ident("Missing")),
            Err(ModuleError::NotFound { .. })
        ));
    }

    #[test]
    fn test_identifier_rejects_interior_nul() {
        assert!(matches!(
            Identifier::new("bad\0name"),
            Err(ModuleError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_identifier_from_c_str() {
        let id = Identifier::from(c"Graphics.DrawCircle");
        assert_eq!(id.as_c_str(), c"Graphics.DrawCircle");
        assert_eq!(id.to_string(), "Graphics.DrawCircle");
    }

    #[test]
    fn test_concurrent_registration_of_distinct_names() {
        let registry = IdentifierRegistry::new();
        std::thread::scope(|s| {
            for t in 0..4 {
                let registry = &registry;
                s.spawn(move || {
                    for i in 0..16 {
                        let name = ident(&format!("c{t}_{i}"));
                        registry.register(name, ComponentId(t * 16 + i)).unwrap();
                    }
                });
            }
        });
        assert_eq!(registry.len(), 64);
        assert_eq!(registry.lookup(&ident("c3_15")).unwrap(), ComponentId(63));
    }
}
