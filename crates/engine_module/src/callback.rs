//! Host-supplied world operations.
//!
//! The module cannot touch the world itself. During startup the host hands
//! over one function pointer per [`CallbackKind`]; each slot is filled at
//! most once and read without locking afterwards.

use std::ffi::c_void;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ModuleError;

/// Signature shared by every host callback: an opaque handle resolved from
/// the argument-pointer array, plus a payload buffer. The result is passed
/// back to the system untouched.
pub type HostFn = unsafe extern "C" fn(handle: *const c_void, data: *const u8, len: usize) -> usize;

/// The world operations a host provides, in ABI order.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    Spawn = 0,
    Despawn = 1,
    EventCount = 2,
    EventGet = 3,
    EventSend = 4,
    QueryLen = 5,
    QueryGet = 6,
    QueryGetMut = 7,
    QueryGetFirst = 8,
    QueryGetFirstMut = 9,
    QueryForEach = 10,
    QueryParForEach = 11,
}

impl CallbackKind {
    /// Number of callback kinds.
    pub const COUNT: usize = 12;

    /// All kinds in ABI order.
    pub const ALL: [CallbackKind; Self::COUNT] = [
        Self::Spawn,
        Self::Despawn,
        Self::EventCount,
        Self::EventGet,
        Self::EventSend,
        Self::QueryLen,
        Self::QueryGet,
        Self::QueryGetMut,
        Self::QueryGetFirst,
        Self::QueryGetFirstMut,
        Self::QueryForEach,
        Self::QueryParForEach,
    ];
}

impl TryFrom<u32> for CallbackKind {
    type Error = ModuleError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(ModuleError::UnknownKind {
                what: "callback kind",
                value,
            })
    }
}

/// Write-once table of host callbacks.
///
/// `filled` counts first-time registrations; the registration that fills
/// the last slot always observes the full count.
#[derive(Debug, Default)]
pub struct CallbackTable {
    slots: [OnceLock<HostFn>; CallbackKind::COUNT],
    filled: AtomicUsize,
}

impl CallbackTable {
    /// Create a table with every slot unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `callback` under `kind`.
    ///
    /// Registering the same function again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::CallbackConflict`] if the slot already holds a
    /// different function.
    pub fn register(&self, kind: CallbackKind, callback: HostFn) -> Result<(), ModuleError> {
        let mut inserted = false;
        let stored = self.slots[kind as usize].get_or_init(|| {
            inserted = true;
            callback
        });
        if inserted {
            self.filled.fetch_add(1, Ordering::AcqRel);
            return Ok(());
        }
        if *stored as usize == callback as usize {
            Ok(())
        } else {
            Err(ModuleError::CallbackConflict(kind))
        }
    }

    /// Fetch the callback for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::NotReady`] if the host has not registered it.
    pub fn get(&self, kind: CallbackKind) -> Result<HostFn, ModuleError> {
        self.slots[kind as usize]
            .get()
            .copied()
            .ok_or(ModuleError::NotReady(kind))
    }

    /// Returns `true` if `kind` has been registered.
    #[must_use]
    pub fn is_registered(&self, kind: CallbackKind) -> bool {
        self.slots[kind as usize].get().is_some()
    }

    /// Returns `true` once all twelve callbacks are registered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.registered() == CallbackKind::COUNT
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn registered(&self) -> usize {
        self.filled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn host_a(_handle: *const c_void, _data: *const u8, len: usize) -> usize {
        len
    }

    unsafe extern "C" fn host_b(_handle: *const c_void, _data: *const u8, _len: usize) -> usize {
        7
    }

    #[test]
    fn test_kind_from_raw() {
        assert_eq!(CallbackKind::try_from(0).unwrap(), CallbackKind::Spawn);
        assert_eq!(CallbackKind::try_from(4).unwrap(), CallbackKind::EventSend);
        assert_eq!(CallbackKind::try_from(11).unwrap(), CallbackKind::QueryParForEach);
        for (i, kind) in CallbackKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        assert!(matches!(
            CallbackKind::try_from(12),
            Err(ModuleError::UnknownKind { value: 12, .. })
        ));
        assert!(CallbackKind::try_from(u32::MAX).is_err());
    }

    #[test]
    fn test_unset_slot_is_not_ready() {
        let table = CallbackTable::new();
        assert!(matches!(
            table.get(CallbackKind::EventSend),
            Err(ModuleError::NotReady(CallbackKind::EventSend))
        ));
        assert_eq!(table.registered(), 0);
    }

    #[test]
    fn test_register_then_get() {
        let table = CallbackTable::new();
        table.register(CallbackKind::EventSend, host_a).unwrap();
        let f = table.get(CallbackKind::EventSend).unwrap();
        assert_eq!(f as usize, host_a as HostFn as usize);
        assert!(table.is_registered(CallbackKind::EventSend));
        assert!(!table.is_registered(CallbackKind::Spawn));
    }

    #[test]
    fn test_slots_are_write_once() {
        let table = CallbackTable::new();
        table.register(CallbackKind::Spawn, host_a).unwrap();
        table.register(CallbackKind::Spawn, host_a).unwrap();
        assert!(matches!(
            table.register(CallbackKind::Spawn, host_b),
            Err(ModuleError::CallbackConflict(CallbackKind::Spawn))
        ));
        assert_eq!(
            table.get(CallbackKind::Spawn).unwrap() as usize,
            host_a as HostFn as usize
        );
    }

    #[test]
    fn test_complete_after_all_kinds() {
        let table = CallbackTable::new();
        for kind in CallbackKind::ALL {
            assert!(!table.is_complete());
            table.register(kind, host_a).unwrap();
        }
        assert!(table.is_complete());
        assert_eq!(table.registered(), CallbackKind::COUNT);
    }

    #[test]
    fn test_concurrent_registration_completes() {
        for _ in 0..20 {
            let table = CallbackTable::new();
            std::thread::scope(|scope| {
                for kind in CallbackKind::ALL {
                    let table = &table;
                    scope.spawn(move || {
                        table.register(kind, host_a).unwrap();
                        table.register(kind, host_a).unwrap();
                    });
                }
            });
            assert_eq!(table.registered(), CallbackKind::COUNT);
            assert!(table.is_complete());
        }
    }
}
