//! Runtime path from a running system back into the host.
//!
//! When the host runs a system it passes the base address of an array of
//! opaque handles, one machine word per declared argument. [`ArgumentArray`]
//! is the only code that does address arithmetic on it; [`SystemCall`]
//! pairs it with the system's descriptor so every world operation is checked
//! against the declared argument kind before the host callback is used.

use std::ffi::c_void;
use std::marker::PhantomData;

use tracing::trace;

use crate::callback::{CallbackKind, CallbackTable};
use crate::catalog::{ArgType, SystemArg, SystemDescriptor};
use crate::error::ModuleError;
use crate::payload::{self, Event};

/// An opaque host handle for one system argument. Only valid during the
/// invocation it was resolved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle(*const c_void);

impl Handle {
    #[must_use]
    pub fn as_ptr(self) -> *const c_void {
        self.0
    }
}

/// Bounds-checked view over the host's argument-pointer array.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentArray<'a> {
    base: *const *const c_void,
    len: usize,
    _call: PhantomData<&'a [*const c_void]>,
}

impl<'a> ArgumentArray<'a> {
    /// Wrap the raw array the host passed to a system function.
    ///
    /// # Safety
    ///
    /// If `len > 0`, `base` must point to `len` consecutive, aligned,
    /// readable machine words that stay valid for `'a`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::NullPointer`] if `base` is null while `len > 0`.
    pub unsafe fn from_raw(base: *const c_void, len: usize) -> Result<Self, ModuleError> {
        if len > 0 && base.is_null() {
            return Err(ModuleError::NullPointer("argument array"));
        }
        Ok(Self {
            base: base.cast(),
            len,
            _call: PhantomData,
        })
    }

    /// View a slice of handles, e.g. one built by an in-process host.
    #[must_use]
    pub fn from_slice(words: &'a [*const c_void]) -> Self {
        Self {
            base: words.as_ptr(),
            len: words.len(),
            _call: PhantomData,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read the handle at `base + index * size_of::<usize>()`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::OutOfRange`] if `index >= len()`.
    pub fn handle(&self, index: usize) -> Result<Handle, ModuleError> {
        if index >= self.len {
            return Err(ModuleError::OutOfRange {
                what: "argument",
                index,
                len: self.len,
            });
        }
        // SAFETY: `index < len` and the constructor guarantees `len` readable words.
        let word = unsafe { self.base.add(index).read() };
        Ok(Handle(word))
    }
}

/// One running invocation of a system.
#[derive(Debug)]
pub struct SystemCall<'a> {
    system: usize,
    descriptor: &'a SystemDescriptor,
    callbacks: &'a CallbackTable,
    args: ArgumentArray<'a>,
}

impl<'a> SystemCall<'a> {
    /// Bind an argument array to the system it was passed to.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::OutOfRange`] if the array length differs from
    /// the declared argument count.
    pub fn new(
        system: usize,
        descriptor: &'a SystemDescriptor,
        callbacks: &'a CallbackTable,
        args: ArgumentArray<'a>,
    ) -> Result<Self, ModuleError> {
        let declared = descriptor.args().len();
        if args.len() != declared {
            return Err(ModuleError::OutOfRange {
                what: "argument array",
                index: args.len(),
                len: declared,
            });
        }
        Ok(Self {
            system,
            descriptor,
            callbacks,
            args,
        })
    }

    /// Index of the running system in the catalog.
    #[must_use]
    pub fn system(&self) -> usize {
        self.system
    }

    #[must_use]
    pub fn descriptor(&self) -> &SystemDescriptor {
        self.descriptor
    }

    /// Resolve the opaque handle for argument `arg`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::OutOfRange`] if `arg` is not a declared argument.
    pub fn handle(&self, arg: usize) -> Result<Handle, ModuleError> {
        self.descriptor.arg_at(arg)?;
        self.args.handle(arg)
    }

    /// Send an already-encoded event through an `EventWriter` argument.
    ///
    /// # Errors
    ///
    /// [`ModuleError::OutOfRange`], [`ModuleError::TypeMismatch`] if the
    /// argument is not an `EventWriter`, or [`ModuleError::NotReady`].
    pub fn send_event(&self, arg: usize, bytes: &[u8]) -> Result<usize, ModuleError> {
        self.expect_kind(arg, ArgType::EventWriter)?;
        self.forward(CallbackKind::EventSend, arg, bytes)
    }

    /// Encode `event` and send it through argument `arg`, which must be an
    /// `EventWriter` declared for `E`.
    pub fn send<E: Event>(&self, arg: usize, event: &E) -> Result<usize, ModuleError> {
        let declared = self.expect_kind(arg, ArgType::EventWriter)?;
        let expected = E::identifier();
        if declared.event() != Some(&expected) {
            return Err(ModuleError::TypeMismatch {
                expected: expected.display_name(),
                found: declared
                    .event()
                    .map_or_else(String::new, |id| id.display_name()),
            });
        }
        let bytes = payload::encode(event)?;
        self.send_event(arg, &bytes)
    }

    pub fn spawn(&self, arg: usize, payload: &[u8]) -> Result<usize, ModuleError> {
        self.descriptor.arg_at(arg)?;
        self.forward(CallbackKind::Spawn, arg, payload)
    }

    pub fn despawn(&self, arg: usize, payload: &[u8]) -> Result<usize, ModuleError> {
        self.descriptor.arg_at(arg)?;
        self.forward(CallbackKind::Despawn, arg, payload)
    }

    /// Number of pending events on an `EventReader` argument.
    pub fn event_count(&self, arg: usize) -> Result<usize, ModuleError> {
        self.expect_kind(arg, ArgType::EventReader)?;
        self.forward(CallbackKind::EventCount, arg, &[])
    }

    pub fn event_get(&self, arg: usize, index: usize) -> Result<usize, ModuleError> {
        self.expect_kind(arg, ArgType::EventReader)?;
        self.forward(CallbackKind::EventGet, arg, &index.to_le_bytes())
    }

    pub fn query_len(&self, arg: usize) -> Result<usize, ModuleError> {
        self.expect_kind(arg, ArgType::Query)?;
        self.forward(CallbackKind::QueryLen, arg, &[])
    }

    pub fn query_get(&self, arg: usize, index: usize) -> Result<usize, ModuleError> {
        self.expect_kind(arg, ArgType::Query)?;
        self.forward(CallbackKind::QueryGet, arg, &index.to_le_bytes())
    }

    pub fn query_get_mut(&self, arg: usize, index: usize) -> Result<usize, ModuleError> {
        self.expect_mutable_query(arg)?;
        self.forward(CallbackKind::QueryGetMut, arg, &index.to_le_bytes())
    }

    pub fn query_get_first(&self, arg: usize) -> Result<usize, ModuleError> {
        self.expect_kind(arg, ArgType::Query)?;
        self.forward(CallbackKind::QueryGetFirst, arg, &[])
    }

    pub fn query_get_first_mut(&self, arg: usize) -> Result<usize, ModuleError> {
        self.expect_mutable_query(arg)?;
        self.forward(CallbackKind::QueryGetFirstMut, arg, &[])
    }

    pub fn query_for_each(&self, arg: usize, payload: &[u8]) -> Result<usize, ModuleError> {
        self.expect_kind(arg, ArgType::Query)?;
        self.forward(CallbackKind::QueryForEach, arg, payload)
    }

    /// Like [`SystemCall::query_for_each`], but the host may fan the
    /// iteration out across worker threads.
    pub fn query_par_for_each(&self, arg: usize, payload: &[u8]) -> Result<usize, ModuleError> {
        self.expect_kind(arg, ArgType::Query)?;
        self.forward(CallbackKind::QueryParForEach, arg, payload)
    }

    fn expect_kind(&self, arg: usize, expected: ArgType) -> Result<&'a SystemArg, ModuleError> {
        let declared = self.descriptor.arg_at(arg)?;
        if declared.arg_type() == expected {
            Ok(declared)
        } else {
            Err(ModuleError::arg_mismatch(
                &format!("{expected:?}"),
                declared.arg_type(),
            ))
        }
    }

    fn expect_mutable_query(&self, arg: usize) -> Result<(), ModuleError> {
        match self.expect_kind(arg, ArgType::Query)? {
            SystemArg::Query(query) if query.has_mutable_access() => Ok(()),
            _ => Err(ModuleError::TypeMismatch {
                expected: "a query with mutable access".to_string(),
                found: "a read-only query".to_string(),
            }),
        }
    }

    fn forward(&self, kind: CallbackKind, arg: usize, payload: &[u8]) -> Result<usize, ModuleError> {
        let callback = self.callbacks.get(kind)?;
        let handle = self.args.handle(arg)?;
        trace!(
            system = self.system,
            arg,
            ?kind,
            len = payload.len(),
            "calling host"
        );
        // SAFETY: `callback` was registered by the host for `kind`; the handle
        // and payload are valid for the duration of this call.
        let result = unsafe { callback(handle.as_ptr(), payload.as_ptr(), payload.len()) };
        Ok(result)
    }
}
