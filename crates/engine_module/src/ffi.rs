//! C-ABI adapter over [`ModuleContext`].
//!
//! Each function here backs one exported entry point (see
//! [`export_module!`](crate::export_module)). Raw host input is converted
//! into typed values at the top of each function. Failures become a
//! sentinel return value plus an [`ErrorCode`] recorded for the calling
//! thread, which the host reads with `module_last_error`.

use std::cell::Cell;
use std::ffi::{CStr, c_char};
use std::ptr;

use tracing::{debug, warn};

use crate::callback::{CallbackKind, HostFn};
use crate::catalog::SystemFn;
use crate::context::ModuleContext;
use crate::error::{ErrorCode, ModuleError};
use crate::identifier::{ComponentId, Identifier};
use crate::logging;

thread_local! {
    static LAST_ERROR: Cell<ErrorCode> = const { Cell::new(ErrorCode::Ok) };
}

/// An optional value with a C-compatible layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfiOption<T> {
    pub is_some: bool,
    pub value: T,
}

impl<T: Default> From<Option<T>> for FfiOption<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self {
                is_some: true,
                value,
            },
            None => Self {
                is_some: false,
                value: T::default(),
            },
        }
    }
}

/// Code of the last failed call on this thread, or `Ok`.
#[must_use]
pub fn last_error() -> ErrorCode {
    LAST_ERROR.with(Cell::get)
}

/// Record the outcome of an entry point and turn failures into `fallback`.
fn finish<T>(entry: &'static str, result: Result<T, ModuleError>, fallback: T) -> T {
    match result {
        Ok(value) => {
            LAST_ERROR.with(|e| e.set(ErrorCode::Ok));
            value
        }
        Err(err) => {
            warn!(entry, %err, "entry point failed");
            LAST_ERROR.with(|e| e.set(err.code()));
            fallback
        }
    }
}

/// Borrow a host string as an [`Identifier`].
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
unsafe fn identifier(name: *const c_char) -> Result<Identifier, ModuleError> {
    if name.is_null() {
        return Err(ModuleError::NullPointer("string id"));
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    Ok(Identifier::from(unsafe { CStr::from_ptr(name) }))
}

// ── Version ─────────────────────────────────────────────────────────────────

/// `void_target_version`. Also installs logging, since it is the first
/// call the host makes.
pub fn target_version(ctx: &ModuleContext) -> u32 {
    logging::init(ctx.config());
    let version = ctx.target_version();
    debug!(module = %ctx.config().name, version, "target version requested");
    version
}

// ── Identifiers and components ──────────────────────────────────────────────

/// `set_component_id`.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
pub unsafe fn set_component_id(ctx: &ModuleContext, name: *const c_char, id: usize) {
    // SAFETY: forwarded from this function's contract.
    let result = unsafe { identifier(name) }
        .and_then(|name| ctx.set_component_id(name, ComponentId(id)));
    finish("set_component_id", result, ());
}

/// `resource_init`.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
pub unsafe fn resource_init(ctx: &ModuleContext, name: *const c_char, value: i32) -> usize {
    // SAFETY: forwarded from this function's contract.
    let result = unsafe { identifier(name) }.and_then(|name| ctx.resource_init(&name, value));
    finish("resource_init", result, 0)
}

/// `component_size`.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
pub unsafe fn component_size(ctx: &ModuleContext, name: *const c_char) -> usize {
    // SAFETY: forwarded from this function's contract.
    let result = unsafe { identifier(name) }.and_then(|name| ctx.component_size(&name));
    debug!(?result, "component size requested");
    finish("component_size", result, 0)
}

/// `component_align`.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
pub unsafe fn component_align(ctx: &ModuleContext, name: *const c_char) -> usize {
    // SAFETY: forwarded from this function's contract.
    let result = unsafe { identifier(name) }.and_then(|name| ctx.component_align(&name));
    debug!(?result, "component align requested");
    finish("component_align", result, 1)
}

/// `component_type`. Returns the [`ComponentKind`](crate::ComponentKind)
/// discriminant, or `-1`.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
pub unsafe fn component_type(ctx: &ModuleContext, name: *const c_char) -> i32 {
    // SAFETY: forwarded from this function's contract.
    let result = unsafe { identifier(name) }
        .and_then(|name| ctx.component_type(&name))
        .map(|kind| kind as i32);
    finish("component_type", result, -1)
}

/// `component_string_id`. The returned string lives as long as the module.
pub fn component_string_id(ctx: &ModuleContext, index: usize) -> *const c_char {
    let result = ctx
        .component_string_id(index)
        .map(|name| name.as_c_str().as_ptr());
    finish("component_string_id", result, ptr::null())
}

// ── Introspection ───────────────────────────────────────────────────────────

/// `systems_len`.
pub fn systems_len(ctx: &ModuleContext) -> usize {
    let len = ctx.systems_len();
    debug!(len, "systems_len");
    LAST_ERROR.with(|e| e.set(ErrorCode::Ok));
    len
}

/// `system_is_once`.
pub fn system_is_once(ctx: &ModuleContext, system: usize) -> bool {
    let result = ctx.system_is_once(system);
    debug!(system, ?result, "system_is_once");
    finish("system_is_once", result, false)
}

/// `system_fn`.
pub fn system_fn(ctx: &ModuleContext, system: usize) -> Option<SystemFn> {
    let result = ctx.system_fn(system).map(Some);
    debug!(system, ok = result.is_ok(), "system_fn");
    finish("system_fn", result, None)
}

/// `system_args_len`.
pub fn system_args_len(ctx: &ModuleContext, system: usize) -> usize {
    let result = ctx.system_args_len(system);
    debug!(system, ?result, "system_args_len");
    finish("system_args_len", result, 0)
}

/// `system_arg_type`. Returns the [`ArgType`](crate::ArgType)
/// discriminant, or `-1`.
pub fn system_arg_type(ctx: &ModuleContext, system: usize, arg: usize) -> i32 {
    let result = ctx.system_arg_type(system, arg);
    debug!(system, arg, ?result, "system_arg_type");
    finish("system_arg_type", result.map(|ty| ty as i32), -1)
}

/// `system_arg_component`.
pub fn system_arg_component(ctx: &ModuleContext, system: usize, arg: usize) -> FfiOption<usize> {
    let result = ctx.system_arg_component(system, arg);
    debug!(system, arg, ?result, "system_arg_component");
    let result = result.map(|id| FfiOption::from(id.map(|id| id.0)));
    finish("system_arg_component", result, FfiOption::from(None))
}

/// `system_arg_event`. The returned string lives as long as the module.
pub fn system_arg_event(ctx: &ModuleContext, system: usize, arg: usize) -> *const c_char {
    let result = ctx.system_arg_event(system, arg);
    debug!(system, arg, ?result, "system_arg_event");
    let result = result.map(|id| id.as_c_str().as_ptr());
    finish("system_arg_event", result, ptr::null())
}

/// `system_query_args_len`.
pub fn system_query_args_len(ctx: &ModuleContext, system: usize, arg: usize) -> usize {
    let result = ctx.system_query_args_len(system, arg);
    debug!(system, arg, ?result, "system_query_args_len");
    finish("system_query_args_len", result, 0)
}

/// `system_query_arg_type`. Returns the [`ArgType`](crate::ArgType)
/// discriminant, or `-1`.
pub fn system_query_arg_type(
    ctx: &ModuleContext,
    system: usize,
    arg: usize,
    query_arg: usize,
) -> i32 {
    let result = ctx.system_query_arg_type(system, arg, query_arg);
    debug!(system, arg, query_arg, ?result, "system_query_arg_type");
    finish("system_query_arg_type", result.map(|ty| ty as i32), -1)
}

/// `system_query_arg_component`.
pub fn system_query_arg_component(
    ctx: &ModuleContext,
    system: usize,
    arg: usize,
    query_arg: usize,
) -> FfiOption<usize> {
    let result = ctx.system_query_arg_component(system, arg, query_arg);
    debug!(system, arg, query_arg, ?result, "system_query_arg_component");
    let result = result.map(|id| FfiOption::from(id.map(|id| id.0)));
    finish("system_query_arg_component", result, FfiOption::from(None))
}

// ── Callbacks ───────────────────────────────────────────────────────────────

/// `set_callback_fn`.
pub fn set_callback_fn(ctx: &ModuleContext, kind: u32, callback: Option<HostFn>) {
    let result = CallbackKind::try_from(kind).and_then(|kind| {
        let callback = callback.ok_or(ModuleError::NullPointer("callback function"))?;
        ctx.set_callback(kind, callback)
    });
    finish("set_callback_fn", result, ());
}

#[cfg(test)]
mod tests {
    use std::ffi::c_void;

    use super::*;
    use crate::catalog::{ArgType, Query, SystemDescriptor};
    use crate::config::ModuleConfig;
    use crate::context::{ComponentSpec, GameModule};

    unsafe extern "C" fn noop_system(_args: *const c_void) -> usize {
        0
    }

    unsafe extern "C" fn host(_handle: *const c_void, _data: *const u8, _len: usize) -> usize {
        0
    }

    struct Game;

    impl GameModule for Game {
        fn systems(&self) -> Result<Vec<SystemDescriptor>, ModuleError> {
            Ok(vec![
                SystemDescriptor::new(noop_system)
                    .read(Identifier::from(c"Health"))
                    .event_writer(Identifier::from(c"Fx.Spark"))
                    .query(Query::new().write(Identifier::from(c"Health2"))),
            ])
        }

        fn components(&self) -> Vec<ComponentSpec> {
            vec![ComponentSpec::component::<[u16; 3]>(Identifier::from(c"Health"))]
        }
    }

    fn context() -> ModuleContext {
        ModuleContext::new(ModuleConfig::new("ffi_test"), Game).unwrap()
    }

    #[test]
    fn test_version_entry() {
        let ctx = context();
        assert_eq!(target_version(&ctx), 3);
    }

    #[test]
    fn test_errors_are_recorded_and_cleared() {
        let ctx = context();
        assert!(!system_is_once(&ctx, 5));
        assert_eq!(last_error(), ErrorCode::OutOfRange);
        assert!(!system_is_once(&ctx, 0));
        assert_eq!(last_error(), ErrorCode::Ok);
    }

    #[test]
    fn test_introspection_entries() {
        let ctx = context();
        assert_eq!(systems_len(&ctx), 1);
        assert_eq!(system_args_len(&ctx, 0), 3);
        assert_eq!(system_arg_type(&ctx, 0, 1), ArgType::EventWriter as i32);
        assert_eq!(system_arg_type(&ctx, 0, 3), -1);
        assert_eq!(last_error(), ErrorCode::OutOfRange);

        let event = system_arg_event(&ctx, 0, 1);
        // SAFETY: the pointer refers to a catalog-owned string.
        assert_eq!(unsafe { CStr::from_ptr(event) }, c"Fx.Spark");
        assert!(system_arg_event(&ctx, 0, 0).is_null());
        assert_eq!(last_error(), ErrorCode::TypeMismatch);

        assert_eq!(system_query_args_len(&ctx, 0, 2), 1);
        assert_eq!(
            system_query_arg_type(&ctx, 0, 2, 0),
            ArgType::DataAccessMut as i32
        );
        assert!(system_fn(&ctx, 0).is_some());
        assert!(system_fn(&ctx, 1).is_none());
    }

    #[test]
    fn test_component_entries() {
        let ctx = context();
        let absent = system_arg_component(&ctx, 0, 0);
        assert!(!absent.is_some);
        assert_eq!(last_error(), ErrorCode::Ok);

        // SAFETY: C string literals are NUL-terminated.
        unsafe { set_component_id(&ctx, c"Health".as_ptr(), 11) };
        assert_eq!(
            system_arg_component(&ctx, 0, 0),
            FfiOption {
                is_some: true,
                value: 11
            }
        );
        // SAFETY: as above.
        unsafe { set_component_id(&ctx, c"Health".as_ptr(), 12) };
        assert_eq!(last_error(), ErrorCode::Conflict);

        // SAFETY: as above.
        unsafe {
            assert_eq!(component_size(&ctx, c"Health".as_ptr()), 6);
            assert_eq!(component_align(&ctx, c"Health".as_ptr()), 2);
            assert_eq!(component_type(&ctx, c"Health".as_ptr()), 0);
            assert_eq!(component_size(&ctx, c"Mana".as_ptr()), 0);
            assert_eq!(last_error(), ErrorCode::NotFound);
            assert_eq!(resource_init(&ctx, c"Health".as_ptr(), 3), 0);
            assert_eq!(last_error(), ErrorCode::TypeMismatch);
            assert_eq!(component_size(&ctx, ptr::null()), 0);
            assert_eq!(last_error(), ErrorCode::NullPointer);
        }
        let name = component_string_id(&ctx, 0);
        // SAFETY: the pointer refers to a module-owned string.
        assert_eq!(unsafe { CStr::from_ptr(name) }, c"Health");
        assert!(component_string_id(&ctx, 1).is_null());
    }

    #[test]
    fn test_callback_entry_rejects_bad_input() {
        let ctx = context();
        set_callback_fn(&ctx, 99, Some(host));
        assert_eq!(last_error(), ErrorCode::UnknownKind);
        set_callback_fn(&ctx, CallbackKind::Spawn as u32, None);
        assert_eq!(last_error(), ErrorCode::NullPointer);
        assert_eq!(ctx.callbacks().registered(), 0);

        set_callback_fn(&ctx, CallbackKind::Spawn as u32, Some(host));
        assert_eq!(last_error(), ErrorCode::Ok);
        assert!(ctx.callbacks().is_registered(CallbackKind::Spawn));
    }
}
