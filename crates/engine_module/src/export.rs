//! The exported entry-point table.

/// Export the full module entry-point table from a `cdylib`.
///
/// `$init` must evaluate to `Result<ModuleContext, ModuleError>`. It runs
/// lazily on the first entry-point call; an error there means the module
/// cannot describe itself and the process aborts.
///
/// The macro also defines `pub fn module() -> &'static ModuleContext`, which
/// system functions use to reach the context.
///
/// ```rust,no_run
/// use engine_module::{GameModule, ModuleConfig, ModuleContext, ModuleError, SystemDescriptor};
///
/// struct Empty;
///
/// impl GameModule for Empty {
///     fn systems(&self) -> Result<Vec<SystemDescriptor>, ModuleError> {
///         Ok(Vec::new())
///     }
/// }
///
/// engine_module::export_module!(ModuleContext::new(ModuleConfig::new("empty"), Empty));
///
/// fn main() {}
/// ```
#[macro_export]
macro_rules! export_module {
    ($init:expr) => {
        static MODULE: ::std::sync::LazyLock<$crate::ModuleContext> =
            ::std::sync::LazyLock::new(|| match $init {
                Ok(ctx) => ctx,
                Err(err) => panic!("module context could not be built: {err}"),
            });

        /// The context behind this module's exported entry points.
        pub fn module() -> &'static $crate::ModuleContext {
            &MODULE
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn void_target_version() -> u32 {
            $crate::ffi::target_version(module())
        }

        /// # Safety
        ///
        /// `name` must be null or a valid NUL-terminated string.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn set_component_id(name: *const ::std::ffi::c_char, id: usize) {
            // SAFETY: forwarded from the host contract.
            unsafe { $crate::ffi::set_component_id(module(), name, id) }
        }

        /// # Safety
        ///
        /// `name` must be null or a valid NUL-terminated string.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn resource_init(name: *const ::std::ffi::c_char, value: i32) -> usize {
            // SAFETY: forwarded from the host contract.
            unsafe { $crate::ffi::resource_init(module(), name, value) }
        }

        /// # Safety
        ///
        /// `name` must be null or a valid NUL-terminated string.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn component_size(name: *const ::std::ffi::c_char) -> usize {
            // SAFETY: forwarded from the host contract.
            unsafe { $crate::ffi::component_size(module(), name) }
        }

        /// # Safety
        ///
        /// `name` must be null or a valid NUL-terminated string.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn component_align(name: *const ::std::ffi::c_char) -> usize {
            // SAFETY: forwarded from the host contract.
            unsafe { $crate::ffi::component_align(module(), name) }
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn component_string_id(index: usize) -> *const ::std::ffi::c_char {
            $crate::ffi::component_string_id(module(), index)
        }

        /// # Safety
        ///
        /// `name` must be null or a valid NUL-terminated string.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn component_type(name: *const ::std::ffi::c_char) -> i32 {
            // SAFETY: forwarded from the host contract.
            unsafe { $crate::ffi::component_type(module(), name) }
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn systems_len() -> usize {
            $crate::ffi::systems_len(module())
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn system_is_once(system: usize) -> bool {
            $crate::ffi::system_is_once(module(), system)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn system_fn(system: usize) -> Option<$crate::SystemFn> {
            $crate::ffi::system_fn(module(), system)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn system_args_len(system: usize) -> usize {
            $crate::ffi::system_args_len(module(), system)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn system_arg_type(system: usize, arg: usize) -> i32 {
            $crate::ffi::system_arg_type(module(), system, arg)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn system_arg_component(
            system: usize,
            arg: usize,
        ) -> $crate::ffi::FfiOption<usize> {
            $crate::ffi::system_arg_component(module(), system, arg)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn system_arg_event(system: usize, arg: usize) -> *const ::std::ffi::c_char {
            $crate::ffi::system_arg_event(module(), system, arg)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn system_query_args_len(system: usize, arg: usize) -> usize {
            $crate::ffi::system_query_args_len(module(), system, arg)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn system_query_arg_type(system: usize, arg: usize, query_arg: usize) -> i32 {
            $crate::ffi::system_query_arg_type(module(), system, arg, query_arg)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn system_query_arg_component(
            system: usize,
            arg: usize,
            query_arg: usize,
        ) -> $crate::ffi::FfiOption<usize> {
            $crate::ffi::system_query_arg_component(module(), system, arg, query_arg)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn set_callback_fn(kind: u32, callback: Option<$crate::HostFn>) {
            $crate::ffi::set_callback_fn(module(), kind, callback)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn module_last_error() -> i32 {
            $crate::ffi::last_error() as i32
        }
    };
}
