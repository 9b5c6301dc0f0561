//! The module context: everything the host can observe or change.
//!
//! A [`ModuleContext`] owns the identifier registry, the system catalog, the
//! declared components, the callback table and the lifecycle. It is built
//! once from a [`GameModule`] and every entry point operates on it by
//! reference.

use std::alloc::Layout;
use std::ffi::c_void;
use std::fmt;

use tracing::{error, info};

use crate::callback::{CallbackKind, CallbackTable, HostFn};
use crate::catalog::{ArgType, SystemCatalog, SystemDescriptor, SystemFn};
use crate::config::ModuleConfig;
use crate::error::ModuleError;
use crate::identifier::{ComponentId, Identifier, IdentifierRegistry};
use crate::invoke::{ArgumentArray, SystemCall};
use crate::lifecycle::{Lifecycle, Phase};

/// Whether a declared data type is per-entity or a singleton.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Component = 0,
    Resource = 1,
}

/// A component or resource type the module asks the host to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    pub name: Identifier,
    pub layout: Layout,
    pub kind: ComponentKind,
}

impl ComponentSpec {
    /// Declare a per-entity component with the layout of `T`.
    #[must_use]
    pub fn component<T>(name: Identifier) -> Self {
        Self {
            name,
            layout: Layout::new::<T>(),
            kind: ComponentKind::Component,
        }
    }

    /// Declare a resource with the layout of `T`.
    #[must_use]
    pub fn resource<T>(name: Identifier) -> Self {
        Self {
            name,
            layout: Layout::new::<T>(),
            kind: ComponentKind::Resource,
        }
    }
}

/// The game-specific half of a module.
pub trait GameModule: Send + Sync + 'static {
    /// The module's systems, in catalog order. Called exactly once.
    fn systems(&self) -> Result<Vec<SystemDescriptor>, ModuleError>;

    /// Components and resources the host should lay out storage for.
    fn components(&self) -> Vec<ComponentSpec> {
        Vec::new()
    }

    /// Initialise a declared resource and return the host-visible handle.
    fn init_resource(&self, spec: &ComponentSpec, value: i32) -> Result<usize, ModuleError> {
        let _ = (spec, value);
        Ok(0)
    }
}

/// Module-side state shared by every entry point.
pub struct ModuleContext {
    config: ModuleConfig,
    game: Box<dyn GameModule>,
    registry: IdentifierRegistry,
    catalog: SystemCatalog,
    components: Vec<ComponentSpec>,
    callbacks: CallbackTable,
    lifecycle: Lifecycle,
}

impl fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext")
            .field("config", &self.config)
            .field("systems", &self.catalog.len())
            .field("components", &self.components.len())
            .field("phase", &self.lifecycle.phase())
            .finish_non_exhaustive()
    }
}

impl ModuleContext {
    /// Build the context and its system catalog.
    ///
    /// # Errors
    ///
    /// Returns the game module's error, or [`ModuleError::InvalidCatalog`]
    /// if the declared systems are inconsistent. The module cannot be used
    /// in either case.
    pub fn new(config: ModuleConfig, game: impl GameModule) -> Result<Self, ModuleError> {
        let catalog = SystemCatalog::new(game.systems()?)?;
        let components = game.components();
        info!(
            module = %config.name,
            systems = catalog.len(),
            components = components.len(),
            "module loaded"
        );
        Ok(Self {
            config,
            game: Box::new(game),
            registry: IdentifierRegistry::new(),
            catalog,
            components,
            callbacks: CallbackTable::new(),
            lifecycle: Lifecycle::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &SystemCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn registry(&self) -> &IdentifierRegistry {
        &self.registry
    }

    #[must_use]
    pub fn callbacks(&self) -> &CallbackTable {
        &self.callbacks
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    // ── Version ─────────────────────────────────────────────────────────────

    /// The packed engine version this module targets.
    pub fn target_version(&self) -> u32 {
        self.lifecycle.advance(Phase::VersionChecked);
        self.config.target_version.pack()
    }

    // ── Identifiers ─────────────────────────────────────────────────────────

    /// Record the host id for a component, resource or event name.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Conflict`] if `name` is already registered.
    pub fn set_component_id(&self, name: Identifier, id: ComponentId) -> Result<(), ModuleError> {
        self.lifecycle.advance(Phase::IdentifiersRegistering);
        info!(name = %name, id = id.0, "component id registered");
        self.registry.register(name, id)
    }

    // ── Components ──────────────────────────────────────────────────────────

    /// Look up a declared component or resource by name.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::NotFound`] if the module does not declare `name`.
    pub fn component(&self, name: &Identifier) -> Result<&ComponentSpec, ModuleError> {
        self.components
            .iter()
            .find(|spec| &spec.name == name)
            .ok_or_else(|| ModuleError::NotFound {
                name: name.display_name(),
            })
    }

    pub fn component_size(&self, name: &Identifier) -> Result<usize, ModuleError> {
        Ok(self.component(name)?.layout.size())
    }

    pub fn component_align(&self, name: &Identifier) -> Result<usize, ModuleError> {
        Ok(self.component(name)?.layout.align())
    }

    pub fn component_type(&self, name: &Identifier) -> Result<ComponentKind, ModuleError> {
        Ok(self.component(name)?.kind)
    }

    /// Name of the component declared at slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::OutOfRange`] if `index` is past the last slot.
    pub fn component_string_id(&self, index: usize) -> Result<&Identifier, ModuleError> {
        self.components
            .get(index)
            .map(|spec| &spec.name)
            .ok_or(ModuleError::OutOfRange {
                what: "component",
                index,
                len: self.components.len(),
            })
    }

    /// Initialise a declared resource.
    ///
    /// # Errors
    ///
    /// [`ModuleError::NotFound`] for undeclared names,
    /// [`ModuleError::TypeMismatch`] if `name` is a per-entity component.
    pub fn resource_init(&self, name: &Identifier, value: i32) -> Result<usize, ModuleError> {
        let spec = self.component(name)?;
        if spec.kind != ComponentKind::Resource {
            return Err(ModuleError::TypeMismatch {
                expected: "a resource".to_string(),
                found: format!("{:?}", spec.kind),
            });
        }
        let handle = self.game.init_resource(spec, value)?;
        info!(name = %name, value, handle, "resource initialised");
        Ok(handle)
    }

    // ── Introspection ───────────────────────────────────────────────────────

    pub fn systems_len(&self) -> usize {
        self.lifecycle.advance(Phase::CatalogBuilt);
        self.catalog.len()
    }

    pub fn system_is_once(&self, system: usize) -> Result<bool, ModuleError> {
        self.catalog.is_once(system)
    }

    pub fn system_fn(&self, system: usize) -> Result<SystemFn, ModuleError> {
        self.catalog.function(system)
    }

    pub fn system_args_len(&self, system: usize) -> Result<usize, ModuleError> {
        self.catalog.args_len(system)
    }

    pub fn system_arg_type(&self, system: usize, arg: usize) -> Result<ArgType, ModuleError> {
        self.catalog.arg_type(system, arg)
    }

    pub fn system_arg_event(&self, system: usize, arg: usize) -> Result<&Identifier, ModuleError> {
        self.catalog.arg_event(system, arg)
    }

    /// Host id of a direct component argument, or `None` while the host has
    /// not registered that component.
    pub fn system_arg_component(
        &self,
        system: usize,
        arg: usize,
    ) -> Result<Option<ComponentId>, ModuleError> {
        let name = self.catalog.arg_component(system, arg)?;
        Ok(self.registry.lookup(name).ok())
    }

    pub fn system_query_args_len(&self, system: usize, arg: usize) -> Result<usize, ModuleError> {
        self.catalog.query_args_len(system, arg)
    }

    pub fn system_query_arg_type(
        &self,
        system: usize,
        arg: usize,
        query_arg: usize,
    ) -> Result<ArgType, ModuleError> {
        self.catalog.query_arg_type(system, arg, query_arg)
    }

    pub fn system_query_arg_component(
        &self,
        system: usize,
        arg: usize,
        query_arg: usize,
    ) -> Result<Option<ComponentId>, ModuleError> {
        let access = self.catalog.query_arg(system, arg, query_arg)?;
        Ok(self.registry.lookup(&access.component).ok())
    }

    // ── Callbacks ───────────────────────────────────────────────────────────

    /// Store a host callback. The module becomes [`Phase::Ready`] once all
    /// twelve are present.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::CallbackConflict`] if `kind` already holds a
    /// different function.
    pub fn set_callback(&self, kind: CallbackKind, callback: HostFn) -> Result<(), ModuleError> {
        self.callbacks.register(kind, callback)?;
        self.lifecycle.advance(Phase::CallbacksRegistering);
        info!(
            ?kind,
            registered = self.callbacks.registered(),
            "callback registered"
        );
        if self.callbacks.is_complete() {
            self.lifecycle.advance(Phase::Ready);
        }
        Ok(())
    }

    // ── Invocation ──────────────────────────────────────────────────────────

    /// Run `body` as the invocation of catalog entry `system`.
    ///
    /// Returns `0` on success, or the [`ErrorCode`](crate::ErrorCode) of
    /// the failure, which is also logged.
    ///
    /// # Safety
    ///
    /// `args` must be the argument-pointer array the host passed to the
    /// system function: one readable machine word per declared argument,
    /// valid until this call returns.
    pub unsafe fn invoke<F>(&self, system: usize, args: *const c_void, body: F) -> usize
    where
        F: FnOnce(&SystemCall<'_>) -> Result<(), ModuleError>,
    {
        // SAFETY: forwarded from this function's contract.
        let result = unsafe { self.begin(system, args) }.and_then(|call| body(&call));
        match result {
            Ok(()) => 0,
            Err(err) => {
                error!(system, %err, "system failed");
                err.code() as usize
            }
        }
    }

    /// Bind an invocation without running anything.
    ///
    /// # Safety
    ///
    /// Same contract as [`ModuleContext::invoke`].
    ///
    /// # Errors
    ///
    /// [`ModuleError::ModuleNotReady`] before all callbacks are registered,
    /// [`ModuleError::OutOfRange`] for an unknown system,
    /// [`ModuleError::NullPointer`] for a null array.
    pub unsafe fn begin(
        &self,
        system: usize,
        args: *const c_void,
    ) -> Result<SystemCall<'_>, ModuleError> {
        if !self.lifecycle.is_ready() {
            return Err(ModuleError::ModuleNotReady(self.lifecycle.phase()));
        }
        let descriptor = self.catalog.get(system)?;
        // SAFETY: forwarded from this function's contract.
        let args = unsafe { ArgumentArray::from_raw(args, descriptor.args().len())? };
        SystemCall::new(system, descriptor, &self.callbacks, args)
    }
}
