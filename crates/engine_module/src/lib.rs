//! # engine_module
//!
//! Module-side half of the native game-module protocol.
//!
//! A game module is a dynamic library the engine host loads at runtime. The
//! host owns the world; the module declares its systems and the data they
//! touch, and changes the world only through callbacks the host hands over.
//! This crate provides:
//!
//! - [`version`]: the packed ABI version the host checks first.
//! - [`identifier`]: names and the opaque ids the host assigns to them.
//! - [`catalog`]: system descriptors and the immutable system catalog.
//! - [`callback`]: the write-once table of host world operations.
//! - [`invoke`]: argument-pointer resolution and calls back into the host.
//! - [`context`]: [`ModuleContext`], which ties the above together.
//! - [`ffi`] and [`export_module!`]: the exported C entry points.
//! - [`payload`]: the byte codec for events and components.
//!
//! ## Startup order
//!
//! 1. `void_target_version`
//! 2. `set_component_id` for every known name
//! 3. catalog introspection (`systems_len`, `system_arg_type`, ...)
//! 4. `set_callback_fn` for all twelve callback kinds
//! 5. system functions, possibly from several threads at once
//!
//! Steps 3 and 4 may interleave; step 5 is refused until step 4 completes.

pub mod callback;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
mod export;
pub mod ffi;
pub mod identifier;
pub mod invoke;
pub mod lifecycle;
pub mod logging;
pub mod payload;
pub mod version;

pub use callback::{CallbackKind, CallbackTable, HostFn};
pub use catalog::{
    AccessSet, ArgType, ComponentAccess, Query, SystemArg, SystemCatalog, SystemDescriptor,
    SystemFn,
};
pub use config::ModuleConfig;
pub use context::{ComponentKind, ComponentSpec, GameModule, ModuleContext};
pub use error::{ErrorCode, ModuleError};
pub use identifier::{ComponentId, Identifier, IdentifierRegistry};
pub use invoke::{ArgumentArray, Handle, SystemCall};
pub use lifecycle::{Lifecycle, Phase};
pub use payload::Event;
pub use version::{ApiVersion, ENGINE_VERSION};
