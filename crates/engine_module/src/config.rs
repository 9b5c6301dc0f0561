//! Module configuration.

use crate::version::{ApiVersion, ENGINE_VERSION};

/// Configuration for a game module.
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    /// Human-readable module name (e.g. `"draw_module"`).
    pub name: String,
    /// The engine version this module was built against.
    pub target_version: ApiVersion,
    /// Default `tracing` directives added on top of `RUST_LOG`,
    /// comma-separated.
    pub log_directive: String,
}

impl ModuleConfig {
    /// Create a config targeting [`ENGINE_VERSION`] that logs at `info` for
    /// the bridge and for the module's own target.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let log_directive = format!("engine_module=info,{name}=info");
        Self {
            name,
            target_version: ENGINE_VERSION,
            log_directive,
        }
    }

    /// Override the engine version reported to the host.
    #[must_use]
    pub fn with_target_version(mut self, version: ApiVersion) -> Self {
        self.target_version = version;
        self
    }

    /// Override the default log directive.
    #[must_use]
    pub fn with_log_directive(mut self, directive: impl Into<String>) -> Self {
        self.log_directive = directive.into();
        self
    }
}
