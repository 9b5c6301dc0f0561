//! Structured logging for a loaded module.
//!
//! The module lives inside someone else's process, so installation is
//! best-effort: if the host already set a global subscriber, that one wins.

use std::sync::Once;

use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, ParseError};

use crate::config::ModuleConfig;

static INIT: Once = Once::new();

/// Install a `fmt` subscriber filtered by `RUST_LOG` plus the configured
/// default directives. Only the first call has any effect.
pub fn init(config: &ModuleConfig) {
    INIT.call_once(|| {
        let (filter, rejected) =
            build_filter(EnvFilter::from_default_env(), &config.log_directive);
        // A host-installed subscriber makes this fail, which is fine.
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        for (directive, err) in rejected {
            warn!(module = %config.name, %directive, %err, "ignoring invalid log directive");
        }
    });
}

/// Add each comma-separated directive to `filter`, returning the ones that
/// did not parse.
fn build_filter(
    mut filter: EnvFilter,
    directives: &str,
) -> (EnvFilter, Vec<(String, ParseError)>) {
    let mut rejected = Vec::new();
    for part in directives.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<Directive>() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(err) => rejected.push((part.to_string(), err)),
        }
    }
    (filter, rejected)
}
