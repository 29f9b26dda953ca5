//! Shared tracing setup for the command-line binaries.

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Crate logs at `info` unless `RUST_LOG` says otherwise.
pub const DEFAULT_DIRECTIVE: &str = "vk_history_export=info";

/// Filter built from `RUST_LOG` plus the crate default.
pub fn env_filter() -> crate::Result<EnvFilter> {
    let directive: Directive = DEFAULT_DIRECTIVE
        .parse()
        .map_err(|e| crate::Error::InvalidArgument(format!("bad log directive: {}", e)))?;
    Ok(EnvFilter::from_default_env().add_directive(directive))
}

/// Install the global fmt subscriber.
pub fn init() -> crate::Result<()> {
    tracing_subscriber::fmt().with_env_filter(env_filter()?).init();
    Ok(())
}
