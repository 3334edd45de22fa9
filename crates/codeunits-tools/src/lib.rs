// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Codeunits Tools
//!
//! Command-line front end for unit conversion against a dataset unit system.

use tracing_subscriber::{fmt, EnvFilter};

pub mod commands;

/// Initialize logging with a default filter.
///
/// Use `RUST_LOG` environment variable to override the default filter.
/// Default is `info` for codeunits crates and `warn` for others.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,codeunits=info,codeunits_tools=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
