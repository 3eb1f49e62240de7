//! Logging initialization.
//!
//! Structured logging via the `tracing` ecosystem. Output always goes
//! to stderr; stdout is reserved for command output (config dumps,
//! paths).

use bannerize_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global subscriber from the `[logging]` config section.
///
/// CLI flags win over the config file, and `RUST_LOG` wins over both for
/// the filter. Must be called once, before any tracing output.
pub fn init_from_config(config: &Config, verbose: bool, json_logs: bool) {
    let level = if verbose {
        "debug"
    } else {
        match config.logging.level.as_str() {
            l @ ("error" | "warn" | "info" | "debug" | "trace") => l,
            _ => "info",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs || config.logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
