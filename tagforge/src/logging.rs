//! Diagnostics for template parsing and generation.
//!
//! Everything goes to stderr so stdout carries nothing but payloads, which
//! keeps `tagforge generate` safe to pipe into other tools.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset, by `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,tagforge=info",
        2 => "warn,tagforge=debug",
        _ => "warn,tagforge=trace",
    }
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` takes precedence over `verbosity`.
///
/// # Example
/// ```bash
/// RUST_LOG=tagforge::core=trace tagforge generate request.txt --config gen.toml
/// tagforge -vv inspect request.txt --config gen.toml
/// ```
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
