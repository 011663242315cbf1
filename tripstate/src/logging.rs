//! Tracing setup for the `tripstate` binary.
//!
//! Library code only emits events (`warn!` for duplicate bindings and failed
//! renders, `debug!` for notification cycles and file I/O). Installing a
//! subscriber is left to the binary so embedders keep control of output.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for CLI logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format, so stdout stays machine-readable.
///
/// # Example
/// ```bash
/// RUST_LOG=tripstate=debug tripstate replay --script ops.json
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
