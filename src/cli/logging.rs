//! Logging setup shared by both binaries

use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber; `RUST_LOG` wins over `debug`
pub fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
