use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable that overrides every configured log filter.
pub const LOG_ENV: &str = "NULLDRV_LOG";

/// Initialize structured logging for the command-line tools.
/// Set NULLDRV_LOG=debug (or trace, info, warn, error) for verbosity control.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Initialize logging from inside the driver.
///
/// The driver is loaded into someone else's process: output goes to stderr,
/// `default_filter` is usually `"off"`, and a subscriber the host already
/// installed is left in place.
pub fn init_driver_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
