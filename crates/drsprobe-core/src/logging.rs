use tracing_subscriber::EnvFilter;

use crate::config::ProbeConfig;

pub const LOG_ENV: &str = "DRSPROBE_LOG";

/// Install a stderr fmt subscriber filtered by `DRSPROBE_LOG`, falling back
/// to `debug` or `info` depending on `config.debug`.
/// Returns false if a global subscriber was already set.
pub fn init_logging(config: &ProbeConfig) -> bool {
    let fallback = if config.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}
