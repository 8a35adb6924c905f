//! tracing subscriber setup

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "KEYWARD_LOG";

/// Installs a stderr subscriber filtered by `KEYWARD_LOG` (default `warn`).
/// Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
