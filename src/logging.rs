use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SHELF_SYNC_LOG";

/// Install the stderr subscriber. Stdout is reserved for the command report.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
