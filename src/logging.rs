use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber for binaries and tests.
///
/// Honours `RUST_LOG` when set; defaults to `info` for the crate and `warn`
/// for everything else. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,autovault=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
