use tracing_subscriber::EnvFilter;

/// Human readable lines on stdout; `RUST_LOG` overrides the default level.
pub fn init() {
    init_with_default("info");
}

fn init_with_default(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
