use tracing_subscriber::EnvFilter;

/// Initializes the global `tracing` subscriber, filtered by `LOG_LEVEL`.
/// `RUST_LOG` still wins if set, since `EnvFilter` composes from the
/// environment first and only falls back to `directive`.
pub fn init(log_level: &str) {
    let directive = match log_level {
        "error" => "error",
        "debug" => "debug",
        _ => "info",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
