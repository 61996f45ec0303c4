//! Tracing setup for hosts that embed the engine.

/// Installs the global tracing subscriber. `RUST_LOG` overrides the
/// `info` default. Call once at startup; a second call is a no-op.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
