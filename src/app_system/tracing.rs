use tracing_subscriber::EnvFilter;

/// Configure tracing once for the whole process.
///
/// `RUST_LOG` wins when set; otherwise `fallback_filter` (from
/// [`MarketConfig::log_filter`](crate::config::MarketConfig)) is used.
/// Later calls are no-ops.
///
/// ```bash
/// RUST_LOG=market_arbiter::arbitration=debug,info cargo run
/// ```
pub fn setup_tracing(fallback_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .compact()
        .try_init();
}
