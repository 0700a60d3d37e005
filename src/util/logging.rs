use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes tracing/logging. `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig, ansi: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false);

    if config.format.eq_ignore_ascii_case("json") {
        subscriber.json().init();
    } else {
        subscriber.with_ansi(ansi).init();
    }
}
