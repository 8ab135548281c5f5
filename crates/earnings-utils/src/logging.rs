//! Logging and tracing utilities

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Initialize tracing with [`Config::default`]
pub fn init_tracing() -> Result<(), TryInitError> {
    init_tracing_from(&Config::default())
}

/// Initialize tracing from an application [`Config`].
///
/// Production environments log JSON lines; everything else uses the
/// human-readable format. Fails if a global subscriber is already set.
pub fn init_tracing_from(config: &Config) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init()
    }
}
