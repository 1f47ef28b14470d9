use heydav_core::{Error, LoggingConfig, Result};
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt as _, registry, util::SubscriberInitExt as _,
};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter.
///
/// # Errors
/// Returns an error if the filter is invalid or a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|error| Error::Config(format!("Invalid log filter: {error}")))?,
    };

    registry()
        .with(filter)
        .with(fmt::layer().with_ansi(config.ansi))
        .try_init()
        .map_err(|error| Error::Config(format!("Tracing already initialized: {error}")))
}
