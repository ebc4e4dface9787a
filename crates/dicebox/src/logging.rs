//! Logging setup for the `dicebox-auth` binary.

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::DiceboxError;
use crate::config::LoggingSettings;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `settings.level`. Output is JSON when
/// `settings.json_format` is set, human-readable otherwise.
///
/// # Errors
/// Returns [`DiceboxError::Logging`] if a global subscriber is already set.
pub fn setup_logging(settings: &LoggingSettings) -> Result<(), DiceboxError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if settings.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(true),
            )
            .try_init()
    };
    result.map_err(|e| DiceboxError::Logging(e.to_string()))?;

    info!(level = %settings.level, json = settings.json_format, "logging initialized");
    Ok(())
}
