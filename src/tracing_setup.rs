use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig};

/// Build the filter: `RUST_LOG` wins over the configured level.
fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).wrap_err_with(|| format!("Invalid log level: {level}")),
    }
}

/// Initialize logging from the `[logging]` config section.
pub fn init_tracing_from_config(config: &LoggingConfig) -> Result<()> {
    init_tracing_with_config(&config.level, config.format == LogFormat::Json)
}

/// Initialize tracing with an explicit level and output format.
pub fn init_tracing_with_config(level: &str, json_format: bool) -> Result<()> {
    let filter = env_filter(level)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if json_format {
        Registry::default()
            .with(filter)
            .with(
                fmt_layer
                    .json()
                    .with_current_span(false)
                    .with_span_list(true),
            )
            .try_init()
            .wrap_err("Failed to install tracing subscriber")?;
    } else {
        Registry::default()
            .with(filter)
            .with(fmt_layer.pretty().with_ansi(true))
            .try_init()
            .wrap_err("Failed to install tracing subscriber")?;
    }

    tracing::info!(level, json = json_format, "Taproom logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        // SAFETY: test-local env mutation; no other test reads RUST_LOG.
        unsafe { std::env::remove_var("RUST_LOG") };
        let result = init_tracing_with_config("taproom=notalevel", true);
        assert!(result.is_err());
    }

    #[test]
    fn test_init_from_default_config() {
        let result = init_tracing_from_config(&LoggingConfig::default());
        // A subscriber may already be installed by another test in this binary.
        if let Err(e) = result {
            assert!(format!("{e}").contains("tracing subscriber"));
        }
    }
}
