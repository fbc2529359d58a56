use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::ServerConfig;

/// Prefix of environment variables that override file settings,
/// e.g. `TAPROOM__UPSTREAM__TIMEOUT_SECS=10`.
pub const ENV_PREFIX: &str = "TAPROOM";

/// Load configuration from a file using the config crate, layered with
/// `TAPROOM__*` environment overrides.
/// Supports multiple formats: YAML, JSON, TOML, etc. A missing file is not an
/// error; the defaults plus environment apply.
pub async fn load_config(config_path: &str) -> Result<ServerConfig> {
    load_config_sync(config_path)
}

/// Load configuration synchronously
pub fn load_config_sync(config_path: &str) -> Result<ServerConfig> {
    load_config_with_env(config_path, default_environment())
}

/// The environment source used by [`load_config`].
pub fn default_environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("cors.allowed_origins")
        .with_list_parse_key("cors.allowed_origin_suffixes")
}

/// Load configuration with an explicit environment source.
pub fn load_config_with_env(config_path: &str, env: Environment) -> Result<ServerConfig> {
    let path = Path::new(config_path);

    if !path.exists() {
        tracing::warn!(
            "Configuration file {} not found, using defaults and environment",
            path.display()
        );
    }

    let settings = Config::builder()
        .add_source(
            File::new(
                path.to_str()
                    .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", path.display()))?,
                detect_format(path),
            )
            .required(false),
        )
        .add_source(env)
        .build()
        .with_context(|| format!("Failed to build config from {}", path.display()))?;

    let server_config: ServerConfig = settings
        .try_deserialize()
        .with_context(|| format!("Failed to deserialize config from {}", path.display()))?;

    Ok(server_config)
}

/// Determine file format based on extension
fn detect_format(path: &Path) -> FileFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Toml,
    }
}
