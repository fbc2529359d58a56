//! Configuration data structures for Taproom.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files and
//! to `TAPROOM__*` environment overrides. Every section carries defaults so an
//! empty configuration yields a working proxy in front of the public festival
//! data provider.
use serde::{Deserialize, Serialize};

/// Default public data provider for festival drink lists.
pub const DEFAULT_UPSTREAM_ORIGIN: &str = "https://data.cambridgebeerfestival.com";

/// Default upper bound on a single upstream request, in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Default cap on the size of an upstream directory index page.
pub const DEFAULT_MAX_LISTING_BYTES: usize = 4 * 1024 * 1024;

fn default_listen_addr() -> String {
    "0.0.0.0:8787".to_string()
}

fn default_user_agent() -> String {
    format!(
        "taproom/{} (festival data proxy)",
        env!("CARGO_PKG_VERSION")
    )
}

/// Where and how to reach the upstream data provider.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin of the data provider, e.g. `https://data.example.com`.
    pub origin: String,
    /// `User-Agent` sent on every upstream request.
    pub user_agent: String,
    /// Timeout applied to each upstream request.
    pub timeout_secs: u64,
    /// Maximum number of bytes read from a directory index page.
    pub max_listing_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_UPSTREAM_ORIGIN.to_string(),
            user_agent: default_user_agent(),
            timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            max_listing_bytes: DEFAULT_MAX_LISTING_BYTES,
        }
    }
}

impl UpstreamConfig {
    /// Origin with any trailing slash removed, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.origin.trim_end_matches('/')
    }
}

/// Cross-origin access policy.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins granted access by exact string comparison.
    pub allowed_origins: Vec<String>,
    /// Hostname suffixes (leading dot) granted access, for preview deployments.
    pub allowed_origin_suffixes: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "https://cambeerfestival.app".to_string(),
                "https://cambeerfestival.pages.dev".to_string(),
                "http://localhost:8080".to_string(),
                "http://localhost:5000".to_string(),
            ],
            allowed_origin_suffixes: vec![".cambeerfestival.pages.dev".to_string()],
        }
    }
}

/// Festival registry source.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Optional path to a registry JSON file. Empty means the embedded copy.
    pub path: Option<String>,
}

impl RegistryConfig {
    /// Configured override path, treating an empty string as unset.
    pub fn override_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.trim().is_empty())
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Create a new server configuration builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            upstream: UpstreamConfig::default(),
            cors: CorsConfig::default(),
            registry: RegistryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Builder for ServerConfig to allow for cleaner configuration creation
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    pub fn upstream_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.upstream.origin = origin.into();
        self
    }

    pub fn upstream_timeout_secs(mut self, secs: u64) -> Self {
        self.config.upstream.timeout_secs = secs;
        self
    }

    pub fn allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.cors.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    pub fn allowed_origin_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.cors.allowed_origin_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn registry_path(mut self, path: impl Into<String>) -> Self {
        self.config.registry.path = Some(path.into());
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
