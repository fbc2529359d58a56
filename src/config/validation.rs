#![allow(clippy::collapsible_if)]

use std::net::SocketAddr;

use crate::config::models::{CorsConfig, ServerConfig, UpstreamConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Server configuration validator
pub struct ServerConfigValidator;

impl ServerConfigValidator {
    /// Validate the entire server configuration
    pub fn validate(config: &ServerConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if let Err(mut upstream_errors) = Self::validate_upstream(&config.upstream) {
            errors.append(&mut upstream_errors);
        }

        if let Err(mut cors_errors) = Self::validate_cors(&config.cors) {
            errors.append(&mut cors_errors);
        }

        if let Some(path) = config.registry.override_path() {
            if !std::path::Path::new(path).is_file() {
                errors.push(ValidationError::InvalidField {
                    field: "registry.path".to_string(),
                    message: format!("Registry file '{path}' does not exist"),
                });
            }
        }

        if tracing_subscriber::EnvFilter::try_new(&config.logging.level).is_err() {
            errors.push(ValidationError::InvalidField {
                field: "logging.level".to_string(),
                message: format!("'{}' is not a valid log filter", config.logging.level),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_upstream(config: &UpstreamConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if config.origin.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "upstream.origin".to_string(),
            });
        } else if let Err(e) = Self::validate_origin(config.base_url(), "upstream.origin") {
            errors.push(e);
        }

        if config.user_agent.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "upstream.user_agent".to_string(),
            });
        } else if http::HeaderValue::from_str(&config.user_agent).is_err() {
            errors.push(ValidationError::InvalidField {
                field: "upstream.user_agent".to_string(),
                message: "Must be a valid header value".to_string(),
            });
        }

        if config.timeout_secs == 0 {
            errors.push(ValidationError::InvalidField {
                field: "upstream.timeout_secs".to_string(),
                message: "Timeout must be greater than 0".to_string(),
            });
        }

        if config.max_listing_bytes == 0 {
            errors.push(ValidationError::InvalidField {
                field: "upstream.max_listing_bytes".to_string(),
                message: "Limit must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn validate_cors(config: &CorsConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (i, origin) in config.allowed_origins.iter().enumerate() {
            let context = format!("cors.allowed_origins[{i}]");
            if origin == "*" {
                errors.push(ValidationError::InvalidField {
                    field: context,
                    message: "Wildcard origins cannot be combined with credentials".to_string(),
                });
                continue;
            }
            if origin.ends_with('/') {
                errors.push(ValidationError::InvalidField {
                    field: context,
                    message: format!(
                        "'{origin}' has a trailing slash; browsers send origins without one"
                    ),
                });
                continue;
            }
            if let Err(e) = Self::validate_origin(origin, &context) {
                errors.push(e);
            }
        }

        for (i, suffix) in config.allowed_origin_suffixes.iter().enumerate() {
            // A suffix without a leading dot would also match unrelated
            // registrable domains ("evilexample.com" for "example.com").
            if !suffix.starts_with('.') || suffix.len() < 2 {
                errors.push(ValidationError::InvalidField {
                    field: format!("cors.allowed_origin_suffixes[{i}]"),
                    message: format!("Suffix '{suffix}' must start with '.'"),
                });
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Validate that a string is a bare `scheme://host[:port]` origin.
    fn validate_origin(origin: &str, context: &str) -> ValidationResult<()> {
        match url::Url::parse(origin) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::InvalidField {
                        field: context.to_string(),
                        message: format!(
                            "URL scheme must be 'http' or 'https', got '{}'",
                            url.scheme()
                        ),
                    });
                }

                if url.host().is_none() {
                    return Err(ValidationError::InvalidField {
                        field: context.to_string(),
                        message: "URL must have a valid host".to_string(),
                    });
                }

                if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
                    return Err(ValidationError::InvalidField {
                        field: context.to_string(),
                        message: "Origin must not contain a path, query or fragment".to_string(),
                    });
                }

                Ok(())
            }
            Err(e) => Err(ValidationError::InvalidField {
                field: context.to_string(),
                message: format!("Invalid URL format: {e}"),
            }),
        }
    }

    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}
