//! Cross-origin access policy.
//!
//! A request's `Origin` is granted access when it matches one of the exact
//! allow-listed origins, or when its hostname ends with one of the trusted
//! platform suffixes used for preview deployments. A granted origin is echoed
//! back verbatim together with `Access-Control-Allow-Credentials: true`; a
//! wildcard is never emitted. Anything else gets no CORS headers at all.
//!
//! The policy is pure: it depends only on the `Origin` value and the
//! configuration it was built from, never on path or method.
use http::{
    HeaderMap, HeaderValue,
    header::{
        ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
        ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
    },
};

use crate::config::CorsConfig;

pub const PREFLIGHT_ALLOW_METHODS: &str = "GET, OPTIONS";
pub const PREFLIGHT_ALLOW_HEADERS: &str = "Content-Type";
pub const PREFLIGHT_MAX_AGE_SECS: &str = "86400";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
    allowed_suffixes: Vec<String>,
}

impl CorsPolicy {
    pub fn new<O, S>(allowed_origins: O, allowed_suffixes: S) -> Self
    where
        O: IntoIterator,
        O::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            allowed_origins: allowed_origins.into_iter().map(Into::into).collect(),
            allowed_suffixes: allowed_suffixes
                .into_iter()
                .map(|s| s.into().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &CorsConfig) -> Self {
        Self::new(
            config.allowed_origins.iter().cloned(),
            config.allowed_origin_suffixes.iter().cloned(),
        )
    }

    /// Whether `origin` is granted cross-origin access.
    pub fn is_allowed(&self, origin: &str) -> bool {
        if self.allowed_origins.iter().any(|o| o == origin) {
            return true;
        }
        if self.allowed_suffixes.is_empty() {
            return false;
        }

        match url::Url::parse(origin) {
            Ok(url) => {
                if url.scheme() != "https" && url.scheme() != "http" {
                    return false;
                }
                let Some(host) = url.host_str() else {
                    return false;
                };
                let host = host.to_ascii_lowercase();
                self.allowed_suffixes
                    .iter()
                    .any(|suffix| host.ends_with(suffix.as_str()))
            }
            Err(_) => false,
        }
    }

    /// CORS headers granted to a request carrying `origin`. Empty when the
    /// origin is absent, unparseable as a header value, or not allowed.
    pub fn headers_for(&self, origin: Option<&HeaderValue>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let Some(origin) = origin else {
            return headers;
        };
        let Ok(origin_str) = origin.to_str() else {
            return headers;
        };

        if self.is_allowed(origin_str) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers
    }

    /// Overlay the granted headers onto `target`, replacing existing values.
    pub fn apply(&self, origin: Option<&HeaderValue>, target: &mut HeaderMap) {
        for (name, value) in self.headers_for(origin) {
            if let Some(name) = name {
                target.insert(name, value);
            }
        }
    }

    /// Headers for an `OPTIONS` preflight response.
    pub fn preflight_headers(&self, origin: Option<&HeaderValue>) -> HeaderMap {
        let mut headers = self.headers_for(origin);
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(PREFLIGHT_ALLOW_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(PREFLIGHT_ALLOW_HEADERS),
        );
        headers.insert(
            ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(PREFLIGHT_MAX_AGE_SECS),
        );
        headers
    }
}

/// Remove any grant the upstream attached so only the local policy applies.
pub fn strip_cors_grant(headers: &mut HeaderMap) {
    headers.remove(ACCESS_CONTROL_ALLOW_ORIGIN);
    headers.remove(ACCESS_CONTROL_ALLOW_CREDENTIALS);
}
