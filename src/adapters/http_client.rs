use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body as AxumBody;
use eyre::Result;
use hyper::{Request, Response, Version, header, header::HeaderValue};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use rustls_native_certs::load_native_certs;
use tokio::time::timeout;
use tracing::Instrument;

use crate::{
    config::UpstreamConfig,
    ports::http_client::{HttpClient, HttpClientError, HttpClientResult},
};

/// HTTP client adapter using Hyper with Rustls.
///
/// Responsibilities:
/// * Sets the proxy's fixed `User-Agent` and the `Host` header
/// * Forces request version to HTTP/1.1
/// * Bounds each request by the configured upstream timeout
/// * Converts between Hyper body and Axum body types
///
/// No retries: a failed request is reported to the caller as is.
pub struct HttpClientAdapter {
    client: Client<HttpsConnector<HttpConnector>, AxumBody>,
    user_agent: HeaderValue,
    timeout_secs: u64,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        // Install default crypto provider for rustls if not already set
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false); // Allow HTTPS URLs

        let mut root_cert_store = rustls::RootCertStore::empty();
        let native_certs = load_native_certs();

        if !native_certs.certs.is_empty() {
            for cert in native_certs.certs {
                if root_cert_store.add(cert).is_err() {
                    tracing::warn!("Failed to add native certificate to rustls RootCertStore");
                }
            }
            tracing::debug!("Loaded {} native root certificates.", root_cert_store.len());
        }

        if !native_certs.errors.is_empty() {
            tracing::warn!(
                "Some native certificates failed to load: {:?}",
                native_certs.errors
            );
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new()).build::<_, AxumBody>(https_connector);

        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| eyre::eyre!("Invalid upstream user agent: {e}"))?;

        tracing::info!(
            upstream = %config.base_url(),
            timeout_secs = config.timeout_secs,
            "Created upstream HTTP client"
        );
        Ok(Self {
            client,
            user_agent,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Replace any caller-supplied `User-Agent` with the proxy's own.
    fn set_user_agent(&self, req: &mut Request<AxumBody>) {
        req.headers_mut()
            .insert(header::USER_AGENT, self.user_agent.clone());
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(
        &self,
        mut req: Request<AxumBody>,
    ) -> HttpClientResult<Response<AxumBody>> {
        self.set_user_agent(&mut req);

        let client = self.client.clone();

        let upstream_identifier = format!(
            "{}://{}",
            req.uri().scheme_str().unwrap_or("http"),
            req.uri()
                .authority()
                .map_or_else(|| "unknown".to_string(), |a| a.to_string())
        );
        let request_path = req.uri().path().to_string();
        let request_method = req.method().to_string();

        let span = tracing::info_span!(
            "upstream_request",
            upstream.url = %upstream_identifier,
            http.method = %request_method,
            http.path = %request_path,
            http.status_code = tracing::field::Empty,
        );

        // Set Host header
        let Some(host_str) = req.uri().host() else {
            tracing::error!("Outgoing URI has no host: {}", req.uri());
            return Err(HttpClientError::InvalidRequest(
                "Outgoing URI has no host".to_string(),
            ));
        };
        let host_header_val = match req.uri().port() {
            Some(port) => HeaderValue::from_str(&format!("{host_str}:{}", port.as_u16())),
            None => HeaderValue::from_str(host_str),
        }
        .map_err(|e| HttpClientError::InvalidRequest(format!("Invalid host header: {e}")))?;
        req.headers_mut().insert(header::HOST, host_header_val);

        let (mut parts, axum_body) = req.into_parts();
        parts.version = Version::HTTP_11;

        tracing::debug!("Sending upstream request: {} {}", parts.method, parts.uri);

        let outgoing_request = Request::from_parts(parts, axum_body);

        let method_for_error_log = outgoing_request.method().clone();
        let uri_for_error_log = outgoing_request.uri().clone();

        let result = timeout(
            Duration::from_secs(self.timeout_secs),
            client.request(outgoing_request),
        )
        .instrument(span.clone())
        .await;

        match result {
            Ok(Ok(response)) => {
                span.record("http.status_code", response.status().as_u16());

                let (mut parts, hyper_body) = response.into_parts();

                // The body is re-framed by the downstream server.
                parts.headers.remove(header::TRANSFER_ENCODING);

                Ok(Response::from_parts(parts, AxumBody::new(hyper_body)))
            }
            Ok(Err(e)) => {
                span.record("http.status_code", 599u16);
                tracing::error!(
                    "Error making upstream request {} {}: {}",
                    method_for_error_log,
                    uri_for_error_log,
                    e
                );
                Err(HttpClientError::ConnectionError(connection_error_message(&e)))
            }
            Err(_) => {
                span.record("http.status_code", 599u16);
                tracing::error!(
                    "Upstream request {} {} timed out after {}s",
                    method_for_error_log,
                    uri_for_error_log,
                    self.timeout_secs
                );
                Err(HttpClientError::Timeout(self.timeout_secs))
            }
        }
    }
}

/// Innermost cause of a client error; hyper's own top-level message is a
/// generic "client error (Connect)".
fn connection_error_message(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
