use async_trait::async_trait;
use axum::body::Body as AxumBody;
use hyper::{Request, Response};
use thiserror::Error;

/// Custom error type for HTTP client operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HttpClientError {
    /// The upstream could not be reached (DNS, refused, reset, TLS ...).
    /// Displays the underlying message unchanged.
    #[error("{0}")]
    ConnectionError(String),

    /// Error when request times out
    #[error("Upstream request timed out after {0} seconds")]
    Timeout(u64),

    /// Error when request is invalid
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for HTTP client operations
pub type HttpClientResult<T> = Result<T, HttpClientError>;

/// HttpClient defines the port (interface) for making HTTP requests to the upstream
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Send an HTTP request upstream
    ///
    /// # Arguments
    /// * `req` - The request to send; its URI must be absolute
    ///
    /// # Returns
    /// The upstream response, whatever its status. Only transport failures
    /// are errors.
    async fn send_request(&self, req: Request<AxumBody>) -> HttpClientResult<Response<AxumBody>>;
}
