//! HTTP seam used by the SOAP transport.
//!
//! Keeps the transport independent from the concrete client so it can be
//! exercised against stubs and mock endpoints.

use async_trait::async_trait;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use thiserror::Error;
use url::Url;

/// Contract for the HTTP client that carries SOAP requests.
///
/// Implementations must not follow redirects and must not keep cookies
/// between calls; every post is an independent round trip. Response bodies
/// are handed over as UTF-8, decoded from the declared charset.
#[async_trait]
pub trait SoapHttpClient: Send + Sync {
    async fn post(
        &self,
        url: &Url,
        headers: &HeaderMap,
        body: Vec<u8>,
    ) -> Result<SoapHttpResponse, SoapHttpClientError>;
}

/// Minimal response representation returned by the HTTP seam.
#[derive(Debug, Clone)]
pub struct SoapHttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl SoapHttpResponse {
    /// Raw `Content-Type` header value, if present and readable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// Body as text, replacing invalid UTF-8 sequences.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum SoapHttpClientError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("http transport error: {0}")]
    Transport(String),
    #[error("invalid request header '{0}'")]
    InvalidHeader(String),
}
