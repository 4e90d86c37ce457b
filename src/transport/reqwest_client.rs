//! Reqwest-based implementation of the `SoapHttpClient` trait.
//!
//! Thin adapter around `reqwest::Client` configured for a stateless legacy
//! endpoint: redirects are never followed, no cookie store is kept, and both
//! the connect phase and the whole exchange are bounded by timeouts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::{
    HeaderMap as HttpHeaderMap, HeaderName as HttpHeaderName, HeaderValue as HttpHeaderValue,
};
use reqwest::{Client, header::HeaderMap, redirect::Policy};
use url::Url;

use super::http::{SoapHttpClient, SoapHttpClientError, SoapHttpResponse};

/// Reqwest-backed HTTP client used for SOAP posts.
pub struct ReqwestSoapHttpClient {
    client: Client,
}

impl ReqwestSoapHttpClient {
    pub fn new(
        timeout: Duration,
        connect_timeout: Duration,
        user_agent: Option<&str>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .redirect(Policy::none())
            .cookie_store(false)
            .timeout(timeout)
            .connect_timeout(connect_timeout);

        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wrap an existing reqwest client. It must not follow redirects or keep
    /// a cookie store.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SoapHttpClient for ReqwestSoapHttpClient {
    async fn post(
        &self,
        url: &Url,
        headers: &HttpHeaderMap,
        body: Vec<u8>,
    ) -> Result<SoapHttpResponse, SoapHttpClientError> {
        let req_headers = convert_headers(headers)?;

        let response = self
            .client
            .post(url.as_str())
            .headers(req_headers)
            .body(body)
            .send()
            .await
            .map_err(map_error)?;

        to_soap_response(response).await
    }
}

fn map_error(err: reqwest::Error) -> SoapHttpClientError {
    if err.is_timeout() {
        SoapHttpClientError::Timeout(err.to_string())
    } else {
        SoapHttpClientError::Transport(err.to_string())
    }
}

fn convert_headers(headers: &HttpHeaderMap) -> Result<HeaderMap, SoapHttpClientError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers.iter() {
        let name = reqwest::header::HeaderName::from_bytes(name.as_str().as_bytes())
            .map_err(|_| SoapHttpClientError::InvalidHeader(name.to_string()))?;
        let value = reqwest::header::HeaderValue::from_bytes(value.as_bytes())
            .map_err(|_| SoapHttpClientError::InvalidHeader(name.to_string()))?;
        map.insert(name, value);
    }
    Ok(map)
}

async fn to_soap_response(
    response: reqwest::Response,
) -> Result<SoapHttpResponse, SoapHttpClientError> {
    let status = response.status().as_u16();
    let headers = convert_back_headers(response.headers())?;
    // Decoded per the Content-Type charset; the seam carries UTF-8.
    let body = response.text().await.map_err(map_error)?.into_bytes();

    Ok(SoapHttpResponse {
        status,
        headers,
        body,
    })
}

fn convert_back_headers(map: &HeaderMap) -> Result<HttpHeaderMap, SoapHttpClientError> {
    let mut headers = HttpHeaderMap::new();
    for (name, value) in map.iter() {
        let http_name = HttpHeaderName::from_bytes(name.as_str().as_bytes())
            .map_err(|_| SoapHttpClientError::InvalidHeader(name.to_string()))?;
        let http_value = HttpHeaderValue::from_bytes(value.as_bytes())
            .map_err(|_| SoapHttpClientError::InvalidHeader(name.to_string()))?;
        headers.append(http_name, http_value);
    }
    Ok(headers)
}

type _AssertSync = Arc<ReqwestSoapHttpClient>;
