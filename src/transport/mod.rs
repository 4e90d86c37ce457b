//! SOAP transport.
//!
//! Posts a rendered envelope to the configured endpoint and folds every
//! possible result (connection errors included) into a single
//! [`TransportResult`]. Only [`TransportResult::Delivered`] carries a body
//! that is worth interpreting.

pub mod http;
pub mod reqwest_client;

use std::sync::Arc;

use ::http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::soap::{SoapEnvelope, SoapVersion};

pub use self::http::{SoapHttpClient, SoapHttpClientError, SoapHttpResponse};
pub use self::reqwest_client::ReqwestSoapHttpClient;

/// Header carrying the action for SOAP 1.1 requests.
pub const SOAP_ACTION_HEADER: &str = "soapaction";

/// Outcome of a single transport round trip. Exactly one variant per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportResult {
    /// 2xx reply that looks like XML.
    Delivered {
        status_code: u16,
        content_type: Option<String>,
        body: String,
    },
    /// DNS, TCP, TLS, timeout or cancellation; nothing usable came back.
    ConnectionFailed { detail: String },
    /// Non-2xx status. The body is kept for diagnostics only.
    NonSuccessStatus { status_code: u16, body: String },
    /// 2xx reply whose body is not recognisable as XML (HTML error pages).
    NonXmlBody { body: String },
}

impl TransportResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// Short label used in events and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::ConnectionFailed { .. } => "connection_failed",
            Self::NonSuccessStatus { .. } => "non_success_status",
            Self::NonXmlBody { .. } => "non_xml_body",
        }
    }
}

/// Sends SOAP envelopes to one fixed endpoint.
#[derive(Clone)]
pub struct SoapTransport {
    client: Arc<dyn SoapHttpClient>,
    endpoint: Url,
}

impl SoapTransport {
    pub fn new(client: Arc<dyn SoapHttpClient>, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Post `envelope` with `action`, using the header shape matching the
    /// envelope's SOAP version. Never fails; errors become
    /// [`TransportResult::ConnectionFailed`].
    pub async fn send(&self, envelope: &SoapEnvelope, action: &str) -> TransportResult {
        let headers = match request_headers(envelope.version(), action) {
            Ok(headers) => headers,
            Err(err) => {
                return TransportResult::ConnectionFailed {
                    detail: err.to_string(),
                };
            }
        };

        let response = match self
            .client
            .post(&self.endpoint, &headers, envelope.to_bytes())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return TransportResult::ConnectionFailed {
                    detail: err.to_string(),
                };
            }
        };

        classify_response(&response)
    }
}

/// Request headers for the given strategy.
///
/// SOAP 1.2 carries the action as a content-type parameter, SOAP 1.1 as a
/// separate quoted `SOAPAction` header.
pub fn request_headers(
    version: SoapVersion,
    action: &str,
) -> Result<HeaderMap, SoapHttpClientError> {
    let mut headers = HeaderMap::new();
    match version {
        SoapVersion::Soap12 => {
            let value = format!(r#"application/soap+xml; charset=utf-8; action="{action}""#);
            headers.insert(CONTENT_TYPE, header_value(CONTENT_TYPE.as_str(), &value)?);
        }
        SoapVersion::Soap11 => {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/xml; charset=utf-8"),
            );
            headers.insert(
                HeaderName::from_static(SOAP_ACTION_HEADER),
                header_value(SOAP_ACTION_HEADER, &format!(r#""{action}""#))?,
            );
        }
    }
    Ok(headers)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, SoapHttpClientError> {
    HeaderValue::from_str(value).map_err(|_| SoapHttpClientError::InvalidHeader(name.to_string()))
}

/// Map a raw HTTP response onto a [`TransportResult`].
pub fn classify_response(response: &SoapHttpResponse) -> TransportResult {
    let body = response.body_text();

    if !response.is_success() {
        return TransportResult::NonSuccessStatus {
            status_code: response.status,
            body,
        };
    }

    let content_type = response.content_type();
    if !looks_like_xml(content_type, &body) {
        return TransportResult::NonXmlBody { body };
    }

    TransportResult::Delivered {
        status_code: response.status,
        content_type: content_type.map(str::to_string),
        body,
    }
}

/// XML sniffing.
///
/// The declared media type wins when it mentions XML. The service sometimes
/// mislabels its replies, so a body that starts with `<` and mentions
/// `Envelope` is accepted too.
pub fn looks_like_xml(content_type: Option<&str>, body: &str) -> bool {
    let declared_xml = content_type
        .map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or("")
                .to_ascii_lowercase()
                .contains("xml")
        })
        .unwrap_or(false);

    declared_xml || (body.trim_start().starts_with('<') && body.contains("Envelope"))
}
