//! SOAP request envelope construction.
//!
//! Builds the `Login` request document sent to the legacy authentication
//! service. Pure string assembly, no I/O. Every caller-supplied value goes
//! through XML escaping before it lands in the document.

use std::fmt;

use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

/// SOAP 1.1 envelope namespace.
pub const SOAP_11_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// SOAP 1.2 envelope namespace.
pub const SOAP_12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// SOAP protocol variant.
///
/// Doubles as the transport strategy: the version decides both the envelope
/// namespace and how the action is signalled to the endpoint (content-type
/// parameter for 1.2, separate `SOAPAction` header for 1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoapVersion {
    #[serde(alias = "1.1")]
    Soap11,
    #[default]
    #[serde(alias = "1.2")]
    Soap12,
}

impl SoapVersion {
    pub fn envelope_namespace(&self) -> &'static str {
        match self {
            Self::Soap11 => SOAP_11_NS,
            Self::Soap12 => SOAP_12_NS,
        }
    }
}

impl fmt::Display for SoapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Soap11 => f.write_str("SOAP 1.1"),
            Self::Soap12 => f.write_str("SOAP 1.2"),
        }
    }
}

/// Login credentials for a single call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub client_ip: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        client_ip: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            client_ip: client_ip.into(),
        }
    }

    /// True when both username and password carry something besides whitespace.
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }
}

// Manual impl keeps the password out of debug output and logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_ip", &self.client_ip)
            .finish()
    }
}

/// Immutable, fully rendered SOAP request document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapEnvelope {
    version: SoapVersion,
    operation: String,
    xml: String,
}

impl SoapEnvelope {
    pub fn version(&self) -> SoapVersion {
        self.version
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn as_str(&self) -> &str {
        &self.xml
    }

    /// UTF-8 bytes of the document, ready to be used as a request body.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.xml.as_bytes().to_vec()
    }
}

impl fmt::Display for SoapEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.xml)
    }
}

/// Renders credential envelopes for one service namespace and operation.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    service_namespace: String,
    operation: String,
    version: SoapVersion,
}

impl EnvelopeBuilder {
    /// `operation` must be a valid XML element name; configuration
    /// validation enforces that before a builder is created from it.
    pub fn new(service_namespace: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            service_namespace: service_namespace.into(),
            operation: operation.into(),
            version: SoapVersion::default(),
        }
    }

    pub fn with_version(mut self, version: SoapVersion) -> Self {
        self.version = version;
        self
    }

    pub fn version(&self) -> SoapVersion {
        self.version
    }

    pub fn build(&self, credentials: &Credentials) -> SoapEnvelope {
        let xml = format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:xsi="{xsi}" xmlns:xsd="{xsd}" xmlns:soap="{env}">
  <soap:Body>
    <{op} xmlns="{ns}">
      <UserName>{user}</UserName>
      <Password>{pass}</Password>
      <IPs>{ip}</IPs>
    </{op}>
  </soap:Body>
</soap:Envelope>"#,
            xsi = XSI_NS,
            xsd = XSD_NS,
            env = self.version.envelope_namespace(),
            op = self.operation,
            ns = escape(self.service_namespace.as_str()),
            user = escape(credentials.username.as_str()),
            pass = escape(credentials.password.as_str()),
            ip = escape(credentials.client_ip.as_str()),
        );

        SoapEnvelope {
            version: self.version,
            operation: self.operation.clone(),
            xml,
        }
    }
}
