//! Service configuration: where to send requests and how.

use std::fs;
use std::path::Path;
use std::time::Duration;

use http::HeaderValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::soap::SoapVersion;

pub const DEFAULT_ENDPOINT: &str =
    "http://isapi.mekashron.com/icu-tech/icutech-test.dll/soap/IICUTech";
pub const DEFAULT_SERVICE_NAMESPACE: &str = "http://tempuri.org/";
pub const DEFAULT_OPERATION: &str = "Login";
pub const DEFAULT_CLIENT_IP: &str = "0.0.0.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid endpoint url: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("unsupported endpoint scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for one remote login service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub service_namespace: String,
    pub operation: String,
    pub soap_version: SoapVersion,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Used when a caller supplies no client address.
    pub default_client_ip: String,
    pub user_agent: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            service_namespace: DEFAULT_SERVICE_NAMESPACE.to_string(),
            operation: DEFAULT_OPERATION.to_string(),
            soap_version: SoapVersion::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            default_client_ip: DEFAULT_CLIENT_IP.to_string(),
            user_agent: None,
        }
    }
}

impl ServiceConfig {
    /// Parse a JSON document. Missing keys keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parsed endpoint; only http and https are accepted.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.endpoint.trim())?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }

    /// SOAP action URI: the namespace joined with the operation name.
    pub fn soap_action(&self) -> String {
        let namespace = self.service_namespace.trim();
        if namespace.ends_with('/') || namespace.ends_with('#') {
            format!("{namespace}{}", self.operation)
        } else {
            format!("{namespace}/{}", self.operation)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url()?;

        if self.service_namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("service namespace is empty".into()));
        }
        if !is_xml_name(&self.operation) {
            return Err(ConfigError::Invalid(format!(
                "operation '{}' is not a valid XML element name",
                self.operation
            )));
        }
        if self.timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least one second".into()));
        }
        if HeaderValue::from_str(&format!(r#""{}""#, self.soap_action())).is_err() {
            return Err(ConfigError::Invalid(
                "soap action cannot be sent as an HTTP header".into(),
            ));
        }
        if let Some(agent) = &self.user_agent
            && HeaderValue::from_str(agent).is_err()
        {
            return Err(ConfigError::Invalid("user agent is not a valid header value".into()));
        }

        Ok(())
    }
}

// Unprefixed names only; a colon would introduce a namespace prefix.
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
