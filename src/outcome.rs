//! Final answer handed back to callers.

use std::fmt;

use serde::Serialize;

/// Message used when the reply carries no usable text of its own.
pub const RESPONSE_RECEIVED: &str = "Login response received.";
/// Message used when the provider's deployment is at fault.
pub const SERVICE_UNAVAILABLE: &str =
    "The authorization service is temporarily unavailable on the provider side. Please try again later.";
/// Message used when a reply is not XML.
pub const NON_XML_REPLY: &str = "Received a non-XML response (probably an HTML page).";
/// Message used when username or password is blank.
pub const MISSING_CREDENTIALS: &str = "Enter your login and password.";
/// Message returned by the registration entry point.
pub const REGISTRATION_DISABLED: &str =
    "Registration is disabled in this build. Only login is available.";

/// What decided the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The service accepted the credentials.
    Accepted,
    /// The service answered and the answer is a failure.
    Rejected,
    /// Network, TLS, timeout or cancellation.
    ConnectionFailure,
    /// Non-2xx status or a reply that is not XML.
    ProtocolFailure,
    /// The provider's deployment is broken; not a credential problem.
    RemoteInfrastructureFault,
    /// Blank username or password; nothing was sent.
    InvalidInput,
    /// The requested operation is switched off.
    Disabled,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::ConnectionFailure => "connection_failure",
            Self::ProtocolFailure => "protocol_failure",
            Self::RemoteInfrastructureFault => "remote_infrastructure_fault",
            Self::InvalidInput => "invalid_input",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one login call. `raw_body` is kept for diagnostics on every path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub success: bool,
    pub message: String,
    pub raw_body: String,
    pub kind: OutcomeKind,
}

impl LoginOutcome {
    pub fn accepted(message: impl Into<String>, raw_body: impl Into<String>) -> Self {
        Self::new(OutcomeKind::Accepted, message, raw_body)
    }

    pub fn failure(
        kind: OutcomeKind,
        message: impl Into<String>,
        raw_body: impl Into<String>,
    ) -> Self {
        debug_assert!(kind != OutcomeKind::Accepted);
        Self::new(kind, message, raw_body)
    }

    pub fn registration_disabled() -> Self {
        Self::failure(OutcomeKind::Disabled, REGISTRATION_DISABLED, "")
    }

    pub fn missing_credentials() -> Self {
        Self::failure(OutcomeKind::InvalidInput, MISSING_CREDENTIALS, "")
    }

    fn new(kind: OutcomeKind, message: impl Into<String>, raw_body: impl Into<String>) -> Self {
        Self {
            success: kind == OutcomeKind::Accepted,
            message: message.into(),
            raw_body: raw_body.into(),
            kind,
        }
    }
}
