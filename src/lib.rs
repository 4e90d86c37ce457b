//! # soap-login-relay
//!
//! Credential relay for a legacy SOAP login service: build the request
//! envelope, post it, and turn whatever comes back into a single
//! [`LoginOutcome`].
//!
//! The remote service is known to answer with JSON inside XML, plain text,
//! HTML error pages and occasionally its own internal file-server faults, so
//! interpretation is deliberately forgiving.
//!
//! ## Features
//!
//! - SOAP 1.2 (default) and SOAP 1.1 request strategies, selectable per call
//! - Injection-safe envelope construction
//! - Redirects never followed, cookies never replayed
//! - Structured JSON results with text heuristics as fallback
//! - Event hooks for logging and custom observers
//!
//! ## Example
//!
//! ```no_run
//! use soap_login_relay::LoginClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LoginClient::new()?;
//!     let outcome = client.login("alice", "secret", None).await;
//!     println!("{}: {}", outcome.success, outcome.message);
//!     Ok(())
//! }
//! ```

mod client;

pub mod config;
pub mod interpreter;
pub mod modules;
pub mod outcome;
pub mod soap;
pub mod transport;

pub use crate::client::{
    CANCELLED_DETAIL,
    ClientError,
    ClientResult,
    FormAction,
    LoginClient,
    LoginClientBuilder,
};

pub use crate::config::{ConfigError, ServiceConfig};

pub use crate::interpreter::{
    DecisionPath,
    Interpretation,
    ReplyPayload,
    ResponseInterpreter,
    StructuredResult,
    TextSignature,
};

pub use crate::modules::{
    EventDispatcher,
    EventHandler,
    LoggingHandler,
    LoginEvent,
    OutcomeEvent,
    RequestEvent,
    ResponseEvent,
    TransportFailureEvent,
};

pub use crate::outcome::{LoginOutcome, OutcomeKind};

pub use crate::soap::{Credentials, EnvelopeBuilder, SoapEnvelope, SoapVersion};

pub use crate::transport::{
    ReqwestSoapHttpClient,
    SoapHttpClient,
    SoapHttpClientError,
    SoapHttpResponse,
    SoapTransport,
    TransportResult,
};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
