//! SOAP document handling for the login operation.

pub mod envelope;

pub use envelope::{Credentials, EnvelopeBuilder, SOAP_11_NS, SOAP_12_NS, SoapEnvelope, SoapVersion};
