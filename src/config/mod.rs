//! Settings and configuration module
//!
//! Provides the service configuration with:
//! - Defaults matching the legacy deployment
//! - JSON loading
//! - Validation before any client is built

pub mod service;

pub use service::{
    ConfigError, DEFAULT_CLIENT_IP, DEFAULT_ENDPOINT, DEFAULT_OPERATION,
    DEFAULT_SERVICE_NAMESPACE, ServiceConfig,
};
