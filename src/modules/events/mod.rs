//! Event system for login calls.
//!
//! Provides hooks for logging and custom reactions around each stage of a
//! login round trip. Events never carry the password.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::interpreter::DecisionPath;
use crate::outcome::OutcomeKind;
use crate::soap::SoapVersion;

/// Emitted right before the envelope is posted.
#[derive(Debug, Clone)]
pub struct RequestEvent {
    pub endpoint: Url,
    pub action: String,
    pub version: SoapVersion,
    pub username: String,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when a reply made it through the transport.
#[derive(Debug, Clone)]
pub struct ResponseEvent {
    pub endpoint: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub latency: Duration,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when the transport ends in anything but a delivered reply.
#[derive(Debug, Clone)]
pub struct TransportFailureEvent {
    pub endpoint: Url,
    /// `TransportResult::label()` of the failure.
    pub kind: &'static str,
    pub status: Option<u16>,
    pub detail: String,
    pub latency: Duration,
    pub timestamp: DateTime<Utc>,
}

/// Emitted once per call with the final decision.
#[derive(Debug, Clone)]
pub struct OutcomeEvent {
    pub kind: OutcomeKind,
    pub success: bool,
    /// Interpretation branch, absent when the transport already decided.
    pub path: Option<DecisionPath>,
    pub signature: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum LoginEvent {
    RequestSent(RequestEvent),
    ResponseReceived(ResponseEvent),
    TransportFailed(TransportFailureEvent),
    Classified(OutcomeEvent),
}

/// Trait implemented by event handlers.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &LoginEvent);
}

/// Dispatcher that broadcasts events to registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn register_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn dispatch(&self, event: LoginEvent) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Logs events using the `log` crate.
#[derive(Debug)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle(&self, event: &LoginEvent) {
        match event {
            LoginEvent::RequestSent(req) => {
                log::debug!(
                    "-> POST {} action={} ({}) user={}",
                    req.endpoint,
                    req.action,
                    req.version,
                    req.username
                );
            }
            LoginEvent::ResponseReceived(resp) => {
                log::debug!(
                    "<- {} {} [{}] ({:.2}s)",
                    resp.endpoint,
                    resp.status,
                    resp.content_type.as_deref().unwrap_or("-"),
                    resp.latency.as_secs_f64()
                );
            }
            LoginEvent::TransportFailed(failure) => {
                log::warn!(
                    "transport {} -> {} {}",
                    failure.endpoint,
                    failure.kind,
                    failure
                        .status
                        .map(|status| format!("(HTTP {status})"))
                        .unwrap_or_else(|| failure.detail.clone())
                );
            }
            LoginEvent::Classified(outcome) => match outcome.kind {
                OutcomeKind::RemoteInfrastructureFault => {
                    log::warn!(
                        "provider fault detected (signature={})",
                        outcome.signature.as_deref().unwrap_or("-")
                    );
                }
                _ => {
                    log::info!(
                        "login {} success={} via {}",
                        outcome.kind,
                        outcome.success,
                        outcome.path.map(|path| path.as_str()).unwrap_or("transport")
                    );
                }
            },
        }
    }
}
