//! Cross-cutting services module
//!
//! Hooks that observe login calls without influencing their outcome.

pub mod events;

pub use events::{
    EventDispatcher, EventHandler, LoggingHandler, LoginEvent, OutcomeEvent, RequestEvent,
    ResponseEvent, TransportFailureEvent,
};
