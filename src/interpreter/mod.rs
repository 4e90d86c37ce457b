//! Reply interpretation.
//!
//! Turns the XML body of a delivered reply into a [`LoginOutcome`]. The
//! service answers in several incompatible shapes, so interpretation runs in
//! fixed steps:
//!
//! 1. Parse the body. Malformed XML yields an empty candidate instead of an
//!    error.
//! 2. Take the text of the first `return` element, or of the first
//!    `LoginResult` element when no `return` exists (local names only).
//! 3. Decode the candidate once ([`decode_payload`]). A structured result
//!    decides by its result code.
//! 4. Plain text is classified by signatures: provider faults first, then
//!    empty text, then generic error words.
//!
//! Empty text and text without error words count as success. The service's
//! real contract is undocumented and this is how existing deployments
//! behave, so the weak spot is kept on purpose and reported as
//! [`DecisionPath::EmptyText`] / [`DecisionPath::PlainText`].

pub mod lookup;
pub mod payload;
pub mod signatures;

use serde::Serialize;

use crate::outcome::{LoginOutcome, OutcomeKind, RESPONSE_RECEIVED, SERVICE_UNAVAILABLE};

pub use lookup::{find_descendant, find_first_of, parse_document, text_content};
pub use payload::{ReplyPayload, StructuredResult, decode_payload};
pub use signatures::{ERROR_INDICATORS, INFRASTRUCTURE_SIGNATURES, TextSignature};

/// Preferred result element.
pub const PRIMARY_RESULT_TAG: &str = "return";
/// Result element used by older deployments.
pub const LEGACY_RESULT_TAG: &str = "LoginResult";

/// Which branch produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPath {
    Structured,
    InfrastructureFault,
    EmptyText,
    ErrorText,
    PlainText,
}

impl DecisionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::InfrastructureFault => "infrastructure_fault",
            Self::EmptyText => "empty_text",
            Self::ErrorText => "error_text",
            Self::PlainText => "plain_text",
        }
    }

    pub fn is_heuristic(&self) -> bool {
        !matches!(self, Self::Structured)
    }
}

/// Outcome plus the branch that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub outcome: LoginOutcome,
    pub path: DecisionPath,
    /// Id of the signature that matched, for the signature-driven branches.
    pub signature: Option<String>,
}

/// Stateless reply interpreter.
#[derive(Debug, Clone)]
pub struct ResponseInterpreter {
    infrastructure: Vec<TextSignature>,
    error_indicators: Vec<TextSignature>,
}

impl Default for ResponseInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseInterpreter {
    pub fn new() -> Self {
        Self {
            infrastructure: INFRASTRUCTURE_SIGNATURES.clone(),
            error_indicators: ERROR_INDICATORS.clone(),
        }
    }

    /// Register an extra provider-fault fragment (case-insensitive literal).
    pub fn with_infrastructure_signature(mut self, signature: TextSignature) -> Self {
        self.infrastructure.push(signature);
        self
    }

    pub fn interpret(&self, body: &str) -> LoginOutcome {
        self.interpret_detailed(body).outcome
    }

    pub fn interpret_detailed(&self, body: &str) -> Interpretation {
        let candidate = extract_candidate(body);
        self.classify(decode_payload(&candidate), body)
    }

    fn classify(&self, payload: ReplyPayload, body: &str) -> Interpretation {
        match payload {
            ReplyPayload::Structured(result) => {
                let message = result.message().unwrap_or(RESPONSE_RECEIVED).to_string();
                let outcome = if result.is_success() {
                    LoginOutcome::accepted(message, body)
                } else {
                    LoginOutcome::failure(OutcomeKind::Rejected, message, body)
                };
                Interpretation {
                    outcome,
                    path: DecisionPath::Structured,
                    signature: None,
                }
            }
            ReplyPayload::PlainText(text) => self.classify_text(text, body),
        }
    }

    fn classify_text(&self, text: String, body: &str) -> Interpretation {
        if let Some(hit) = signatures::first_match(&self.infrastructure, &text) {
            return Interpretation {
                outcome: LoginOutcome::failure(
                    OutcomeKind::RemoteInfrastructureFault,
                    SERVICE_UNAVAILABLE,
                    body,
                ),
                path: DecisionPath::InfrastructureFault,
                signature: Some(hit.id().to_string()),
            };
        }

        if text.is_empty() {
            return Interpretation {
                outcome: LoginOutcome::accepted(RESPONSE_RECEIVED, body),
                path: DecisionPath::EmptyText,
                signature: None,
            };
        }

        match signatures::first_match(&self.error_indicators, &text) {
            Some(hit) => Interpretation {
                signature: Some(hit.id().to_string()),
                outcome: LoginOutcome::failure(OutcomeKind::Rejected, text, body),
                path: DecisionPath::ErrorText,
            },
            None => Interpretation {
                outcome: LoginOutcome::accepted(text, body),
                path: DecisionPath::PlainText,
                signature: None,
            },
        }
    }
}

/// Raw text of the result element, empty when the body is malformed or has
/// no result element.
pub fn extract_candidate(body: &str) -> String {
    parse_document(body)
        .and_then(|root| {
            find_first_of(&root, &[PRIMARY_RESULT_TAG, LEGACY_RESULT_TAG]).map(text_content)
        })
        .unwrap_or_default()
}
