//! Result payload decoding.
//!
//! The text inside the result element is either a JSON object describing the
//! login result or free text. [`decode_payload`] is the single place that
//! decides which one it is.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Login result record as serialized by the service.
///
/// Field names arrive in arbitrary case; keys are lower-cased before
/// deserialization, hence the lowercase renames.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructuredResult {
    /// Zero when the service leaves it out.
    #[serde(rename = "resultcode", default)]
    pub result_code: i32,
    #[serde(rename = "resultmessage", default)]
    pub result_message: Option<String>,
    #[serde(rename = "entityid", default)]
    pub entity_id: i32,
    #[serde(rename = "affiliateresultcode", default)]
    pub affiliate_result_code: i32,
    #[serde(rename = "affiliateresultmessage", default)]
    pub affiliate_result_message: Option<String>,
}

impl StructuredResult {
    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }

    /// Result message when it carries more than whitespace.
    pub fn message(&self) -> Option<&str> {
        self.result_message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
    }
}

/// Shape of the reply payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPayload {
    Structured(StructuredResult),
    /// Anything else, trimmed. Empty when no result element was found.
    PlainText(String),
}

/// Decode the raw result text.
///
/// Succeeds as [`ReplyPayload::Structured`] for any JSON object whose known
/// fields (any key case) are correctly typed; missing fields take defaults.
pub fn decode_payload(raw: &str) -> ReplyPayload {
    let text = raw.trim();
    match decode_structured(text) {
        Some(result) => ReplyPayload::Structured(result),
        None => ReplyPayload::PlainText(text.to_string()),
    }
}

fn decode_structured(text: &str) -> Option<StructuredResult> {
    if text.is_empty() {
        return None;
    }

    let object = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => object,
        Ok(_) => return None,
        Err(err) => {
            log::trace!("payload is not JSON: {err}");
            return None;
        }
    };

    let folded: Map<String, Value> = object
        .into_iter()
        .map(|(key, value)| (fold_key(&key), value))
        .collect();

    serde_json::from_value(Value::Object(folded))
        .map_err(|err| log::debug!("JSON payload is not a login result: {err}"))
        .ok()
}

fn fold_key(key: &str) -> String {
    key.to_lowercase()
}
