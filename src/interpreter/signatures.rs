//! Text signatures used to classify plain-text replies.
//!
//! Two families exist: fragments that betray a fault in the provider's own
//! deployment (file-system and FTP tool errors leaking into replies) and the
//! generic words that mark a reply as an error. Matching is a
//! case-insensitive substring search.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// A named, case-insensitive literal fragment.
#[derive(Debug, Clone)]
pub struct TextSignature {
    id: String,
    regex: Regex,
}

impl TextSignature {
    /// Builds a signature matching `fragment` literally, ignoring case.
    pub fn literal(id: impl Into<String>, fragment: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&regex::escape(fragment))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            id: id.into(),
            regex,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Fragments seen when the provider's deployment is broken.
pub static INFRASTRUCTURE_SIGNATURES: Lazy<Vec<TextSignature>> = Lazy::new(|| {
    build_set(&[
        ("provider_file_open", "Cannot open file"),
        ("provider_filezilla", "FileZilla"),
    ])
});

/// Words marking a free-text reply as an error.
pub static ERROR_INDICATORS: Lazy<Vec<TextSignature>> = Lazy::new(|| {
    build_set(&[
        ("error", "error"),
        ("cannot", "cannot"),
        ("exception", "exception"),
        ("fail", "fail"),
    ])
});

// Escaped literals always compile, so a failing entry is simply skipped.
fn build_set(raw: &[(&str, &str)]) -> Vec<TextSignature> {
    raw.iter()
        .filter_map(|(id, fragment)| match TextSignature::literal(*id, fragment) {
            Ok(signature) => Some(signature),
            Err(err) => {
                log::error!("invalid text signature `{id}`: {err}");
                None
            }
        })
        .collect()
}

/// First signature in `set` found in `text`.
pub fn first_match<'a>(set: &'a [TextSignature], text: &str) -> Option<&'a TextSignature> {
    set.iter().find(|signature| signature.matches(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infrastructure_signatures_ignore_case() {
        let hit = first_match(&INFRASTRUCTURE_SIGNATURES, "CANNOT OPEN FILE c:\\data.ini");
        assert_eq!(hit.map(TextSignature::id), Some("provider_file_open"));

        let hit = first_match(&INFRASTRUCTURE_SIGNATURES, "login via filezilla failed");
        assert_eq!(hit.map(TextSignature::id), Some("provider_filezilla"));

        assert!(first_match(&INFRASTRUCTURE_SIGNATURES, "wrong password").is_none());
    }

    #[test]
    fn error_indicators_match_substrings() {
        for text in ["Error 17", "cannot login", "NullReferenceException", "Authentication FAILED"] {
            assert!(first_match(&ERROR_INDICATORS, text).is_some(), "{text}");
        }
        assert!(first_match(&ERROR_INDICATORS, "Welcome back").is_none());
    }

    #[test]
    fn literal_fragments_are_not_regex() {
        let signature = TextSignature::literal("dots", "a.b").unwrap();
        assert!(signature.matches("xx A.B yy"));
        assert!(!signature.matches("axb"));
    }
}
