//! Input validation utilities.
//!
//! Identifiers arriving from the invocation surface are plain strings. The types here
//! make "this was checked to be non-empty" visible in signatures so the service never
//! has to re-validate.

use crate::constants::{CREDENTIAL_KEY_PREFIX, REGISTRY_KEY};

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// A string that is guaranteed to contain at least one non-whitespace character.
///
/// Unlike a display name this is used for keys, so the value is kept exactly as supplied
/// (no trimming): `" P1"` and `"P1"` address different documents on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequiredText(String);

impl RequiredText {
    /// Validates `input` for the argument called `field`.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if `input` is empty or whitespace only.
    pub fn new(field: &'static str, input: impl Into<String>) -> Result<Self, TextError> {
        let input = input.into();
        if input.trim().is_empty() {
            return Err(TextError::Empty { field });
        }
        Ok(Self(input))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for RequiredText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RequiredText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns `true` if `key` belongs to a document only the core may write.
///
/// The registry index and credential documents back invariants the passthrough
/// `writeKey` operation must not be able to break.
pub fn is_reserved_key(key: &str) -> bool {
    key == REGISTRY_KEY || key.starts_with(CREDENTIAL_KEY_PREFIX)
}

/// Builds the ledger key for a pre-provisioned credential.
pub fn credential_key(name: &str) -> String {
    format!("{CREDENTIAL_KEY_PREFIX}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_blank_input() {
        assert_eq!(
            RequiredText::new("personid", "   "),
            Err(TextError::Empty { field: "personid" })
        );
        assert!(RequiredText::new("personid", "").is_err());
    }

    #[test]
    fn required_text_keeps_input_verbatim() {
        let text = RequiredText::new("personid", " P1 ").expect("non-empty");
        assert_eq!(text.as_str(), " P1 ");
    }

    #[test]
    fn reserved_keys_cover_registry_and_credentials() {
        assert!(is_reserved_key(REGISTRY_KEY));
        assert!(is_reserved_key(&credential_key("alice")));
        assert!(!is_reserved_key("P1"));
        assert!(!is_reserved_key("entity-index-backup"));
    }
}
