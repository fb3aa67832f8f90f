//! Optional API key gate and caller attestation from request headers.

use axum::http::HeaderMap;
use citizen_core::constants::{ROLE_ATTRIBUTE, USERNAME_ATTRIBUTE};
use citizen_core::CallerAttributes;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const USERNAME_HEADER: &str = "x-username";
pub const ROLE_HEADER: &str = "x-role";

/// Validates the provided API key against the key configured at startup.
///
/// With no key configured every request passes.
pub fn validate_api_key(expected: Option<&str>, headers: &HeaderMap) -> Result<(), &'static str> {
    let Some(expected) = expected else {
        return Ok(());
    };
    match headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        Some(provided) if provided == expected => Ok(()),
        Some(_) => Err("Invalid API key"),
        None => Err("Missing API key"),
    }
}

/// Builds the caller attestation from `x-username` and `x-role`.
///
/// Absent or non-UTF-8 headers are left out; the core reports them as identity failures.
pub fn caller_attributes(headers: &HeaderMap) -> CallerAttributes {
    [(USERNAME_HEADER, USERNAME_ATTRIBUTE), (ROLE_HEADER, ROLE_ATTRIBUTE)]
        .into_iter()
        .fold(CallerAttributes::new(), |attrs, (header, attribute)| {
            match headers.get(header).and_then(|v| v.to_str().ok()) {
                Some(value) => attrs.with(attribute, value),
                None => attrs,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn api_key_is_optional_until_configured() {
        let mut headers = HeaderMap::new();
        assert!(validate_api_key(None, &headers).is_ok());
        assert_eq!(
            validate_api_key(Some("secret"), &headers),
            Err("Missing API key")
        );

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("wrong"));
        assert_eq!(
            validate_api_key(Some("secret"), &headers),
            Err("Invalid API key")
        );

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("secret"));
        assert!(validate_api_key(Some("secret"), &headers).is_ok());
    }

    #[test]
    fn caller_headers_become_attributes() {
        let mut headers = HeaderMap::new();
        headers.insert(USERNAME_HEADER, HeaderValue::from_static("asha"));
        let attrs = caller_attributes(&headers);
        assert_eq!(attrs.get(USERNAME_ATTRIBUTE), Some("asha"));
        assert_eq!(attrs.get(ROLE_ATTRIBUTE), None);
    }
}
