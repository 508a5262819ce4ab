use crate::error::CmsError;
use subtle::ConstantTimeEq;

/// Constant-time string comparison to prevent timing attacks
/// Use this for comparing API keys and other sensitive values
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Check an `Authorization` header against the configured admin key.
pub fn verify_admin(header: Option<&str>, admin_api_key: &str) -> Result<(), CmsError> {
    match header.and_then(bearer_token) {
        Some(token) if constant_time_compare(token, admin_api_key) => Ok(()),
        _ => Err(CmsError::Unauthorized),
    }
}
