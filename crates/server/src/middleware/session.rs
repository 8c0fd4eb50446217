//! Session cookie adapter.
//!
//! Single read/write/delete interface over the one cookie holding the
//! platform session secret. The cookie is HTTP-only, Secure, and
//! SameSite=Strict so client-side code cannot read or exfiltrate it.
//! No other module writes this cookie.

use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderMap, HeaderValue, header};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "appwrite-session";

/// Read the session secret from a request's cookie header.
#[must_use]
pub fn session_secret(headers: &HeaderMap) -> Option<String> {
    let cookie = headers.get(header::COOKIE)?;
    let s = cookie.to_str().ok()?;

    for part in s.split(';') {
        if let Some((name, value)) = part.trim().split_once('=')
            && name == SESSION_COOKIE_NAME
        {
            return Some(value.to_string());
        }
    }

    None
}

/// Build the `Set-Cookie` value persisting a session secret.
///
/// # Errors
///
/// Returns an error if the secret contains bytes not allowed in a header
/// value.
pub fn set_session_cookie(secret: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={secret}; Path=/; HttpOnly; Secure; SameSite=Strict"
    ))
}

/// Build the `Set-Cookie` value deleting the session cookie.
#[must_use]
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static(
        "appwrite-session=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; \
         Path=/; HttpOnly; Secure; SameSite=Strict",
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_session_secret_absent() {
        assert!(session_secret(&HeaderMap::new()).is_none());
        assert!(session_secret(&headers_with_cookie("other=value")).is_none());
    }

    #[test]
    fn test_session_secret_parsed_among_other_cookies() {
        let headers = headers_with_cookie("theme=dark; appwrite-session=s3cr3t; lang=en");
        assert_eq!(session_secret(&headers).as_deref(), Some("s3cr3t"));
    }

    #[test]
    fn test_set_cookie_carries_security_attributes() {
        let value = set_session_cookie("s3cr3t").unwrap();
        let s = value.to_str().unwrap();

        assert!(s.starts_with("appwrite-session=s3cr3t"));
        assert!(s.contains("Path=/"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("Secure"));
        assert!(s.contains("SameSite=Strict"));
    }

    #[test]
    fn test_set_cookie_rejects_invalid_secret() {
        assert!(set_session_cookie("bad\nsecret").is_err());
    }

    #[test]
    fn test_clear_cookie_expires_in_the_past() {
        let value = clear_session_cookie();
        let s = value.to_str().unwrap();

        assert!(s.starts_with(SESSION_COOKIE_NAME));
        assert!(s.contains("Expires=Thu, 01 Jan 1970"));
        assert!(s.contains("HttpOnly"));
    }

    #[test]
    fn test_set_then_clear_uses_the_same_cookie_name() {
        // The adapter owns exactly one cookie
        let set = set_session_cookie("x").unwrap();
        let set = set.to_str().unwrap();
        let clear = clear_session_cookie();
        let clear = clear.to_str().unwrap();

        let set_name = set.split('=').next().unwrap();
        let clear_name = clear.split('=').next().unwrap();
        assert_eq!(set_name, clear_name);
        assert_eq!(set_name, SESSION_COOKIE_NAME);
    }
}
