//! Caller identification.
//!
//! Identity and session storage live outside this crate. The host tells us
//! who the caller is and what their session holds; the default
//! authenticator trusts headers set by the fronting web server after it
//! has authenticated the session.

use axum::http::HeaderMap;

use crate::context::{Params, User};

pub const X_USER_ID: &str = "x-user-id";
pub const X_USER_NAME: &str = "x-user-name";
pub const X_USER_ROLES: &str = "x-user-roles";
pub const X_USER_LEVEL: &str = "x-user-level";
pub const X_USER_2FA: &str = "x-user-2fa";
/// Session values as a urlencoded list, e.g. `cart=3&theme=dark`.
pub const X_USER_SESSION: &str = "x-user-session";

/// Turns request headers into a [`User`] and their session.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> User;

    /// Session values for the caller. Empty unless the host keeps sessions.
    fn session(&self, _headers: &HeaderMap) -> Params {
        Params::new()
    }
}

/// Reads identity from trusted `X-User-*` headers.
///
/// Without a parseable `X-User-Id` the caller is anonymous and the other
/// headers are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderAuthenticator;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl Authenticator for HeaderAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> User {
        let Some(id) = header(headers, X_USER_ID).and_then(|v| v.parse::<u64>().ok()) else {
            return User::anonymous();
        };

        let name = header(headers, X_USER_NAME).unwrap_or_default();
        let mut user = User::member(id, name);

        if let Some(roles) = header(headers, X_USER_ROLES) {
            for role in roles.split(',').map(str::trim).filter(|r| !r.is_empty()) {
                user = user.with_role(role);
            }
        }
        if let Some(level) = header(headers, X_USER_LEVEL).and_then(|v| v.parse().ok()) {
            user = user.with_content_level(level);
        }
        let verified = matches!(header(headers, X_USER_2FA), Some("1") | Some("true"));
        user.with_two_factor(verified)
    }

    fn session(&self, headers: &HeaderMap) -> Params {
        header(headers, X_USER_SESSION)
            .and_then(|raw| serde_urlencoded::from_str::<Vec<(String, String)>>(raw).ok())
            .map(Params::from_iter)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_anonymous_without_id() {
        let mut headers = HeaderMap::new();
        headers.insert(X_USER_ROLES, HeaderValue::from_static("admin"));
        let user = HeaderAuthenticator.authenticate(&headers);
        assert!(!user.is_logged_in());
        assert!(!user.is_admin());
    }

    #[test]
    fn test_full_identity() {
        let mut headers = HeaderMap::new();
        headers.insert(X_USER_ID, HeaderValue::from_static("42"));
        headers.insert(X_USER_NAME, HeaderValue::from_static("ada"));
        headers.insert(X_USER_ROLES, HeaderValue::from_static("editor, staff"));
        headers.insert(X_USER_LEVEL, HeaderValue::from_static("3"));
        headers.insert(X_USER_2FA, HeaderValue::from_static("true"));

        let user = HeaderAuthenticator.authenticate(&headers);
        assert_eq!(user.id, Some(42));
        assert_eq!(user.username.as_deref(), Some("ada"));
        assert!(user.has_role("editor"));
        assert!(user.has_role("staff"));
        assert_eq!(user.content_level, 3);
        assert!(user.two_factor_verified);
    }

    #[test]
    fn test_bad_id_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(X_USER_ID, HeaderValue::from_static("abc"));
        assert_eq!(HeaderAuthenticator.authenticate(&headers), User::anonymous());
    }

    #[test]
    fn test_session_from_header() {
        let mut headers = HeaderMap::new();
        assert!(HeaderAuthenticator.session(&headers).is_empty());

        headers.insert(X_USER_SESSION, HeaderValue::from_static("cart=3&theme=dark+blue"));
        let session = HeaderAuthenticator.session(&headers);
        assert_eq!(session.get("cart"), Some("3"));
        assert_eq!(session.get("theme"), Some("dark blue"));
    }
}
