//! Session extraction from request headers.
//!
//! Authentication happens upstream; the gateway forwards the identity as
//! `X-User-*` headers. A request without `X-User-Id` carries no session.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::types::{Session, UserType};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const PHONE_NUMBER_HEADER: &str = "x-phone-number";
pub const USER_TYPE_HEADER: &str = "x-user-type";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Build a session from the forwarded identity headers.
pub fn session_from_headers(headers: &HeaderMap) -> Option<Session> {
    let user_id = header_str(headers, USER_ID_HEADER)?;
    let user_name = header_str(headers, USER_NAME_HEADER).unwrap_or(user_id);

    let mut session = Session::new(user_id, user_name);
    if let Some(phone) = header_str(headers, PHONE_NUMBER_HEADER) {
        session = session.with_phone_number(phone);
    }
    session.user_type = header_str(headers, USER_TYPE_HEADER)
        .map(UserType::parse)
        .unwrap_or_default();
    Some(session)
}

/// Extractor yielding the caller's session, if any. Never rejects; the flows
/// decide what a missing session means.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<Session>);

impl CurrentSession {
    pub fn session(&self) -> Option<&Session> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(session_from_headers(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_missing_user_id_means_no_session() {
        assert!(session_from_headers(&HeaderMap::new()).is_none());
        assert!(session_from_headers(&headers(&[(USER_ID_HEADER, "  ")])).is_none());
        assert!(session_from_headers(&headers(&[(USER_NAME_HEADER, "a@b.c")])).is_none());
    }

    #[test]
    fn test_full_identity() {
        let s = session_from_headers(&headers(&[
            (USER_ID_HEADER, "u42"),
            (USER_NAME_HEADER, "editor@example.com"),
            (PHONE_NUMBER_HEADER, "5550100"),
            (USER_TYPE_HEADER, "admin"),
        ]))
        .unwrap();
        assert_eq!(s.user_id, "u42");
        assert_eq!(s.user_name, "editor@example.com");
        assert_eq!(s.phone_number, "5550100");
        assert!(s.is_admin());
    }

    #[test]
    fn test_defaults_for_optional_headers() {
        let s = session_from_headers(&headers(&[(USER_ID_HEADER, "u7"), (USER_TYPE_HEADER, "editor")]))
            .unwrap();
        assert_eq!(s.user_name, "u7");
        assert_eq!(s.phone_number, "u7");
        assert!(!s.is_admin());
    }
}
