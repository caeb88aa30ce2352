//! Session extraction.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
};

use crate::api::Session;

/// The caller's backend session, forwarded from the request's `Cookie`
/// header(s) exactly as received. Anonymous when there are none.
#[derive(Debug, Clone)]
pub struct RequestSession(pub Session);

/// The raw `Cookie` header, with multiple header lines joined by `"; "`.
#[must_use]
pub fn cookie_header(parts: &Parts) -> Option<String> {
    let values: Vec<&str> = parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .collect();
    (!values.is_empty()).then(|| values.join("; "))
}

impl<S> FromRequestParts<S> for RequestSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = cookie_header(parts)
            .as_deref()
            .map_or_else(Session::anonymous, Session::forwarded);
        Ok(Self(session))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_forwards_cookie_header() {
        let (mut parts, ()) = Request::builder()
            .header(COOKIE, "access_token=abc")
            .header(COOKIE, "theme=dark")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(
            cookie_header(&parts).as_deref(),
            Some("access_token=abc; theme=dark")
        );

        let RequestSession(session) = RequestSession::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(session.has_cookie("access_token"));
    }

    #[tokio::test]
    async fn test_no_cookie_is_anonymous() {
        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        let RequestSession(session) = RequestSession::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(session.is_anonymous());
    }
}
