use crate::extractors::RejectionType;
use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;

/// The raw value of the session cookie. Says nothing about whether the
/// session is still valid.
pub(crate) struct SessionToken(pub String);

impl SessionToken {
    /// Reads the configured session cookie from the request headers.
    pub(crate) fn from_parts(parts: &Parts, app_state: &AppState) -> Option<Self> {
        CookieJar::from_headers(&parts.headers)
            .get(&app_state.config().session_cookie_name)
            .map(|cookie| cookie.value().to_owned())
            .filter(|token| !token.is_empty())
            .map(SessionToken)
    }
}

impl<S> FromRequestParts<S> for SessionToken
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        SessionToken::from_parts(parts, &app_state)
            .ok_or_else(|| (StatusCode::UNAUTHORIZED, "No active session".to_string()))
    }
}
