use crate::extractors::session_token::SessionToken;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::*;

/// Authentication middleware that returns 401 Unauthorized for requests
/// without a valid session cookie.
///
/// Only the session table is consulted; handlers that need the user record
/// load it through the `AuthenticatedUser` extractor.
pub async fn require_auth(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    match SessionToken::from_parts(&parts, &app_state) {
        Some(SessionToken(token)) if app_state.sessions().validate(&token) => {
            next.run(Request::from_parts(parts, body)).await
        }
        Some(_) => {
            trace!("Rejecting request with an expired or unknown session");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
        None => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
    }
}
