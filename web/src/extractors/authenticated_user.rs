use crate::extractors::{session_token::SessionToken, RejectionType};
use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use domain::error::EntityErrorKind;
use domain::{user_session, users};
use log::*;

pub(crate) struct AuthenticatedUser(pub users::Model);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = RejectionType;

    // Resolves the session cookie to the user that owns it. A missing, unknown
    // or expired session is a 401; a failed user lookup is a 500.
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let SessionToken(token) = SessionToken::from_parts(parts, &app_state)
            .ok_or_else(|| (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()))?;

        match user_session::resolve_user(app_state.db_conn_ref(), app_state.sessions(), &token)
            .await
        {
            Ok(user) => Ok(AuthenticatedUser(user)),
            Err(e) if e.entity_kind() == Some(&EntityErrorKind::Unauthenticated) => {
                Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()))
            }
            Err(e) => {
                error!("Could not load the session user: {e:?}");
                Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL SERVER ERROR".to_string(),
                ))
            }
        }
    }
}
