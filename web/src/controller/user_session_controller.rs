use crate::controller::ApiResponse;
use crate::extractors::{authenticated_user::AuthenticatedUser, session_token::SessionToken};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use domain::user_session::{self as UserSessionApi, Credentials, SignedIn};
use domain::users;
use log::*;
use service::config::Config;
use time::OffsetDateTime;

/// POST sign up a new user and open a session for them.
///
/// Successful sign up sets the session cookie, e.g.:
/// set-cookie: auth_session=8fQv...; HttpOnly; Secure; SameSite=Lax; Path=/; Expires=...
#[utoipa::path(
    post,
    path = "/sign-up",
    request_body = domain::users::Model,
    responses(
        (status = 201, description = "Successfully signed up", body = domain::users::Model),
        (status = 409, description = "Nickname or email already taken"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn sign_up(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(user_model): Json<users::Model>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Sign up: {}", user_model.nickname);

    let signed_in = UserSessionApi::sign_up(
        app_state.db_conn_ref(),
        app_state.sessions(),
        app_state.event_publisher.as_ref(),
        user_model,
    )
    .await?;

    Ok(respond_signed_in(app_state.config(), jar, signed_in, StatusCode::CREATED))
}

/// POST sign in with an email or nickname and a password.
#[utoipa::path(
    post,
    path = "/sign-in",
    request_body = domain::user_session::Credentials,
    responses(
        (status = 200, description = "Signs in and returns the session cookie", body = domain::users::Model),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn sign_in(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, Error> {
    let signed_in = UserSessionApi::sign_in(
        app_state.db_conn_ref(),
        app_state.sessions(),
        app_state.event_publisher.as_ref(),
        credentials,
    )
    .await?;

    info!("User {} signed in", signed_in.user.id);

    Ok(respond_signed_in(app_state.config(), jar, signed_in, StatusCode::OK))
}

/// DELETE the current session and expire its cookie.
#[utoipa::path(
    delete,
    path = "/logout",
    responses(
        (status = 200, description = "Successfully logged out"),
        (status = 401, description = "No active session"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn logout(
    State(app_state): State<AppState>,
    SessionToken(token): SessionToken,
    jar: CookieJar,
) -> Result<impl IntoResponse, Error> {
    trace!("UserSessionController::logout()");
    UserSessionApi::sign_out(app_state.sessions(), &token)?;

    let jar = jar.remove(
        Cookie::build((app_state.config().session_cookie_name.clone(), "")).path("/"),
    );

    Ok((
        jar,
        Json(ApiResponse::<()>::no_content(StatusCode::OK.into())),
    ))
}

/// GET the signed in user.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The user owning the session", body = domain::users::Model),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
    Json(ApiResponse::new(StatusCode::OK.into(), user))
}

fn respond_signed_in(
    config: &Config,
    jar: CookieJar,
    signed_in: SignedIn,
    status: StatusCode,
) -> impl IntoResponse {
    let expires = OffsetDateTime::from_unix_timestamp(signed_in.session.expires_at.timestamp())
        .unwrap_or_else(|_| OffsetDateTime::now_utc());

    let cookie = Cookie::build((
        config.session_cookie_name.clone(),
        signed_in.session.token,
    ))
    .path("/")
    .http_only(true)
    .secure(config.session_cookie_secure)
    .same_site(SameSite::Lax)
    .expires(expires);

    (
        status,
        jar.add(cookie),
        Json(ApiResponse::new(status.into(), signed_in.user)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::define_routes;
    use axum::body::Body;
    use axum::http::Request;
    use events::EventPublisher;
    use realtime::Manager;
    use session::SessionStore;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app_state() -> AppState {
        let db = Arc::new(sea_orm::DatabaseConnection::Disconnected);
        let sessions = Arc::new(SessionStore::new(chrono::Duration::hours(2)));
        AppState::new(
            service::AppState::new(Config::from_env(), &db, &sessions),
            &Arc::new(Manager::new()),
            &Arc::new(EventPublisher::new()),
        )
    }

    #[tokio::test]
    async fn logout_without_a_session_is_401() {
        let request = Request::builder()
            .method("DELETE")
            .uri("/logout")
            .body(Body::empty())
            .unwrap();

        let response = define_routes(app_state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_deletes_the_session_and_expires_the_cookie() {
        let app_state = app_state();
        let created = app_state.sessions().create(Uuid::new_v4(), "dave");
        let cookie_name = app_state.config().session_cookie_name.clone();

        let request = Request::builder()
            .method("DELETE")
            .uri("/logout")
            .header("cookie", format!("{cookie_name}={}", created.token))
            .body(Body::empty())
            .unwrap();

        let response = define_routes(app_state.clone())
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!app_state.sessions().validate(&created.token));
        let set_cookie = response
            .headers()
            .get("set-cookie")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert!(set_cookie.starts_with(&format!("{cookie_name}=;")));
    }
}
