use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{user as UserApi, Id};
use log::*;

/// GET every other user, flagged with whether they are connected.
#[utoipa::path(
    get,
    path = "/chat/users",
    responses(
        (status = 200, description = "Successfully retrieved all other users", body = [domain::user::ChatUser]),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let users =
        UserApi::find_chat_users(app_state.db_conn_ref(), app_state.sessions(), user.id).await?;

    debug!("Found {} chat users", users.len());

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), users)))
}

/// GET a particular user specified by their id.
#[utoipa::path(
    get,
    path = "/chat/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User id to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the user", body = domain::users::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn read(
    AuthenticatedUser(_user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let talker = UserApi::find_by_id(app_state.db_conn_ref(), id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), talker)))
}
