use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::message::IndexParams;
use crate::{AppState, Error};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::message::{self as MessageApi, NewMessage};
use domain::Id;
use log::*;

/// POST a direct message from the signed in user.
#[utoipa::path(
    post,
    path = "/chat/messages",
    request_body = domain::message::NewMessage,
    responses(
        (status = 201, description = "Successfully sent the message", body = domain::messages::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Receiver not found"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(new_message): Json<NewMessage>,
) -> Result<impl IntoResponse, Error> {
    debug!(
        "POST message from {} to {}",
        user.id, new_message.receiver_id
    );

    let message = MessageApi::create(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        new_message,
        user.id,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), message)),
    ))
}

/// GET one page of the conversation with another user, newest first.
#[utoipa::path(
    get,
    path = "/chat/messages/{id}",
    params(
        ("id" = Uuid, Path, description = "The other participant"),
        IndexParams
    ),
    responses(
        (status = 200, description = "Successfully retrieved the discussion", body = domain::message::Discussion),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(other_user_id): Path<Id>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    let discussion = MessageApi::find_discussion(
        app_state.db_conn_ref(),
        user.id,
        other_user_id,
        params.offset,
        params.limit,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), discussion)))
}
