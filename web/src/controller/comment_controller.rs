use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::comment::{self as CommentApi, NewComment};
use domain::Id;
use log::*;

/// POST a comment on a Post, optionally as a reply to another comment.
#[utoipa::path(
    post,
    path = "/posts/{id}/comments",
    params(
        ("id" = Uuid, Path, description = "Post being commented on")
    ),
    request_body = domain::comment::NewComment,
    responses(
        (status = 201, description = "Successfully Created a New Comment", body = domain::comment::CommentItem),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post or parent comment not found"),
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
    Path(post_id): Path<Id>,
    Json(new_comment): Json<NewComment>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New Comment on Post {post_id}");

    let comment = CommentApi::create(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        post_id,
        new_comment,
        &user,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), comment)),
    ))
}

/// GET the comments of a Post in thread order.
#[utoipa::path(
    get,
    path = "/posts/{id}/comments",
    params(
        ("id" = Uuid, Path, description = "Post whose comments to list")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the comments", body = [domain::comment::CommentItem]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Path(post_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    domain::post::find_by_id(app_state.db_conn_ref(), post_id).await?;
    let comments = CommentApi::find_by_post(app_state.db_conn_ref(), post_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), comments)))
}
