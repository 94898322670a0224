use crate::controller::ApiResponse;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{post as PostApi, Id};

/// GET the posts written by a particular user, most recently edited first.
#[utoipa::path(
    get,
    path = "/users/{id}/posts",
    params(
        ("id" = Uuid, Path, description = "Author whose posts to list")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the user's posts", body = [domain::post::PostItem]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Path(user_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let posts = PostApi::find_by_author(app_state.db_conn_ref(), user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), posts)))
}
