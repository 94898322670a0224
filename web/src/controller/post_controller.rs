use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::post::IndexParams;
use crate::{AppState, Error};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::post::{self as PostApi, NewPost, PostChanges};
use domain::Id;
use log::*;

/// POST create a new Post
#[utoipa::path(
    post,
    path = "/posts",
    request_body = domain::post::NewPost,
    responses(
        (status = 201, description = "Successfully Created a New Post", body = domain::post::PostItem),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A post with the same title already exists"),
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
    Json(new_post): Json<NewPost>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New Post from: {new_post:?}");

    let post = PostApi::create(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        new_post,
        &user,
    )
    .await?;

    debug!("New Post: {}", post.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), post)),
    ))
}

/// GET all Posts, optionally filtered by category
#[utoipa::path(
    get,
    path = "/posts",
    params(IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved all Posts", body = [domain::post::PostItem]),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Posts, category: {:?}", params.category);

    let posts = PostApi::find_all(app_state.db_conn_ref(), params.category.as_deref()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), posts)))
}

/// GET a particular Post specified by its id or slug, with its comments.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(
        ("id" = String, Path, description = "Id or slug of the Post to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the Post", body = domain::post::PostDetail),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn read(
    State(app_state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Post by id or slug: {id_or_slug}");

    let post = PostApi::find_with_comments(app_state.db_conn_ref(), &id_or_slug).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), post)))
}

/// PUT update a Post. Only its author may do this.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(
        ("id" = Uuid, Path, description = "Id of the Post to update")
    ),
    request_body = domain::post::PostChanges,
    responses(
        (status = 200, description = "Successfully Updated the Post", body = domain::posts::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author of the Post"),
        (status = 404, description = "Post not found"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn update(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(changes): Json<PostChanges>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Update Post {id} with: {changes:?}");

    let post = PostApi::update(app_state.db_conn_ref(), id, changes).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), post)))
}

/// DELETE a Post along with its comments. Only its author may do this.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(
        ("id" = Uuid, Path, description = "Id of the Post to delete")
    ),
    responses(
        (status = 204, description = "Successfully Deleted the Post"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author of the Post"),
        (status = 404, description = "Post not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn delete(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE Post {id}");

    PostApi::delete(app_state.db_conn_ref(), id).await?;

    info!("Post {id} deleted");
    Ok(StatusCode::NO_CONTENT)
}
