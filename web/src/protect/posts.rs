use crate::protect::{authorize, Check, Predicate, Verdict};
use crate::{extractors::authenticated_user::AuthenticatedUser, AppState};
use async_trait::async_trait;
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::IntoResponse,
};
use domain::error::EntityErrorKind;
use domain::{post as PostApi, Id};
use log::*;

/// Only the author of the post named by the first argument may proceed.
pub struct UserIsPostAuthor;

#[async_trait]
impl Check for UserIsPostAuthor {
    async fn eval(
        &self,
        app_state: &AppState,
        authenticated_user: &domain::users::Model,
        args: Vec<Id>,
    ) -> Verdict {
        let Some(post_id) = args.first().copied() else {
            return Verdict::Deny;
        };

        match PostApi::find_by_id(app_state.db_conn_ref(), post_id).await {
            Ok(post) if post.author_id == authenticated_user.id => Verdict::Allow,
            Ok(_) => {
                info!(
                    "User {} tried to change post {post_id} they did not write",
                    authenticated_user.id
                );
                Verdict::Deny
            }
            Err(e) => {
                let e = domain::error::Error::from(e);
                if e.entity_kind() == Some(&EntityErrorKind::NotFound) {
                    Verdict::Missing
                } else {
                    error!("Authorization error finding post {post_id}: {e:?}");
                    Verdict::Deny
                }
            }
        }
    }
}

/// Checks that the post referenced by `id` exists and was written by the
/// authenticated user.
///  Intended to be given to axum::middleware::from_fn_with_state in the router
pub(crate) async fn update(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(post_id): Path<Id>,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    let checks = vec![Predicate::new(UserIsPostAuthor, vec![post_id])];
    authorize(&app_state, user, request, next, checks).await
}

/// Same rule as `update`: only the author may delete a post.
pub(crate) async fn delete(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(post_id): Path<Id>,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    let checks = vec![Predicate::new(UserIsPostAuthor, vec![post_id])];
    authorize(&app_state, user, request, next, checks).await
}
