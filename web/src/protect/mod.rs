//! Authorization rules that run after authentication and before a handler.
//!
//! Each submodule guards one resource and is meant to be given to
//! `axum::middleware::from_fn_with_state` in the router.

pub(crate) mod posts;

use crate::AppState;
use async_trait::async_trait;
use axum::{extract::Request, http::StatusCode, middleware::Next, response::IntoResponse};
use domain::Id;

/// A single authorization rule.
///
/// Implementors answer **"is the authenticated user allowed to proceed?"**
/// given the shared state, the authenticated user and any ids taken from the
/// request.
#[async_trait]
pub trait Check: Send + Sync {
    async fn eval(&self, app: &AppState, user: &domain::users::Model, args: Vec<Id>) -> Verdict;
}

/// Outcome of a [`Check`].
#[derive(Debug, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny,
    /// The resource the rule is about does not exist.
    Missing,
}

/// Pairs a [`Check`] implementation with the arguments it is evaluated with.
pub(crate) struct Predicate {
    predicate: Box<dyn Check>,
    args: Vec<Id>,
}

impl Predicate {
    pub(crate) fn new<C: Check + 'static>(predicate: C, args: Vec<Id>) -> Self {
        Self {
            predicate: Box::new(predicate),
            args,
        }
    }

    pub(crate) async fn check(&self, app_state: &AppState, user: &domain::users::Model) -> Verdict {
        self.predicate
            .eval(app_state, user, self.args.clone())
            .await
    }
}

/// Evaluates `checks` in order. The first rule that does not allow the request
/// aborts it with **403 FORBIDDEN** (or **404 NOT FOUND** when the resource is
/// missing); otherwise `next` runs.
pub(crate) async fn authorize(
    app_state: &AppState,
    authenticated_user: domain::users::Model,
    request: Request,
    next: Next,
    checks: Vec<Predicate>,
) -> impl IntoResponse {
    for check in checks {
        match check.check(app_state, &authenticated_user).await {
            Verdict::Allow => continue,
            Verdict::Deny => return (StatusCode::FORBIDDEN, "FORBIDDEN").into_response(),
            Verdict::Missing => return (StatusCode::NOT_FOUND, "NOT FOUND").into_response(),
        }
    }
    next.run(request).await
}
